use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Named recurring timers the host provides.
pub trait AlarmHost: Send + Sync + 'static {
    /// Schedule `name` every `period`, replacing any alarm with the same name.
    fn create(&self, name: &str, period: Duration);

    /// Cancel `name`. Returns whether it was scheduled.
    fn clear(&self, name: &str) -> bool;
}

/// Alarm host backed by tokio timers. Fires are delivered as alarm names on a channel.
pub struct TokioAlarms {
    handles: Mutex<HashMap<String, JoinHandle<()>>>,
    fired: mpsc::UnboundedSender<String>,
}

impl TokioAlarms {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (fired, rx) = mpsc::unbounded_channel();
        let alarms = TokioAlarms {
            handles: Mutex::new(HashMap::new()),
            fired,
        };
        (alarms, rx)
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        self.handles.lock().get(name).is_some_and(|h| !h.is_finished())
    }
}

impl AlarmHost for TokioAlarms {
    fn create(&self, name: &str, period: Duration) {
        let tx = self.fired.clone();
        let alarm = name.to_string();
        let handle = tokio::spawn(async move {
            // first fire is one period from now
            let mut tick = interval_at(Instant::now() + period, period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                if tx.send(alarm.clone()).is_err() {
                    break;
                }
            }
        });

        let previous = self.handles.lock().insert(name.to_string(), handle);
        if let Some(previous) = previous {
            previous.abort();
        }
        debug!(alarm = name, period_secs = period.as_secs(), "alarm scheduled");
    }

    fn clear(&self, name: &str) -> bool {
        match self.handles.lock().remove(name) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for TokioAlarms {
    fn drop(&mut self) {
        for (_, handle) in self.handles.lock().drain() {
            handle.abort();
        }
    }
}
