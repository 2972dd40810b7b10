use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::alarms::AlarmHost;
use crate::config::{DEFAULT_ALARM_PERIOD_MINUTES, HISTORY_ALARM};
use crate::error::Result;
use crate::state::{LocalState, SyncState};
use crate::storage::StateStore;
use crate::types::{HistoryItem, HistoryRetentionPeriod};

/// Entries younger than `window` at `now`. Order is preserved.
pub fn retain_recent(
    history: Vec<HistoryItem>,
    now: DateTime<Utc>,
    window: Duration,
) -> Vec<HistoryItem> {
    let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
    history
        .into_iter()
        .filter(|item| (now - item.date).num_milliseconds() < window_ms)
        .collect()
}

/// Drops history older than the configured retention window.
pub struct RetentionSweeper {
    sync: StateStore<SyncState>,
    local: StateStore<LocalState>,
    alarms: Arc<dyn AlarmHost>,
}

impl RetentionSweeper {
    pub fn new(
        sync: StateStore<SyncState>,
        local: StateStore<LocalState>,
        alarms: Arc<dyn AlarmHost>,
    ) -> Self {
        RetentionSweeper { sync, local, alarms }
    }

    /// (Re)register the sweep alarm at the cadence of `period`.
    pub fn schedule(&self, period: HistoryRetentionPeriod) {
        let config = period.config();
        self.alarms.create(HISTORY_ALARM, config.alarm_period());
        info!(
            retention = config.display_name,
            every_minutes = config.alarm_period_minutes,
            "history sweep scheduled"
        );
    }

    /// Schedule according to the stored retention setting. When the setting
    /// can't be read the sweep still runs at the default cadence and the
    /// error is returned.
    pub async fn schedule_from_settings(&self) -> Result<HistoryRetentionPeriod> {
        match self.sync.read(SyncState::HISTORY_RETENTION_PERIOD).await {
            Ok(period) => {
                self.schedule(period);
                Ok(period)
            }
            Err(e) => {
                warn!(error = %e, "retention period unreadable, using default sweep cadence");
                self.alarms.create(HISTORY_ALARM, Duration::from_secs(DEFAULT_ALARM_PERIOD_MINUTES * 60));
                Err(e.into())
            }
        }
    }

    pub fn cancel(&self) -> bool {
        self.alarms.clear(HISTORY_ALARM)
    }

    pub async fn sweep(&self) -> Result<usize> {
        self.sweep_at(Utc::now()).await
    }

    /// Purge entries that expired by `now`. Returns how many were removed.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let period = self.sync.read(SyncState::HISTORY_RETENTION_PERIOD).await?;
        let history = self.local.read(LocalState::HISTORY).await?;
        let before = history.len();

        let kept = retain_recent(history, now, period.config().window());
        let removed = before - kept.len();
        self.local.write(LocalState::HISTORY, kept).await?;

        if removed > 0 {
            info!(removed, retention = period.config().display_name, "purged expired history");
        }
        Ok(removed)
    }
}
