use std::panic::PanicHookInfo;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "shuffle_lib=info";

static PANIC_HOOK: Once = Once::new();

/// Install the fmt subscriber and route panics through `tracing`.
/// `RUST_LOG` overrides the default filter. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    // an embedding host may already own the global subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    PANIC_HOOK.call_once(|| {
        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let (location, message) = describe_panic(info);
            tracing::error!(
                %location,
                thread = std::thread::current().name().unwrap_or("unnamed"),
                "panic: {message}"
            );
            prev_hook(info);
        }));
    });
}

fn describe_panic(info: &PanicHookInfo<'_>) -> (String, String) {
    let location = info
        .location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
        .unwrap_or_else(|| "unknown".into());
    let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".into()
    };
    (location, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    // one test: the panic hook is process-global
    #[test]
    fn panic_hook_reports_location_and_message() {
        init();
        init();

        let seen: Arc<Mutex<Option<(String, String)>>> = Arc::default();
        let captured = seen.clone();
        let prev = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            *captured.lock().unwrap() = Some(describe_panic(info));
        }));

        let result = std::panic::catch_unwind(|| panic!("folder {} vanished", 7));
        std::panic::set_hook(prev);

        assert!(result.is_err());
        let (location, message) = seen.lock().unwrap().take().unwrap();
        assert!(location.contains("logging.rs"));
        assert_eq!(message, "folder 7 vanished");
    }
}
