//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [fetch-started] category=power
//! [fetch-failed] category=thermal reason="transport error: refused" failures=2
//! [unavailable] category=thermal reason="degraded" failures=3
//! [burst-activated] action=power_on window=60000ms n=1
//! [action] action=power_on
//! [stopped]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Simple stdout logging subscriber.
///
/// Prints human-readable event descriptions for debugging and demonstration
/// purposes. Not intended for production use — implement a custom
/// [`Subscribe`] for structured logging or metrics collection.
pub struct LogWriter;

/// Renders one event as a single log line.
fn render(e: &Event) -> String {
    let category = e.category.map_or("?", |c| c.as_str());
    let action = e.action.unwrap_or("?");
    let reason = e.reason.as_deref().unwrap_or("");
    let failures = e.failures.unwrap_or(0);
    let timeout_ms = e.timeout_ms.unwrap_or(0);
    let duration_ms = e.duration_ms.unwrap_or(0);
    let count = e.count.unwrap_or(0);

    match e.kind {
        EventKind::FetchStarted => {
            format!("[fetch-started] category={category}")
        }
        EventKind::FetchSucceeded => {
            format!("[fetch-ok] category={category} took={duration_ms}ms")
        }
        EventKind::FetchFailed => {
            format!("[fetch-failed] category={category} reason=\"{reason}\" failures={failures}")
        }
        EventKind::FetchTimedOut => {
            format!("[fetch-timeout] category={category} timeout={timeout_ms}ms")
        }
        EventKind::CategoryUnavailable => {
            format!("[unavailable] category={category} reason=\"{reason}\" failures={failures}")
        }
        EventKind::CategoryRetired => {
            format!("[retired] category={category} reason=\"{reason}\"")
        }
        EventKind::CategoryRecovered => {
            format!("[recovered] category={category}")
        }
        EventKind::ActionDispatched => {
            format!("[action] action={action}")
        }
        EventKind::ActionFailed => {
            format!("[action-failed] action={action} reason=\"{reason}\"")
        }
        EventKind::BurstActivated => {
            format!("[burst-activated] action={action} window={duration_ms}ms n={count}")
        }
        EventKind::BurstExpired => "[burst-expired]".to_string(),
        EventKind::RefreshForced => {
            format!("[refresh-forced] category={category}")
        }
        EventKind::ShutdownRequested => "[shutdown-requested]".to_string(),
        EventKind::Stopped => "[stopped]".to_string(),
        EventKind::SubscriberOverflow => {
            format!("[subscriber-overflow] reason=\"{reason}\"")
        }
        EventKind::SubscriberPanicked => {
            format!("[subscriber-panicked] reason=\"{reason}\"")
        }
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        println!("{}", render(e));
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
