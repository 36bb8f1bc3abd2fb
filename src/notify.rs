//! Notification and clipboard sinks consumed by the comment loader.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{info, warn};

use crate::api::{ApiError, Source};

/// How long hard errors stay on screen.
pub const ERROR_DURATION: Duration = Duration::from_millis(10_000);

pub type Action = Arc<dyn Fn() + Send + Sync>;

pub struct Notification {
    pub message: String,
    pub duration: Option<Duration>,
    pub action: Option<Action>,
}

impl Notification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            duration: None,
            action: None,
        }
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// A backend failure with a "copy details" action.
    pub fn api_error(source: Source, err: &ApiError, clipboard: Arc<dyn ClipboardSink>) -> Self {
        let detail = err.detail();
        let message = format!("{source} API Error (Click to copy): {detail}");
        Self::new(message)
            .duration(ERROR_DURATION)
            .action(Arc::new(move || clipboard.write_text(&detail)))
    }

    pub fn fallback(to: Source) -> Self {
        Self::new(format!("Falling back to {to} API"))
    }

    pub fn fetching_replies() -> Self {
        Self::new("Getting comment replies, please wait")
    }

    /// Run the attached action, if any.
    pub fn trigger(&self) {
        if let Some(action) = &self.action {
            action();
        }
    }
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("message", &self.message)
            .field("duration", &self.duration)
            .field("action", &self.action.is_some())
            .finish()
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub trait ClipboardSink: Send + Sync {
    fn write_text(&self, text: &str);
}

/// Prints notifications to stderr, optionally running their actions.
pub struct StderrNotifier {
    run_actions: bool,
}

impl StderrNotifier {
    pub fn new(run_actions: bool) -> Self {
        Self { run_actions }
    }
}

impl Notifier for StderrNotifier {
    fn notify(&self, notification: Notification) {
        info!(message = %notification.message, "notification");
        eprintln!("{}", notification.message);
        if self.run_actions {
            notification.trigger();
        }
    }
}

/// The system clipboard. The handle is opened lazily on first write.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSink for SystemClipboard {
    fn write_text(&self, text: &str) {
        let Ok(mut guard) = self.handle.lock() else {
            warn!("clipboard lock poisoned");
            return;
        };
        if guard.is_none() {
            match arboard::Clipboard::new() {
                Ok(clipboard) => *guard = Some(clipboard),
                Err(e) => {
                    warn!("clipboard unavailable: {e}");
                    return;
                }
            }
        }
        if let Some(clipboard) = guard.as_mut()
            && let Err(e) = clipboard.set_text(text.to_string())
        {
            warn!("failed to copy to clipboard: {e}");
        }
    }
}
