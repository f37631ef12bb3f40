use tracing::{error, info};

/// User-facing notifications raised by the feed (toasts in a UI, log lines
/// in the CLI).
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        info!(notification = "success", "{message}");
    }

    fn info(&self, message: &str) {
        info!(notification = "info", "{message}");
    }

    fn error(&self, message: &str) {
        error!(notification = "error", "{message}");
    }
}
