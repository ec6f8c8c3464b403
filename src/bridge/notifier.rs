use parking_lot::Mutex;
use tracing::warn;

/// Notice shown when no wallet can be reached.
pub const INSTALL_WALLET_NOTICE: &str = "Please install a wallet extension";

/// Sink for user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Logs notices at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        warn!(notice = message, "User notice");
    }
}

/// Keeps every notice in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
