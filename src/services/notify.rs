//! Notification seam for the dialog/toast surface.
//!
//! The production surface is a third-party dialog library owned by the UI
//! shell; workflows here only talk to this trait so they stay runnable and
//! testable headless.

use log::{error, info};

/// Status, confirmation, and error surface shown to the user.
pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    /// Ask the user to confirm a destructive or irreversible step.
    fn confirm(&self, message: &str) -> bool;
}

/// Log-backed stand-in used headless and in tests.
pub struct LogNotifier {
    auto_confirm: bool,
}

impl LogNotifier {
    pub fn new(auto_confirm: bool) -> Self {
        Self { auto_confirm }
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Notifier for LogNotifier {
    fn info(&self, message: &str) {
        info!("[notify] {message}");
    }

    fn success(&self, message: &str) {
        info!("[notify] ok: {message}");
    }

    fn error(&self, message: &str) {
        error!("[notify] {message}");
    }

    fn confirm(&self, message: &str) -> bool {
        info!("[notify] confirm ({}): {message}", self.auto_confirm);
        self.auto_confirm
    }
}
