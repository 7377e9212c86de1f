//! User-facing notices raised by the workflow.

use tracing::{info, warn};

/// Shown when an upload is submitted without a file.
pub const NO_FILE_SELECTED: &str = "Please upload an Excel or CSV file.";
/// Shown when choices are submitted before any upload in this session.
pub const NO_FILE_IN_SESSION: &str = "No file found in session.";
/// Acknowledges that the dataset landed in the session slot.
pub const FILE_STORED: &str = "File stored in session.";
/// Acknowledges a successful clipboard export.
pub const CODE_COPIED: &str = "Code copied to clipboard!";
/// Shown while a generate request is outstanding.
pub const GENERATING: &str = "Code is generating, please wait...";

/// Sink for user-facing messages.
pub trait Notifier: Send + Sync {
    /// Blocking notice; the flow that raised it has been aborted.
    fn alert(&self, message: &str);
    /// Transient acknowledgment.
    fn acknowledge(&self, message: &str);
}

/// Notifier that only writes to the diagnostic log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        warn!("alert: {message}");
    }

    fn acknowledge(&self, message: &str) {
        info!("{message}");
    }
}
