//! Terminal notifier.

use cleanse_client::notice::Notifier;
use tracing::debug;

use crate::style;

/// Prints alerts and acknowledgments for the person at the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        debug!("alert raised: {message}");
        eprintln!("{}", style::warning(format!("! {message}")));
    }

    fn acknowledge(&self, message: &str) {
        println!("{}", style::success(message));
    }
}
