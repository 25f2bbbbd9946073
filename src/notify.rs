use tracing::{info, warn};

/// Fire-and-forget user notifications.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Prints notifications for the terminal user and mirrors them to the log.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        info!(notification = "success", "{message}");
        println!("{message}");
    }

    fn error(&self, message: &str) {
        warn!(notification = "error", "{message}");
        eprintln!("Error: {message}");
    }
}
