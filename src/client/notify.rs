use parking_lot::Mutex;
use tracing::{error, info};

/// User-facing error channel. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify_error(&self, message: &str);
}

/// Screen routing. Logout uses it to send the user back to the login screen.
pub trait Navigator: Send + Sync {
    fn go_to(&self, route: &str);
}

/// Notifier that writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_error(&self, message: &str) {
        error!(target: "lostfound::notify", "{}", message);
    }
}

/// Notifier for interactive use: prints straight to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify_error(&self, message: &str) {
        eprintln!("error: {}", message);
    }
}

/// Navigator for headless front ends: logs the route and keeps it until taken, so the
/// caller can react (e.g. prompt for a fresh login) at a convenient point.
#[derive(Debug, Default)]
pub struct LogNavigator {
    pending: Mutex<Option<String>>,
}

impl LogNavigator {
    pub fn new() -> Self { Self::default() }

    pub fn take_pending(&self) -> Option<String> {
        self.pending.lock().take()
    }
}

impl Navigator for LogNavigator {
    fn go_to(&self, route: &str) {
        info!(target: "lostfound::navigate", "navigate to {}", route);
        *self.pending.lock() = Some(route.to_string());
    }
}
