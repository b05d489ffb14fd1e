//! Terminal renditions of the navigation and notification ports.

use std::sync::{Mutex, PoisonError};

use edupay_session::{NavigateOptions, Navigator, Notifier};
use tracing::debug;

/// Tracks the "current route" of the console and prints every move.
pub struct TerminalNavigator {
    current: Mutex<String>,
}

impl TerminalNavigator {
    pub fn new(initial: &str) -> Self {
        Self { current: Mutex::new(initial.to_string()) }
    }
}

impl Navigator for TerminalNavigator {
    fn current_path(&self) -> String {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn navigate(&self, path: &str, options: NavigateOptions) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(from = %current, to = path, replace = options.replace, "Navigate");
        *current = path.to_string();
        println!("-> {path}");
    }
}

pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn show_success(&self, title: &str, message: &str) {
        println!("[ok] {title}: {message}");
    }

    fn show_error(&self, title: &str, message: &str) {
        println!("[error] {title}: {message}");
    }
}
