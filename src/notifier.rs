// src/notifier.rs

//! User-visible reporting of recoverable transform failures.

use std::fmt;

use tracing::error;

/// Sink for errors that must be visible but must not stop the build.
pub trait Notifier: Send + Sync + fmt::Debug {
    fn notify(&self, title: &str, message: &str);
}

/// Logs through `tracing` and prints a banner on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, message: &str) {
        error!(title, "{message}");
        let rule = "=".repeat(title.len().clamp(20, 72));
        eprintln!("\n{rule}\n{title}\n{rule}\n{message}\n");
    }
}
