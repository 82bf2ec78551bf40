use std::sync::Mutex;

use assetdag::notifier::Notifier;

/// Notifier that keeps every notification for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(title, message)` pairs in arrival order.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().unwrap().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}
