//! Completion notifier that logs instead of playing a sound.

use tracing::info;

use crate::core::CompletionNotifier;

/// [`CompletionNotifier`] that emits an `info` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

impl CompletionNotifier for LoggingNotifier {
    fn render_completed(&self) {
        info!("render complete");
    }
}
