//! Terminal progress bars for downloads and uploads

use bridge_traits::media::TransferProgress;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;

const TEMPLATE: &str =
    "{msg:30!} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

/// One bar per transfer; a new `start` replaces the previous bar
pub struct TerminalProgress {
    current: Mutex<Option<ProgressBar>>,
    hidden: bool,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            hidden: false,
        }
    }

    /// Track positions without drawing anything
    pub fn hidden() -> Self {
        Self {
            current: Mutex::new(None),
            hidden: true,
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(current) = self.current.lock() {
            if let Some(bar) = current.as_ref() {
                f(bar);
            }
        }
    }

    #[cfg(test)]
    fn position(&self) -> Option<u64> {
        self.current
            .lock()
            .ok()
            .and_then(|current| current.as_ref().map(ProgressBar::position))
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferProgress for TerminalProgress {
    fn start(&self, label: &str, total: u64) {
        let bar = ProgressBar::new(total);
        if self.hidden {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar.set_message(label.to_string());

        if let Ok(mut current) = self.current.lock() {
            if let Some(previous) = current.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn advance(&self, transferred: u64) {
        self.with_bar(|bar| {
            if bar.length().is_some_and(|len| transferred > len) {
                bar.set_length(transferred);
            }
            bar.set_position(transferred);
        });
    }

    fn finish(&self) {
        self.with_bar(ProgressBar::finish);
    }
}
