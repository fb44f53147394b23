//! Progress reporting for long-running commands

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{msg:>14} [{bar:40.cyan/blue}] {pos}/{len} blocks ({eta})";

/// Progress bar over strips or tiles of one directory
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(total: u64, description: &str) -> Self {
        let bar = ProgressBar::new(total);
        // A bad template only costs the styling
        if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(description.to_string());
        ProgressTracker { bar }
    }

    /// Tracker that draws nothing, for quiet runs and tests
    pub fn hidden() -> Self {
        ProgressTracker { bar: ProgressBar::hidden() }
    }

    pub fn increment(&self, amount: u64) {
        self.bar.inc(amount);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
