//! Progress tracking for the two traversal phases.
//!
//! The total is not known up front - work is added as the tree is
//! discovered and completed as branches finish. The underlying bar is
//! reference-counted and thread-safe, so concurrent branches report
//! without extra coordination. Purely observational; never gates
//! correctness.

use indicatif::{ProgressBar, ProgressStyle};

#[derive(Clone)]
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    /// Visible tracker with the standard bar style.
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(1);
        bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Tracker that renders nothing, for tests and non-TTY runs.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Record newly discovered work.
    pub fn add(&self, n: u64) {
        self.bar.inc_length(n);
    }

    /// Mark one unit of work complete.
    pub fn tick(&self) {
        self.bar.inc(1);
    }

    /// Force completion and clear the bar, even when the initial unit
    /// was never ticked.
    pub fn finish(&self) {
        if let Some(len) = self.bar.length() {
            self.bar.set_position(len);
        }
        self.bar.finish_and_clear();
    }
}
