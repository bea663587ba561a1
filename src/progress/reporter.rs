//! Progress reporter implementation
//!
//! Uses indicatif for a byte counter with throughput on stderr. The total
//! size of a transfer is not known up front, so a spinner is used instead
//! of a bar.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Progress reporter for copy operations
pub struct ProgressReporter {
    /// Byte counter
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a progress reporter drawing on stderr
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} {bytes} ({bytes_per_sec}, {elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Increment bytes copied
    pub fn increment_bytes(&self, bytes: u64) {
        self.bar.inc(bytes);
    }

    /// Show the path currently being copied
    pub fn set_current(&self, path: &str) {
        self.bar.set_message(path.to_string());
    }

    /// Clear the counter from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_bytes() {
        let reporter = ProgressReporter {
            bar: ProgressBar::hidden(),
        };

        reporter.increment_bytes(1024);
        reporter.increment_bytes(1024);
        reporter.set_current("dir/file");

        assert_eq!(reporter.bar.position(), 2048);
        assert_eq!(reporter.bar.message(), "dir/file");
        reporter.finish();
    }
}
