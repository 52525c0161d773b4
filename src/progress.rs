//! Progress reporting for record set conversion
//!
//! Tracks rows completed out of rows total for the record set currently being
//! converted, drawing a progress bar when enabled. Progress has no effect on
//! the conversion itself.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Progress reporter for one record set at a time
pub struct ProgressReporter {
    enabled: bool,
    progress_bar: Option<ProgressBar>,
    source_name: String,
    total_rows: usize,
    completed_rows: AtomicUsize,
}

impl ProgressReporter {
    /// Create a progress reporter; bars are only drawn when `enabled`
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            progress_bar: None,
            source_name: String::new(),
            total_rows: 0,
            completed_rows: AtomicUsize::new(0),
        }
    }

    /// Start tracking a record set
    pub fn start(&mut self, source_name: &str, total_rows: usize) {
        self.source_name = source_name.to_string();
        self.total_rows = total_rows;
        self.completed_rows.store(0, Ordering::SeqCst);

        self.progress_bar = if self.enabled {
            let pb = ProgressBar::new(total_rows as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%) | {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▉▊▋▌▍▎▏  "),
            );
            pb.set_message(format!("Processing {}", source_name));
            Some(pb)
        } else {
            None
        };

        debug!("Progress started for {} ({} rows)", source_name, total_rows);
    }

    /// Record one more completed row
    pub fn increment(&self) {
        let completed = self.completed_rows.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
        debug!(
            "{}: {}/{} rows ({:.3})",
            self.source_name,
            completed,
            self.total_rows,
            self.fraction()
        );
    }

    /// Rows completed divided by rows total for the current record set
    pub fn fraction(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            self.completed_rows.load(Ordering::SeqCst) as f64 / self.total_rows as f64
        }
    }

    pub fn completed_rows(&self) -> usize {
        self.completed_rows.load(Ordering::SeqCst)
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Finish the current record set with a completion message
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(format!("Converted {}", self.source_name));
        }
    }

    /// Finish the current record set with an error message
    pub fn finish_with_error(&self, error_message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.abandon_with_message(format!("Failed: {}", error_message));
        }
        debug!(
            "Progress for {} finished with error: {}",
            self.source_name, error_message
        );
    }

    /// Check if progress bars are drawn
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            if !pb.is_finished() {
                pb.finish_and_clear();
            }
        }
    }
}
