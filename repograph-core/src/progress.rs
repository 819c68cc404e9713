//! Progress reporting for ingestion phases.
//!
//! The CLI uses `IndicatifReporter` for user-visible progress bars.
//! Library callers can use `NoopReporter` or provide their own
//! implementation; the engine reports one task per entity/relationship
//! kind and advances once per submitted batch.

use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

/// Trait for reporting progress of ingestion phases.
pub trait ProgressReporter: Send + Sync {
    /// Begin a new task with an optional total record count.
    fn start(&self, task: &str, total: Option<u64>);

    /// Advance progress by the given number of records.
    fn advance(&self, amount: u64);

    /// Mark the current task as finished.
    fn finish(&self);

    /// Display an informational message.
    fn message(&self, msg: &str);
}

/// No-op reporter for library callers that don't need progress output.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start(&self, _task: &str, _total: Option<u64>) {}
    fn advance(&self, _amount: u64) {}
    fn finish(&self) {}
    fn message(&self, _msg: &str) {}
}

/// Reporter backed by `indicatif` progress bars for CLI use.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
    completed: AtomicU64,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            completed: AtomicU64::new(0),
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, task: &str, total: Option<u64>) {
        self.completed.store(0, Ordering::Relaxed);
        if let Some(total) = total {
            self.bar.set_length(total);
            self.bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len} records ({eta})",
                )
                .unwrap()
                .progress_chars("=> "),
            );
        } else {
            self.bar.set_length(0);
            self.bar.set_style(
                ProgressStyle::with_template("{spinner:.green} {msg} {pos} records").unwrap(),
            );
        }
        self.bar.set_message(task.to_string());
        self.bar.reset();
    }

    fn advance(&self, amount: u64) {
        self.completed.fetch_add(amount, Ordering::Relaxed);
        self.bar.inc(amount);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn message(&self, msg: &str) {
        self.bar.println(msg);
    }
}
