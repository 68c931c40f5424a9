//! Wall-clock timing for runs and stages.

use std::time::{Duration, Instant};

/// Measures one run or stage and logs its duration when finished.
#[derive(Debug)]
pub struct SpanTimer {
    label: String,
    started: Instant,
}

impl SpanTimer {
    /// Starts timing `label`, e.g. `stage.dims`.
    #[must_use]
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started: Instant::now(),
        }
    }

    /// Returns the time elapsed so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Returns the elapsed time in fractional milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Stops the timer, logs the duration at debug level and returns it in
    /// milliseconds.
    pub fn finish(self) -> f64 {
        let duration_ms = self.elapsed_ms();
        tracing::debug!(span = %self.label, duration_ms, "timed");
        duration_ms
    }
}
