use std::time::{Duration, Instant};

/// Simple stopwatch helper for wall-clock measurements.
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn start_new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time a closure, returning its output alongside the elapsed time.
    pub fn measure<F, T>(f: F) -> (T, Duration)
    where
        F: FnOnce() -> T,
    {
        let watch = Self::start_new();
        let output = f();
        (output, watch.elapsed())
    }

    pub fn has_exceeded(&self, limit: Duration) -> bool {
        self.elapsed() >= limit
    }
}
