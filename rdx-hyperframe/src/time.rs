//! Frame timing: the clock the scheduler samples once per update phase.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// A source of per-frame deltas.
///
/// Implementations must be monotonic: a sample is the time passed since the
/// previous sample (or since creation, for the first one).
pub trait Clock: Send {
    fn sample_delta(&mut self) -> Duration;

    /// Total time since the clock was created.
    fn elapsed(&self) -> Duration;
}

/// Wall-clock time, measured with tokio's `Instant`.
///
/// Using tokio's clock means a paused test runtime (`start_paused = true`)
/// controls this clock as well.
#[derive(Debug)]
pub struct SystemClock {
    created: Instant,
    last_sample: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            created: now,
            last_sample: now,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn sample_delta(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now.saturating_duration_since(self.last_sample);
        self.last_sample = now;
        delta
    }

    fn elapsed(&self) -> Duration {
        self.created.elapsed()
    }
}

#[derive(Debug, Default)]
struct ManualState {
    pending: Duration,
    total: Duration,
}

/// A clock that only moves when told to.
///
/// Clones share the same state, so a test can keep one handle and give the
/// other to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward. The next `sample_delta` returns everything
    /// advanced since the previous sample.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.pending += by;
        state.total += by;
    }

    /// Convenience for `advance(Duration::from_secs_f64(secs))`.
    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl Clock for ManualClock {
    fn sample_delta(&mut self) -> Duration {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut state.pending)
    }

    fn elapsed(&self) -> Duration {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).total
    }
}
