//! Periodic work driven by frame deltas.

use crate::component::{Component, Update};
use crate::context::Context;
use crate::error::HookError;
use std::time::Duration;

/// A closure that runs each time an [`Interval`] elapses.
pub type IntervalTask = Box<dyn FnMut(&mut Context<'_>) -> Result<(), HookError> + Send>;

/// Runs a task every `period` of accumulated frame time.
///
/// Time is measured in clamped frame deltas rather than wall-clock time, so a
/// paused or disabled interval does not fire a burst when it resumes. It fires
/// at most once per frame.
pub struct Interval {
    period: f64,
    accumulated: f64,
    fired: u64,
    task: IntervalTask,
}

impl Interval {
    pub fn new<F>(period: Duration, task: F) -> Self
    where
        F: FnMut(&mut Context<'_>) -> Result<(), HookError> + Send + 'static,
    {
        Self {
            period: period.as_secs_f64(),
            accumulated: 0.0,
            fired: 0,
            task: Box::new(task),
        }
    }

    /// Number of times the task has run.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Adds `delta` and reports whether the period elapsed.
    fn advance(&mut self, delta: f64) -> bool {
        self.accumulated += delta;
        if self.accumulated >= self.period {
            self.accumulated = (self.accumulated - self.period).min(self.period);
            true
        } else {
            false
        }
    }
}

impl Update for Interval {
    fn update(&mut self, ctx: &mut Context<'_>, delta: f64) -> Result<(), HookError> {
        if self.advance(delta) {
            self.fired += 1;
            (self.task)(ctx)?;
        }
        Ok(())
    }
}

impl Component for Interval {
    fn as_update(&mut self) -> Option<&mut dyn Update> {
        Some(self)
    }
}
