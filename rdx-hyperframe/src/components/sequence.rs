//! Defines multi-step, stateful automations.

use crate::component::{Component, Update};
use crate::context::Context;
use crate::error::HookError;
use std::time::Duration;
use tracing::debug;

/// A function closure that represents one step in a sequence.
pub type SequenceStep = Box<dyn FnMut(&mut Context<'_>) -> Result<(), HookError> + Send>;

/// Boxes a closure as a [`SequenceStep`].
pub fn step<F>(f: F) -> SequenceStep
where
    F: FnMut(&mut Context<'_>) -> Result<(), HookError> + Send + 'static,
{
    Box::new(f)
}

/// Defines the repetition behavior of a `Sequence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepetitionPolicy {
    /// The sequence runs through its steps once and then completes.
    RunOnce,
    /// The sequence runs through its steps N times and then completes.
    RunNTimes(u32),
    /// The sequence repeats indefinitely.
    Repeat,
}

/// A stateful automation that executes a list of steps in order.
///
/// One step runs each time `step_every` of frame time has passed. When the
/// repetition policy is exhausted the sequence requests its own removal.
pub struct Sequence {
    steps: Vec<SequenceStep>,
    step_every: f64,
    accumulated: f64,
    current_step: usize,
    repetition_policy: RepetitionPolicy,
    run_count: u32,
    completed: bool,
}

impl Sequence {
    pub fn new(
        step_every: Duration,
        steps: Vec<SequenceStep>,
        repetition_policy: RepetitionPolicy,
    ) -> Self {
        Self {
            steps,
            step_every: step_every.as_secs_f64(),
            accumulated: 0.0,
            current_step: 0,
            repetition_policy,
            run_count: 0,
            completed: false,
        }
    }

    /// Completed passes through the step list.
    pub fn run_count(&self) -> u32 {
        self.run_count
    }

    /// Runs the current step and moves on.
    /// Returns `true` once the sequence is complete.
    fn advance(&mut self, ctx: &mut Context<'_>) -> Result<bool, HookError> {
        if self.steps.is_empty() {
            return Ok(true);
        }
        if let Some(step) = self.steps.get_mut(self.current_step) {
            step(ctx)?;
        }
        debug!(component = %ctx.name(), step = self.current_step, "sequence step ran");
        self.current_step += 1;

        if self.current_step >= self.steps.len() {
            self.run_count += 1;
            self.current_step = 0;

            return Ok(match self.repetition_policy {
                RepetitionPolicy::RunOnce => true,
                RepetitionPolicy::RunNTimes(n) => self.run_count >= n,
                RepetitionPolicy::Repeat => {
                    debug!(component = %ctx.name(), runs = self.run_count, "sequence looped");
                    false
                }
            });
        }
        Ok(false)
    }
}

impl Update for Sequence {
    fn update(&mut self, ctx: &mut Context<'_>, delta: f64) -> Result<(), HookError> {
        if self.completed {
            return Ok(());
        }
        self.accumulated += delta;
        if self.accumulated < self.step_every {
            return Ok(());
        }
        self.accumulated -= self.step_every;
        if self.advance(ctx)? {
            self.completed = true;
            debug!(component = %ctx.name(), "sequence completed");
            ctx.remove_self();
        }
        Ok(())
    }
}

impl Component for Sequence {
    fn as_update(&mut self) -> Option<&mut dyn Update> {
        Some(self)
    }
}
