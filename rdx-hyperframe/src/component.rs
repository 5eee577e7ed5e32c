//! The contract between the scheduler and the components it drives.
//!
//! A component declares its capabilities explicitly: each of `start`,
//! `update` and `dispose` lives in its own trait, and [`Component`] exposes
//! the ones a type implements through `as_*` accessors. The scheduler only
//! dispatches to capabilities that are present.
//!
//! ```rust
//! use hyperframe::prelude::*;
//!
//! struct Spinner { angle: f64 }
//!
//! impl Update for Spinner {
//!     fn update(&mut self, _ctx: &mut Context<'_>, delta: f64) -> anyhow::Result<()> {
//!         self.angle += delta * 90.0;
//!         Ok(())
//!     }
//! }
//!
//! impl Component for Spinner {
//!     fn as_update(&mut self) -> Option<&mut dyn Update> {
//!         Some(self)
//!     }
//! }
//! ```

use crate::context::Context;
use crate::error::HookError;
use anyhow::anyhow;
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

/// A unit of behavior driven by the scheduler.
///
/// Every accessor defaults to `None`, so a component only overrides the
/// capabilities it actually has.
pub trait Component: Send + 'static {
    fn as_start(&mut self) -> Option<&mut dyn Start> {
        None
    }

    fn as_update(&mut self) -> Option<&mut dyn Update> {
        None
    }

    fn as_dispose(&mut self) -> Option<&mut dyn Dispose> {
        None
    }
}

/// Initialization capability.
pub trait Start {
    /// Called once, during the first add phase after registration.
    ///
    /// Returning `Started::Pending` keeps the component out of the update phase
    /// until the task settles.
    fn start(&mut self, ctx: &mut Context<'_>) -> Result<Started, HookError>;
}

/// Per-frame capability.
pub trait Update {
    /// Called once per frame while the component is active and enabled.
    /// `delta` is in seconds and never exceeds the configured clamp.
    fn update(&mut self, ctx: &mut Context<'_>, delta: f64) -> Result<(), HookError>;
}

/// Teardown capability.
pub trait Dispose {
    /// Called at most once, during the removal phase.
    fn dispose(&mut self, ctx: &mut Context<'_>) -> Result<(), HookError>;
}

/// The outcome of a successful `start` call.
#[derive(Debug)]
pub enum Started {
    /// The component is usable right away.
    Ready,
    /// Initialization continues out-of-band.
    Pending(InitTask),
}

/// Observable state of an [`InitTask`].
#[derive(Debug)]
pub enum InitStatus {
    Pending,
    Resolved,
    Failed(HookError),
}

/// An in-flight asynchronous initialization.
///
/// The scheduler never awaits the task. It polls it without blocking at the
/// start of every frame, so a completion is always observed at a frame
/// boundary, never in the middle of one.
#[derive(Debug)]
pub struct InitTask {
    rx: oneshot::Receiver<Result<(), HookError>>,
}

/// The sending half of [`InitTask::channel`].
#[derive(Debug)]
pub struct InitCompleter {
    tx: oneshot::Sender<Result<(), HookError>>,
}

impl InitCompleter {
    /// Settles the task. Completing a task nobody tracks any more is a no-op.
    pub fn complete(self, result: Result<(), HookError>) {
        self.tx.send(result).ok();
    }

    pub fn succeed(self) {
        self.complete(Ok(()));
    }

    pub fn fail(self, error: HookError) {
        self.complete(Err(error));
    }
}

impl InitTask {
    /// Creates a task that is settled by hand through the returned completer.
    /// Dropping the completer without settling counts as a failure.
    pub fn channel() -> (InitTask, InitCompleter) {
        let (tx, rx) = oneshot::channel();
        (InitTask { rx }, InitCompleter { tx })
    }

    /// Runs `future` on the current tokio runtime and settles with its result.
    ///
    /// Outside a runtime the task is created already failed, which the
    /// scheduler reports like any other async start failure.
    pub fn spawn<F>(future: F) -> InitTask
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let (task, completer) = InitTask::channel();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    completer.complete(future.await);
                });
            }
            Err(e) => completer.fail(anyhow!("no tokio runtime to run initialization: {e}")),
        }
        task
    }

    /// A task that has already succeeded. It is still observed on the next frame.
    pub fn resolved() -> InitTask {
        let (task, completer) = InitTask::channel();
        completer.succeed();
        task
    }

    /// A task that has already failed.
    pub fn failed(error: HookError) -> InitTask {
        let (task, completer) = InitTask::channel();
        completer.fail(error);
        task
    }

    /// Checks the task without blocking.
    pub fn poll_status(&mut self) -> InitStatus {
        match self.rx.try_recv() {
            Ok(Ok(())) => InitStatus::Resolved,
            Ok(Err(error)) => InitStatus::Failed(error),
            Err(TryRecvError::Empty) => InitStatus::Pending,
            Err(TryRecvError::Closed) => InitStatus::Failed(anyhow!(
                "initialization was abandoned before it completed"
            )),
        }
    }
}

/// Runs a hook, turning a panic into an ordinary hook error.
pub(crate) fn contain<T>(hook: impl FnOnce() -> Result<T, HookError>) -> Result<T, HookError> {
    match panic::catch_unwind(AssertUnwindSafe(hook)) {
        Ok(result) => result,
        Err(payload) => Err(anyhow!("hook panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_task_reports_each_state() {
        let (mut task, completer) = InitTask::channel();
        assert!(matches!(task.poll_status(), InitStatus::Pending));
        completer.succeed();
        assert!(matches!(task.poll_status(), InitStatus::Resolved));

        let (mut task, completer) = InitTask::channel();
        completer.fail(anyhow!("texture missing"));
        match task.poll_status() {
            InitStatus::Failed(e) => assert_eq!(e.to_string(), "texture missing"),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn dropped_completer_is_a_failure() {
        let (mut task, completer) = InitTask::channel();
        drop(completer);
        assert!(matches!(task.poll_status(), InitStatus::Failed(_)));
    }

    #[test]
    fn spawn_outside_runtime_fails_the_task() {
        let mut task = InitTask::spawn(async { anyhow::Ok(()) });
        assert!(matches!(task.poll_status(), InitStatus::Failed(_)));
    }

    #[tokio::test]
    async fn spawned_task_settles_with_future_result() {
        let mut task = InitTask::spawn(async {
            tokio::task::yield_now().await;
            anyhow::Ok(())
        });
        loop {
            match task.poll_status() {
                InitStatus::Pending => tokio::task::yield_now().await,
                InitStatus::Resolved => break,
                InitStatus::Failed(e) => panic!("unexpected failure: {e}"),
            }
        }
    }

    #[test]
    fn contain_converts_panics() {
        let result: Result<(), HookError> = contain(|| panic!("boom"));
        let message = result.unwrap_err().to_string();
        assert!(message.contains("boom"), "{message}");
    }
}
