//! Helpers shared by the integration tests.

#![allow(dead_code)]

use hyperframe::components::FnComponent;
use hyperframe::prelude::*;
use hyperframe::scene::NodeHandle;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A shared, ordered record of hook invocations such as `"a:update"`.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// A component with all three hooks, each recording `"<label>:<hook>"`.
pub fn recorder(label: &str, log: &CallLog) -> FnComponent {
    let (start_log, update_log, dispose_log) = (log.clone(), log.clone(), log.clone());
    let (start_label, update_label, dispose_label) =
        (label.to_string(), label.to_string(), label.to_string());
    FnComponent::new()
        .on_start(move |_ctx| {
            start_log.push(format!("{start_label}:start"));
            Ok(())
        })
        .on_update(move |_ctx, _delta| {
            update_log.push(format!("{update_label}:update"));
            Ok(())
        })
        .on_dispose(move |_ctx| {
            dispose_log.push(format!("{dispose_label}:dispose"));
            Ok(())
        })
}

/// Like [`recorder`], but `start` hands back the given task.
pub fn async_recorder(label: &str, log: &CallLog, task: InitTask) -> FnComponent {
    let (start_log, update_log, dispose_log) = (log.clone(), log.clone(), log.clone());
    let (start_label, update_label, dispose_label) =
        (label.to_string(), label.to_string(), label.to_string());
    let mut task = Some(task);
    FnComponent::new()
        .on_start_async(move |_ctx| {
            start_log.push(format!("{start_label}:start"));
            task.take()
                .ok_or_else(|| anyhow::anyhow!("start called twice"))
        })
        .on_update(move |_ctx, _delta| {
            update_log.push(format!("{update_label}:update"));
            Ok(())
        })
        .on_dispose(move |_ctx| {
            dispose_log.push(format!("{dispose_label}:dispose"));
            Ok(())
        })
}

/// An error sink that keeps every report for inspection.
#[derive(Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<(ErrorKind, String, String)>>>);

impl RecordingSink {
    /// `(kind, component name, error message)` in report order.
    pub fn reports(&self) -> Vec<(ErrorKind, String, String)> {
        self.0.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.reports().into_iter().map(|(kind, _, _)| kind).collect()
    }
}

impl ErrorSink for RecordingSink {
    fn report(&self, report: ErrorReport) {
        self.0
            .lock()
            .unwrap()
            .push((report.kind, report.name, format!("{:#}", report.error)));
    }
}

/// A scheduler on a manual clock with a recording sink.
pub fn scheduler() -> (Scheduler, ManualClock, RecordingSink) {
    let clock = ManualClock::new();
    let sink = RecordingSink::default();
    let scheduler = Scheduler::new(SchedulerConfig::default())
        .with_clock(clock.clone())
        .with_error_sink(sink.clone());
    (scheduler, clock, sink)
}

/// Advances the clock by one 60 Hz frame and runs `update()`.
pub fn step(scheduler: &mut Scheduler, clock: &ManualClock) {
    clock.advance(Duration::from_micros(16_667));
    scheduler.update();
}

/// A `HeadlessScene` the test can still inspect after handing it over.
#[derive(Clone, Default)]
pub struct SharedScene(Arc<Mutex<HeadlessScene>>);

impl SharedScene {
    pub fn inspect<R>(&self, f: impl FnOnce(&HeadlessScene) -> R) -> R {
        f(&self.0.lock().unwrap())
    }
}

impl Scene for SharedScene {
    fn add_node(&mut self, label: &str) -> NodeHandle {
        self.0.lock().unwrap().add_node(label)
    }

    fn remove_node(&mut self, node: NodeHandle) -> bool {
        self.0.lock().unwrap().remove_node(node)
    }

    fn resize(&mut self, viewport: Viewport) {
        self.0.lock().unwrap().resize(viewport);
    }

    fn draw(&mut self, frame: &FrameInfo) {
        self.0.lock().unwrap().draw(frame);
    }
}
