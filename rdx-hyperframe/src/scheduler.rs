//! The lifecycle scheduler that drives every registered component.

use crate::common::{ComponentId, FrameInfo};
use crate::component::{contain, Component, InitStatus, Started};
use crate::config::SchedulerConfig;
use crate::context::{self, Context};
use crate::error::{ErrorKind, HookError, RegistrationError};
use crate::events::{LifecycleEvent, SystemEvent};
use crate::registry::{EntrySummary, LifecycleState, Registry};
use crate::scene::{HeadlessScene, Scene, Viewport};
use crate::sink::{ErrorReport, ErrorSink, TracingSink};
use crate::time::{Clock, SystemClock};
use anyhow::anyhow;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

/// The lifecycle scheduler.
///
/// One call to [`Scheduler::update`] is one frame: the add phase starts new
/// components and settles finished asynchronous starts, the removal phase
/// disposes everything that was asked to leave, and the update phase hands
/// the clamped frame delta to every active, enabled component.
///
/// The scheduler is single-threaded. It is driven through `&mut self` by a
/// host loop, either the caller's own or [`Scheduler::run`].
pub struct Scheduler {
    config: Arc<SchedulerConfig>,
    registry: Registry,
    clock: Box<dyn Clock>,
    sink: Box<dyn ErrorSink>,
    scene: Box<dyn Scene>,
    frame: FrameInfo,
    pending_viewport: Option<Viewport>,
    lifecycle_event_sender: broadcast::Sender<LifecycleEvent>,
    system_event_sender: broadcast::Sender<SystemEvent>,
}

// Core implementation block for the frame algorithm.
impl Scheduler {
    /// Creates a scheduler with a `SystemClock`, a `TracingSink` and a
    /// `HeadlessScene`.
    ///
    /// Settings that would break the frame algorithm are replaced by their
    /// defaults, see [`SchedulerConfig::sanitized`].
    pub fn new(config: SchedulerConfig) -> Self {
        let config = config.sanitized();
        let (lifecycle_event_sender, _) = broadcast::channel(config.event_capacity);
        let (system_event_sender, _) = broadcast::channel(64);

        Self {
            config: Arc::new(config),
            registry: Registry::new(),
            clock: Box::new(SystemClock::new()),
            sink: Box::new(TracingSink),
            scene: Box::new(HeadlessScene::new()),
            frame: FrameInfo::default(),
            pending_viewport: None,
            lifecycle_event_sender,
            system_event_sender,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_error_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_scene(mut self, scene: impl Scene + 'static) -> Self {
        self.scene = Box::new(scene);
        self
    }

    /// Advances one frame.
    ///
    /// Hook failures never escape: they are reported to the error sink and
    /// only degrade the component that failed.
    pub fn update(&mut self) {
        trace!("Frame #{} begins.", self.frame.frame);
        self.add_phase();
        self.removal_phase();
        self.update_phase();
        self.frame.frame += 1;
    }

    /// Applies a pending resize and draws the scene.
    pub fn render(&mut self) {
        if let Some(viewport) = self.pending_viewport.take() {
            self.scene.resize(viewport);
        }
        self.scene.draw(&self.frame);
    }

    /// One full host frame: `update()` followed by `render()`.
    pub fn frame(&mut self) {
        self.update();
        self.render();
    }

    /// Tears everything down immediately.
    ///
    /// Every tracked component is asked to leave and the removal phase runs
    /// right away, without waiting for a frame. Components still initializing
    /// are abandoned without dispose, the same as a failed start.
    pub fn clear(&mut self) {
        let tracked = self.registry.len();
        for id in self.registry.ids() {
            match self.registry.state(id) {
                Some(LifecycleState::Initializing) => {
                    debug!(?id, "abandoning in-flight initialization");
                    self.drop_without_dispose(id);
                }
                Some(_) => {
                    context::request_removal(&mut self.registry, &self.lifecycle_event_sender, id);
                }
                None => {}
            }
        }
        self.removal_phase();

        // Anything a dispose hook registered during teardown is forgotten too.
        if !self.registry.is_empty() {
            warn!(
                remaining = self.registry.len(),
                "components registered during clear were discarded"
            );
            self.registry.reset();
        }
        self.system_event_sender
            .send(SystemEvent::Cleared { removed: tracked })
            .ok();
        info!("Scheduler cleared {} component(s).", tracked);
    }

    #[doc(hidden)]
    fn add_phase(&mut self) {
        self.settle_initializing();
        for id in self.registry.in_state(LifecycleState::PendingStart) {
            // An earlier start hook in this phase may have requested removal.
            if self.registry.state(id) == Some(LifecycleState::PendingStart) {
                self.start_component(id);
            }
        }
    }

    #[doc(hidden)]
    fn start_component(&mut self, id: ComponentId) {
        let Some(mut component) = self.registry.take_component(id) else {
            return;
        };
        let outcome = match component.as_start() {
            Some(start) => {
                let mut ctx = Context::new(
                    id,
                    &mut self.registry,
                    &mut *self.scene,
                    &self.lifecycle_event_sender,
                    self.frame,
                );
                contain(|| start.start(&mut ctx))
            }
            None => Ok(Started::Ready),
        };
        self.registry.restore_component(id, component);

        let removal_requested = self.registry.state(id) == Some(LifecycleState::PendingRemoval);
        match outcome {
            Err(error) => {
                self.report(ErrorKind::StartError, id, error);
                self.drop_without_dispose(id);
            }
            Ok(Started::Ready) if removal_requested => {
                debug!(?id, "component started and asked to leave in the same hook");
            }
            Ok(Started::Pending(_)) if removal_requested => {
                debug!(?id, "initialization discarded by a removal request");
            }
            Ok(Started::Ready) => self.activate(id),
            Ok(Started::Pending(task)) => {
                self.registry.transition(id, LifecycleState::Initializing);
                if let Some(entry) = self.registry.entry_mut(id) {
                    entry.init = Some(task);
                    entry.init_frame = self.frame.frame;
                }
                self.lifecycle_event_sender
                    .send(LifecycleEvent::Initializing { id })
                    .ok();
            }
        }
    }

    #[doc(hidden)]
    fn settle_initializing(&mut self) {
        for id in self.registry.in_state(LifecycleState::Initializing) {
            let status = match self.registry.entry_mut(id).and_then(|e| e.init.as_mut()) {
                Some(task) => task.poll_status(),
                None => InitStatus::Failed(anyhow!("initializing component has no task")),
            };
            match status {
                InitStatus::Pending => self.flag_stalled(id),
                InitStatus::Resolved => {
                    let deferred = match self.registry.entry_mut(id) {
                        Some(entry) => {
                            entry.init = None;
                            entry.removal_deferred
                        }
                        None => continue,
                    };
                    if deferred {
                        debug!(?id, "initialization settled, applying deferred removal");
                        self.registry.transition(id, LifecycleState::PendingRemoval);
                    } else {
                        self.activate(id);
                    }
                }
                InitStatus::Failed(error) => {
                    self.report(ErrorKind::AsyncStartError, id, error);
                    self.drop_without_dispose(id);
                }
            }
        }
    }

    #[doc(hidden)]
    fn flag_stalled(&mut self, id: ComponentId) {
        let threshold = self.config.stalled_init_frames;
        let frame = self.frame.frame;
        if let Some(entry) = self.registry.entry_mut(id) {
            let waited = frame.saturating_sub(entry.init_frame);
            if !entry.init_flagged && waited >= threshold {
                entry.init_flagged = true;
                warn!(
                    component = %entry.name,
                    ?id,
                    frames = waited,
                    "initialization has not settled; the component stays inert until it does"
                );
            }
        }
    }

    #[doc(hidden)]
    fn activate(&mut self, id: ComponentId) {
        self.registry.transition(id, LifecycleState::Active);
        self.lifecycle_event_sender
            .send(LifecycleEvent::Activated { id })
            .ok();
    }

    /// Drains every pending removal, including the ones cascades add on the way.
    ///
    /// Each round disposes a snapshot of the pending entries; removals requested
    /// by those disposals are picked up by the next round.
    #[doc(hidden)]
    fn removal_phase(&mut self) -> usize {
        let mut disposed = 0;
        loop {
            let batch = self.registry.in_state(LifecycleState::PendingRemoval);
            if batch.is_empty() {
                break;
            }
            for id in batch {
                if self.registry.state(id) == Some(LifecycleState::PendingRemoval) {
                    self.dispose_component(id);
                    disposed += 1;
                }
            }
        }
        disposed
    }

    #[doc(hidden)]
    fn dispose_component(&mut self, id: ComponentId) {
        if let Some(mut component) = self.registry.take_component(id) {
            let result = match component.as_dispose() {
                Some(dispose) => {
                    let mut ctx = Context::new(
                        id,
                        &mut self.registry,
                        &mut *self.scene,
                        &self.lifecycle_event_sender,
                        self.frame,
                    );
                    contain(|| dispose.dispose(&mut ctx))
                }
                None => Ok(()),
            };
            self.registry.restore_component(id, component);
            if let Err(error) = result {
                self.report(ErrorKind::DisposeError, id, error);
            }
        }
        self.cascade(id);
        drop(self.registry.drop_entry(id));
        self.lifecycle_event_sender
            .send(LifecycleEvent::Disposed { id })
            .ok();
    }

    #[doc(hidden)]
    fn update_phase(&mut self) {
        let raw = self.clock.sample_delta().as_secs_f64();
        let delta = raw.min(self.config.max_delta_secs).max(0.0);
        if raw > delta {
            trace!(raw, clamped = delta, "frame delta clamped");
        }
        self.frame.delta = delta;
        self.frame.elapsed += delta;

        for id in self.registry.active_enabled() {
            // An earlier hook in this phase may have disabled or removed it.
            if !self.registry.is_updatable(id) {
                continue;
            }
            let Some(mut component) = self.registry.take_component(id) else {
                continue;
            };
            let result = match component.as_update() {
                Some(update) => {
                    let mut ctx = Context::new(
                        id,
                        &mut self.registry,
                        &mut *self.scene,
                        &self.lifecycle_event_sender,
                        self.frame,
                    );
                    contain(|| update.update(&mut ctx, delta))
                }
                None => Ok(()),
            };
            self.registry.restore_component(id, component);
            if let Err(error) = result {
                self.report(ErrorKind::UpdateError, id, error);
                context::set_enabled(&mut self.registry, &self.lifecycle_event_sender, id, false);
            }
        }
    }

    /// Removes a component that never became usable. No dispose is called.
    #[doc(hidden)]
    fn drop_without_dispose(&mut self, id: ComponentId) {
        self.cascade(id);
        drop(self.registry.drop_entry(id));
        self.lifecycle_event_sender
            .send(LifecycleEvent::Dropped { id })
            .ok();
    }

    #[doc(hidden)]
    fn cascade(&mut self, id: ComponentId) {
        for child in self.registry.children(id).to_vec() {
            // A child still loading would outlive its parent waiting on its task.
            if self.registry.state(child) == Some(LifecycleState::Initializing) {
                debug!(?child, "abandoning initializing child of a removed parent");
                self.drop_without_dispose(child);
            } else {
                context::request_removal(&mut self.registry, &self.lifecycle_event_sender, child);
            }
        }
    }

    #[doc(hidden)]
    fn report(&self, kind: ErrorKind, id: ComponentId, error: HookError) {
        let name = self
            .registry
            .name(id)
            .unwrap_or("<unregistered>")
            .to_string();
        self.lifecycle_event_sender
            .send(LifecycleEvent::Faulted { id, kind })
            .ok();
        self.sink.report(ErrorReport {
            kind,
            id,
            name,
            error,
        });
    }
}

// Public API implementation block.
impl Scheduler {
    /// Registers a component under a unique name.
    ///
    /// The component starts on the next add phase.
    ///
    /// # Errors
    /// `DuplicateRegistration` if a live component already holds `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        component: impl Component,
    ) -> Result<ComponentId, RegistrationError> {
        context::register(
            &mut self.registry,
            &self.lifecycle_event_sender,
            name,
            Box::new(component),
            None,
        )
    }

    /// Registers a component owned by `parent`. It is removed with its parent.
    pub fn register_child(
        &mut self,
        parent: ComponentId,
        name: impl Into<String>,
        component: impl Component,
    ) -> Result<ComponentId, RegistrationError> {
        context::register(
            &mut self.registry,
            &self.lifecycle_event_sender,
            name,
            Box::new(component),
            Some(parent),
        )
    }

    /// Asks for a component to be disposed on the next removal phase.
    ///
    /// Unknown handles and repeated requests are ignored.
    pub fn request_removal(&mut self, id: ComponentId) {
        context::request_removal(&mut self.registry, &self.lifecycle_event_sender, id);
    }

    /// Returns `false` if the handle is dead.
    pub fn set_enabled(&mut self, id: ComponentId, enabled: bool) -> bool {
        context::set_enabled(&mut self.registry, &self.lifecycle_event_sender, id, enabled)
    }

    pub fn is_enabled(&self, id: ComponentId) -> Option<bool> {
        self.registry.is_enabled(id)
    }

    pub fn state(&self, id: ComponentId) -> Option<LifecycleState> {
        self.registry.state(id)
    }

    pub fn lookup(&self, name: &str) -> Option<ComponentId> {
        self.registry.lookup(name)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn snapshot(&self) -> Vec<EntrySummary> {
        self.registry.snapshot()
    }

    /// Schedules a viewport change, applied before the next draw.
    pub fn resize(&mut self, viewport: Viewport) {
        self.pending_viewport = Some(viewport);
    }

    pub fn frame_info(&self) -> FrameInfo {
        self.frame
    }

    /// Number of completed `update()` calls.
    pub fn frame_count(&self) -> u64 {
        self.frame.frame
    }

    /// Total clamped frame time handed to components, in seconds.
    pub fn elapsed(&self) -> f64 {
        self.frame.elapsed
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Subscribes to the `LifecycleEvent` stream.
    pub fn subscribe_lifecycle_events(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.lifecycle_event_sender.subscribe()
    }

    /// Subscribes to the `SystemEvent` stream.
    pub fn subscribe_system_events(&self) -> broadcast::Receiver<SystemEvent> {
        self.system_event_sender.subscribe()
    }

    /// Runs the frame loop until Ctrl+C, then clears the scheduler.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        info!("Scheduler starting up...");
        self.run_until(tokio::signal::ctrl_c()).await?;
        info!("Scheduler has shut down.");
        Ok(())
    }

    /// Paces `frame()` at the configured frame rate until `shutdown`
    /// completes, then clears the scheduler and returns the shutdown output.
    ///
    /// Ticks missed because a frame ran long are skipped rather than bunched;
    /// the delta clamp absorbs the gap.
    pub async fn run_until<F: Future>(&mut self, shutdown: F) -> F::Output {
        let mut ticker = tokio::time::interval(self.config.frame_rate.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let first_frame = self.frame.frame;
        self.system_event_sender
            .send(SystemEvent::FrameLoopStarted {
                timestamp: tokio::time::Instant::now(),
            })
            .ok();
        info!("Frame loop running at {:?}.", self.config.frame_rate);

        let output = loop {
            tokio::select! {
                biased;
                output = &mut shutdown => break output,
                _ = ticker.tick() => self.frame(),
            }
        };

        info!("Shutdown signal received. Tearing down components...");
        self.clear();
        let frames = self.frame.frame - first_frame;
        self.system_event_sender
            .send(SystemEvent::FrameLoopStopped { frames })
            .ok();
        output
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}
