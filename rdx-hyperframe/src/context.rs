//! The context handed to every lifecycle hook.
//!
//! There is no ambient "current scheduler". Everything a hook may touch
//! (its own bookkeeping, its children, the scene) arrives through a
//! [`Context`] that only lives for the duration of the call.

use crate::common::{ComponentId, FrameInfo};
use crate::component::Component;
use crate::error::RegistrationError;
use crate::events::LifecycleEvent;
use crate::registry::{LifecycleState, Registry, RemovalRequest};
use crate::scene::Scene;
use tokio::sync::broadcast;
use tracing::{debug, warn};

pub struct Context<'a> {
    id: ComponentId,
    registry: &'a mut Registry,
    scene: &'a mut dyn Scene,
    events: &'a broadcast::Sender<LifecycleEvent>,
    frame: FrameInfo,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        id: ComponentId,
        registry: &'a mut Registry,
        scene: &'a mut dyn Scene,
        events: &'a broadcast::Sender<LifecycleEvent>,
        frame: FrameInfo,
    ) -> Self {
        Self {
            id,
            registry,
            scene,
            events,
            frame,
        }
    }

    /// The handle of the component whose hook is running.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.registry.name(self.id).unwrap_or_default()
    }

    pub fn frame(&self) -> FrameInfo {
        self.frame
    }

    pub fn scene(&mut self) -> &mut dyn Scene {
        &mut *self.scene
    }

    /// Registers a component owned by the current one.
    ///
    /// The child starts on the next add phase, and it is removed whenever
    /// this component is.
    pub fn spawn_child(
        &mut self,
        name: impl Into<String>,
        component: impl Component,
    ) -> Result<ComponentId, RegistrationError> {
        register(
            self.registry,
            self.events,
            name,
            Box::new(component),
            Some(self.id),
        )
    }

    pub fn children(&self) -> &[ComponentId] {
        self.registry.children(self.id)
    }

    pub fn state(&self, id: ComponentId) -> Option<LifecycleState> {
        self.registry.state(id)
    }

    pub fn lookup(&self, name: &str) -> Option<ComponentId> {
        self.registry.lookup(name)
    }

    /// Requests removal of any component. Idempotent.
    pub fn request_removal(&mut self, id: ComponentId) {
        request_removal(self.registry, self.events, id);
    }

    /// Requests removal of the component whose hook is running.
    pub fn remove_self(&mut self) {
        request_removal(self.registry, self.events, self.id);
    }

    /// Returns `false` if the handle is dead.
    pub fn set_enabled(&mut self, id: ComponentId, enabled: bool) -> bool {
        set_enabled(self.registry, self.events, id, enabled)
    }
}

pub(crate) fn register(
    registry: &mut Registry,
    events: &broadcast::Sender<LifecycleEvent>,
    name: impl Into<String>,
    component: Box<dyn Component>,
    parent: Option<ComponentId>,
) -> Result<ComponentId, RegistrationError> {
    let id = registry.register(name, component, parent)?;
    events.send(LifecycleEvent::Registered { id, parent }).ok();
    Ok(id)
}

pub(crate) fn request_removal(
    registry: &mut Registry,
    events: &broadcast::Sender<LifecycleEvent>,
    id: ComponentId,
) -> RemovalRequest {
    let outcome = registry.request_removal(id);
    match outcome {
        RemovalRequest::Marked => {
            events.send(LifecycleEvent::RemovalRequested { id }).ok();
        }
        RemovalRequest::Deferred => {
            debug!(?id, "removal deferred until initialization settles");
            events.send(LifecycleEvent::RemovalRequested { id }).ok();
        }
        RemovalRequest::Ignored => {
            debug!(?id, "removal request ignored");
        }
    }
    outcome
}

pub(crate) fn set_enabled(
    registry: &mut Registry,
    events: &broadcast::Sender<LifecycleEvent>,
    id: ComponentId,
    enabled: bool,
) -> bool {
    match registry.set_enabled(id, enabled) {
        Some(previous) => {
            if previous != enabled {
                let event = if enabled {
                    LifecycleEvent::Enabled { id }
                } else {
                    LifecycleEvent::Disabled { id }
                };
                events.send(event).ok();
            }
            true
        }
        None => {
            warn!(?id, enabled, "enable flag change on an unregistered component");
            false
        }
    }
}
