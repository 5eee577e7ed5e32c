//! The single source of truth for which components exist and what lifecycle
//! state they are in.
//!
//! Entries live in a generational arena keyed by `ComponentId`. Parent/child
//! ownership is stored as adjacency lists on the entries, so cascades are plain
//! traversals and a stale handle can never reach a newer component.

use crate::common::ComponentId;
use crate::component::{Component, InitTask};
use crate::error::RegistrationError;
use slotmap::SlotMap;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Where a component is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Registered, waiting for the next add phase.
    PendingStart,
    /// `start` handed back an in-flight task; excluded from updates.
    Initializing,
    /// Usable; updated every frame while enabled.
    Active,
    /// Waiting for the next removal phase.
    PendingRemoval,
    /// Terminal.
    Disposed,
}

impl LifecycleState {
    /// Whether the state machine has an edge from `self` to `next`.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (PendingStart, Active)
                | (PendingStart, Initializing)
                | (PendingStart, PendingRemoval)
                | (PendingStart, Disposed)
                | (Initializing, Active)
                | (Initializing, PendingRemoval)
                | (Initializing, Disposed)
                | (Active, PendingRemoval)
                | (PendingRemoval, Disposed)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LifecycleState::PendingStart => "pending-start",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Active => "active",
            LifecycleState::PendingRemoval => "pending-removal",
            LifecycleState::Disposed => "disposed",
        };
        f.write_str(label)
    }
}

/// Bookkeeping for one registered component.
pub(crate) struct Entry {
    pub name: String,
    pub state: LifecycleState,
    pub enabled: bool,
    pub parent: Option<ComponentId>,
    pub children: Vec<ComponentId>,
    /// `None` only while one of the component's own hooks is running.
    pub component: Option<Box<dyn Component>>,
    /// Present exactly while `Initializing`.
    pub init: Option<InitTask>,
    /// Frame on which the component entered `Initializing`.
    pub init_frame: u64,
    /// Set once the stalled-initialization warning was logged.
    pub init_flagged: bool,
    /// A removal request that arrived while `Initializing`.
    pub removal_deferred: bool,
}

/// A read-only view of one entry, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    pub id: ComponentId,
    pub name: String,
    pub state: LifecycleState,
    pub enabled: bool,
    pub parent: Option<ComponentId>,
}

/// Outcome of [`Registry::request_removal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalRequest {
    /// The component was moved to `PendingRemoval`.
    Marked,
    /// The component is initializing; removal happens once the task settles.
    Deferred,
    /// Unknown, already pending removal, or already deferred.
    Ignored,
}

#[derive(Default)]
pub struct Registry {
    entries: SlotMap<ComponentId, Entry>,
    /// Registration order. May hold handles of dropped entries until the
    /// next compaction; readers filter through `entries`.
    order: Vec<ComponentId>,
    /// Dropped handles still sitting in `order`.
    stale: usize,
    names: HashMap<String, ComponentId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a component in `PendingStart`.
    ///
    /// Fails without touching any state if the name is already taken by a live
    /// component or the parent is unknown.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        component: Box<dyn Component>,
        parent: Option<ComponentId>,
    ) -> Result<ComponentId, RegistrationError> {
        let name = name.into();
        if let Some(&existing) = self.names.get(&name) {
            return Err(RegistrationError::DuplicateRegistration { name, existing });
        }
        if let Some(parent_id) = parent {
            if !self.entries.contains_key(parent_id) {
                return Err(RegistrationError::UnknownParent(parent_id));
            }
        }

        let id = self.entries.insert(Entry {
            name: name.clone(),
            state: LifecycleState::PendingStart,
            enabled: true,
            parent,
            children: Vec::new(),
            component: Some(component),
            init: None,
            init_frame: 0,
            init_flagged: false,
            removal_deferred: false,
        });
        if let Some(parent_id) = parent {
            if let Some(parent_entry) = self.entries.get_mut(parent_id) {
                parent_entry.children.push(id);
            }
        }
        self.order.push(id);
        self.names.insert(name, id);
        debug!(?id, ?parent, "component registered");
        Ok(id)
    }

    /// Marks a component for removal.
    ///
    /// Requests against unknown or already-removing components are ignored.
    /// A component that is still initializing keeps its state and remembers the
    /// request instead.
    pub fn request_removal(&mut self, id: ComponentId) -> RemovalRequest {
        let Some(entry) = self.entries.get(id) else {
            return RemovalRequest::Ignored;
        };
        match (entry.state, entry.removal_deferred) {
            (LifecycleState::PendingStart | LifecycleState::Active, _) => {
                self.transition(id, LifecycleState::PendingRemoval);
                RemovalRequest::Marked
            }
            (LifecycleState::Initializing, false) => {
                if let Some(entry) = self.entries.get_mut(id) {
                    entry.removal_deferred = true;
                }
                RemovalRequest::Deferred
            }
            _ => RemovalRequest::Ignored,
        }
    }

    /// Moves a component along one edge of the state machine.
    ///
    /// # Panics
    ///
    /// Panics if the handle is dead or the edge does not exist. Both mean the
    /// scheduler's own bookkeeping is broken.
    pub(crate) fn transition(&mut self, id: ComponentId, next: LifecycleState) {
        let entry = self
            .entries
            .get_mut(id)
            .unwrap_or_else(|| panic!("transition of unregistered component {id:?}"));
        let current = entry.state;
        assert!(
            current.can_transition_to(next),
            "illegal lifecycle transition {current} -> {next} for '{}'",
            entry.name
        );
        entry.state = next;
        debug!(?id, from = %current, to = %next, "lifecycle transition");
    }

    /// Handles of every `Active`, enabled component, in registration order.
    pub fn active_enabled(&self) -> Vec<ComponentId> {
        self.order
            .iter()
            .copied()
            .filter(|&id| self.is_updatable(id))
            .collect()
    }

    /// Handles currently in `state`, in registration order.
    pub fn in_state(&self, state: LifecycleState) -> Vec<ComponentId> {
        self.order
            .iter()
            .copied()
            .filter(|&id| self.state(id) == Some(state))
            .collect()
    }

    pub(crate) fn is_updatable(&self, id: ComponentId) -> bool {
        self.entries
            .get(id)
            .is_some_and(|e| e.state == LifecycleState::Active && e.enabled)
    }

    pub fn state(&self, id: ComponentId) -> Option<LifecycleState> {
        self.entries.get(id).map(|e| e.state)
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn is_enabled(&self, id: ComponentId) -> Option<bool> {
        self.entries.get(id).map(|e| e.enabled)
    }

    /// Sets the enabled flag. Returns the previous value, or `None` for a dead
    /// handle.
    pub fn set_enabled(&mut self, id: ComponentId, enabled: bool) -> Option<bool> {
        let entry = self.entries.get_mut(id)?;
        Some(std::mem::replace(&mut entry.enabled, enabled))
    }

    pub fn name(&self, id: ComponentId) -> Option<&str> {
        self.entries.get(id).map(|e| e.name.as_str())
    }

    pub fn lookup(&self, name: &str) -> Option<ComponentId> {
        self.names.get(name).copied()
    }

    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.entries.get(id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: ComponentId) -> &[ComponentId] {
        self.entries
            .get(id)
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
    }

    /// Every descendant of `id`, depth first, parents before children.
    pub fn descendants(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut found = Vec::new();
        let mut stack: Vec<ComponentId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            found.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        found
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All live handles in registration order.
    pub fn ids(&self) -> Vec<ComponentId> {
        self.order
            .iter()
            .copied()
            .filter(|&id| self.entries.contains_key(id))
            .collect()
    }

    pub fn snapshot(&self) -> Vec<EntrySummary> {
        self.order
            .iter()
            .filter_map(|&id| {
                self.entries.get(id).map(|e| EntrySummary {
                    id,
                    name: e.name.clone(),
                    state: e.state,
                    enabled: e.enabled,
                    parent: e.parent,
                })
            })
            .collect()
    }

    pub(crate) fn entry_mut(&mut self, id: ComponentId) -> Option<&mut Entry> {
        self.entries.get_mut(id)
    }

    /// Takes the component out of its entry so one of its hooks can run while
    /// the registry stays reachable through the hook's context.
    pub(crate) fn take_component(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        self.entries.get_mut(id).and_then(|e| e.component.take())
    }

    pub(crate) fn restore_component(&mut self, id: ComponentId, component: Box<dyn Component>) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.component = Some(component);
        }
    }

    /// Transitions a component to `Disposed` and forgets it.
    ///
    /// The component is handed back so the caller decides when it is dropped.
    /// Children are detached, not removed; callers cascade first.
    pub(crate) fn drop_entry(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        self.transition(id, LifecycleState::Disposed);
        let entry = self.entries.remove(id)?;
        self.stale += 1;
        if self.stale * 2 > self.order.len() {
            self.compact();
        }
        self.names.remove(&entry.name);
        if let Some(parent_id) = entry.parent {
            if let Some(parent) = self.entries.get_mut(parent_id) {
                parent.children.retain(|&child| child != id);
            }
        }
        for child in &entry.children {
            if let Some(child_entry) = self.entries.get_mut(*child) {
                child_entry.parent = None;
            }
        }
        entry.component
    }

    fn compact(&mut self) {
        let entries = &self.entries;
        self.order.retain(|&id| entries.contains_key(id));
        self.stale = 0;
    }

    /// Forgets every entry without running any hook.
    pub(crate) fn reset(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.stale = 0;
        self.names.clear();
    }
}
