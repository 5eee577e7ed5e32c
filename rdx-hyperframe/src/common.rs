//! Contains common, primitive types shared by every part of the scheduler.
//!
//! Components are addressed by generational keys rather than by reference, so a
//! handle that outlives its component can never reach a newer one.

use slotmap::new_key_type;

new_key_type! {
    /// Uniquely and safely identifies a registered component.
    ///
    /// The key is handed out by `Scheduler::register` and stays valid until the
    /// component is dropped from the registry. Keys are generational: once a
    /// component is disposed its key is dead for good, even if the slot is
    /// later reused by a fresh registration.
    pub struct ComponentId;
}

/// A snapshot of frame timing handed to hooks and to the scene collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInfo {
    /// Number of completed `update()` calls before the current one.
    pub frame: u64,
    /// Clamped delta of the most recent update phase, in seconds.
    pub delta: f64,
    /// Sum of all clamped deltas so far, in seconds.
    pub elapsed: f64,
}
