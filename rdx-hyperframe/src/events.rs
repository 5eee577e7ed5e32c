//! Defines all public event types broadcast by the scheduler.
//!
//! Events are informational. The scheduler never waits on subscribers and a
//! full or receiver-less channel is silently ignored.

use crate::common::ComponentId;
use crate::error::ErrorKind;
use tokio::time::Instant;

/// Events describing a single component moving through its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// A component was accepted into the registry in `PendingStart`.
    Registered { id: ComponentId, parent: Option<ComponentId> },
    /// A component's `start` handed back an in-flight task.
    Initializing { id: ComponentId },
    /// A component became `Active`.
    Activated { id: ComponentId },
    /// A component was marked for removal.
    RemovalRequested { id: ComponentId },
    /// A component's enabled flag was cleared.
    Disabled { id: ComponentId },
    /// A component's enabled flag was set again.
    Enabled { id: ComponentId },
    /// A component went through the removal phase and left the registry.
    Disposed { id: ComponentId },
    /// A component left the registry without a dispose call.
    Dropped { id: ComponentId },
    /// A lifecycle hook failed and the failure was contained.
    Faulted { id: ComponentId, kind: ErrorKind },
}

/// Events related to the scheduler and its frame driver.
#[derive(Debug, Clone)]
pub enum SystemEvent {
    /// Fired once when the frame driver begins pacing frames.
    FrameLoopStarted { timestamp: Instant },
    /// Fired once when the frame driver stops.
    FrameLoopStopped { frames: u64 },
    /// Fired after `clear()` has torn everything down.
    Cleared { removed: usize },
}
