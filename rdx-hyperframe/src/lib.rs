//! # Hyperframe
//!
//! A frame-driven lifecycle scheduler for stateful components.
//!
//! Hyperframe owns the bookkeeping of a set of components and moves each one
//! through registration, (possibly asynchronous) start, per-frame update and
//! disposal. A failure in one component's hook is contained, reported, and
//! never stops the frame or touches its siblings.
//!
//! ## Core Concepts
//!
//! - **Frame**: one call to `Scheduler::update`. Every frame runs three phases in
//!   a fixed order: add (start new components, settle async starts), removal
//!   (dispose everything asked to leave, cascading to children), update
//!   (hand the clamped delta to every active, enabled component).
//! - **Capabilities**: a component implements any of `Start`, `Update` and
//!   `Dispose`, and says so through `Component::as_*`. Absent hooks are skipped.
//! - **Async start**: `start` may return an `InitTask`. The component stays
//!   inert until the task settles; the scheduler polls it at frame boundaries
//!   and never blocks.
//! - **Context**: every hook receives a `Context` giving it its own handle, its
//!   children, the scene and the removal/enable controls. There is no global
//!   state.
//! - **Error Sink**: all contained failures funnel through one `ErrorSink`.
//!
//! ## Example Usage
//!
//! ```rust
//! use hyperframe::components::FnComponent;
//! use hyperframe::prelude::*;
//! use std::time::Duration;
//!
//! fn main() -> anyhow::Result<()> {
//!     let clock = ManualClock::new();
//!     let mut scheduler = Scheduler::new(SchedulerConfig::default()).with_clock(clock.clone());
//!
//!     let player = scheduler.register(
//!         "player",
//!         FnComponent::new().on_update(|_ctx, delta| {
//!             assert!(delta <= 0.1);
//!             Ok(())
//!         }),
//!     )?;
//!
//!     clock.advance(Duration::from_millis(16));
//!     scheduler.frame();
//!     assert_eq!(scheduler.state(player), Some(LifecycleState::Active));
//!
//!     scheduler.request_removal(player);
//!     scheduler.frame();
//!     assert_eq!(scheduler.state(player), None);
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Hyperframe";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod assets;
pub mod common;
pub mod component;
pub mod components;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod registry;
pub mod scene;
pub mod scheduler;
pub mod sink;
pub mod time;

/// A prelude module for easy importing of the most common Hyperframe types.
pub mod prelude {
    pub use crate::common::{ComponentId, FrameInfo};
    pub use crate::component::{Component, Dispose, InitTask, InitStatus, Start, Started, Update};
    pub use crate::config::{FrameRate, SchedulerConfig};
    pub use crate::context::Context;
    pub use crate::error::{ErrorKind, HookError, RegistrationError};
    pub use crate::events::{LifecycleEvent, SystemEvent};
    pub use crate::registry::LifecycleState;
    pub use crate::scene::{HeadlessScene, Scene, Viewport};
    pub use crate::scheduler::Scheduler;
    pub use crate::sink::{ErrorReport, ErrorSink, TracingSink};
    pub use crate::time::{Clock, ManualClock, SystemClock};
}
