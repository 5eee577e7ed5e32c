//! Contains reusable components built on the lifecycle capabilities.
//!
//! None of these are needed by the scheduler itself. They cover the common
//! shapes of component logic: closures for quick one-offs, periodic work, a
//! stepped automation that removes itself when done, and an asset-backed
//! scene node with an asynchronous start.

pub mod asset;
pub mod closure;
pub mod interval;
pub mod sequence;

pub use asset::AssetNode;
pub use closure::FnComponent;
pub use interval::Interval;
pub use sequence::{step, RepetitionPolicy, Sequence, SequenceStep};
