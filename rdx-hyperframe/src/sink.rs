//! The single reporting channel for contained lifecycle failures.

use crate::common::ComponentId;
use crate::error::{ErrorKind, HookError};
use tracing::error;

/// One contained failure, as handed to an [`ErrorSink`].
#[derive(Debug)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub id: ComponentId,
    /// The name the component was registered under.
    pub name: String,
    pub error: HookError,
}

/// A write-only destination for lifecycle failures.
///
/// The scheduler never reads anything back from a sink.
pub trait ErrorSink: Send + Sync {
    fn report(&self, report: ErrorReport);
}

/// The default sink: every report becomes a `tracing` error event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, report: ErrorReport) {
        error!(
            component = %report.name,
            id = ?report.id,
            kind = %report.kind,
            "{} hook failed: {:#}",
            report.kind,
            report.error
        );
    }
}
