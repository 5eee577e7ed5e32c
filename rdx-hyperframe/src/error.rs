//! Error types for the scheduler.
//!
//! Only registration conflicts reach the caller. Every other failure happens
//! inside a lifecycle hook and is contained, classified by [`ErrorKind`], and
//! handed to the configured `ErrorSink`.

use crate::common::ComponentId;
use std::fmt;
use thiserror::Error;

/// The error type returned by lifecycle hooks.
pub type HookError = anyhow::Error;

/// Errors surfaced synchronously to the caller of `register`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A live component is already registered under this name.
    #[error("component '{name}' is already registered as {existing:?}")]
    DuplicateRegistration {
        /// The conflicting name.
        name: String,
        /// The handle of the component that holds the name.
        existing: ComponentId,
    },

    /// The requested parent is not (or no longer) registered.
    #[error("parent component {0:?} is not registered")]
    UnknownParent(ComponentId),
}

/// Classification of a contained lifecycle failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The `start` hook failed synchronously.
    StartError,
    /// The asynchronous initialization task failed.
    AsyncStartError,
    /// The `update` hook failed.
    UpdateError,
    /// The `dispose` hook failed.
    DisposeError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::StartError => "start",
            ErrorKind::AsyncStartError => "async start",
            ErrorKind::UpdateError => "update",
            ErrorKind::DisposeError => "dispose",
        };
        f.write_str(label)
    }
}
