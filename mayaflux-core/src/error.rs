//! Error taxonomy shared by every MayaFlux crate. Mirrors the per-module
//! `thiserror` enums `kyute-shell` and `mlr` use (each wraps a small closed
//! set of failure kinds with `#[error("...")]` messages), widened so every
//! error can carry a component tag, a context tag and a source location
//! regardless of which crate raised it.

use std::panic::Location;
use thiserror::Error;

/// Which subsystem raised the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Buffers,
    Nodes,
    Core,
    Scheduler,
    Transfer,
    Window,
    Io,
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Component::Buffers => "Buffers",
            Component::Nodes => "Nodes",
            Component::Core => "Core",
            Component::Scheduler => "Scheduler",
            Component::Transfer => "Transfer",
            Component::Window => "Window",
            Component::Io => "IO",
        };
        f.write_str(s)
    }
}

/// Which operation was in progress when the error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Init,
    BufferProcessing,
    NodeEvaluation,
    RoutineResume,
    Transfer,
    Distribution,
    EventDispatch,
    Teardown,
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Context::Init => "Init",
            Context::BufferProcessing => "BufferProcessing",
            Context::NodeEvaluation => "NodeEvaluation",
            Context::RoutineResume => "RoutineResume",
            Context::Transfer => "Transfer",
            Context::Distribution => "Distribution",
            Context::EventDispatch => "EventDispatch",
            Context::Teardown => "Teardown",
        };
        f.write_str(s)
    }
}

/// The closed set of failure kinds a MayaFlux operation can raise. These are
/// kinds, not a type per kind: every one of them is surfaced through
/// [`MayaFluxError`], which attaches the component/context/location metadata
/// every caller needs.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("resource not initialized: {0}")]
    ResourceNotInitialized(String),

    #[error("incompatible: {0}")]
    Incompatible(String),

    #[error("required backend service missing: {0}")]
    BackendMissing(String),

    #[error("routine fault: {0}")]
    RoutineFault(String),

    #[error("invalid state transition: {0}")]
    StateTransition(String),

    #[error("awaiter used in wrong promise domain: {0}")]
    DomainMismatch(String),
}

/// The error type every MayaFlux crate returns from fallible operations.
#[derive(Debug, Error)]
#[error("[{component}/{context}] {kind} (at {file}:{line})")]
pub struct MayaFluxError {
    pub component: Component,
    pub context: Context,
    pub kind: ErrorKind,
    file: &'static str,
    line: u32,
}

impl MayaFluxError {
    #[track_caller]
    pub fn new(component: Component, context: Context, kind: ErrorKind) -> Self {
        let loc = Location::caller();
        Self {
            component,
            context,
            kind,
            file: loc.file(),
            line: loc.line(),
        }
    }

    #[track_caller]
    pub fn invalid_argument(component: Component, context: Context, msg: impl Into<String>) -> Self {
        Self::new(component, context, ErrorKind::InvalidArgument(msg.into()))
    }

    #[track_caller]
    pub fn backend_missing(component: Component, context: Context, msg: impl Into<String>) -> Self {
        Self::new(component, context, ErrorKind::BackendMissing(msg.into()))
    }

    #[track_caller]
    pub fn incompatible(component: Component, context: Context, msg: impl Into<String>) -> Self {
        Self::new(component, context, ErrorKind::Incompatible(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, MayaFluxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_carries_component_and_context() {
        let e = MayaFluxError::invalid_argument(Component::Buffers, Context::Init, "null buffer");
        let s = e.to_string();
        assert!(s.contains("Buffers"));
        assert!(s.contains("Init"));
        assert!(s.contains("null buffer"));
    }
}
