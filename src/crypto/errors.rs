use thiserror::Error;

use super::levels::{Level, LevelList, LevelViolation};
use super::types::ContextId;
use crate::engine::EngineError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GradedError {
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    #[error("Engine allocation failed: {source}")]
    AllocationFailure {
        #[from]
        source: EngineError,
    },

    #[error("{context}: {violation} (kappa = {kappa}, levels: {levels})")]
    LevelOverflow {
        context: ContextId,
        violation: LevelViolation,
        kappa: usize,
        levels: LevelList,
    },

    #[error("{context}: {operation} needs equal levels, got {left} and {right}")]
    LevelMismatch {
        context: ContextId,
        operation: &'static str,
        left: Level,
        right: Level,
    },

    #[error("{operation} mixes encodings from {left} and {right}")]
    IncompatibleContext {
        operation: &'static str,
        left: ContextId,
        right: ContextId,
    },

    #[error("{context} has been disposed")]
    DisposedContextAccess { context: ContextId },

    #[error("{context}: {resource} lock was poisoned by a panicking operation")]
    StatePoisoned {
        context: ContextId,
        resource: &'static str,
    },

    #[error("{context}: product of no encodings")]
    EmptyProduct { context: ContextId },
}

pub type GradedResult<T> = Result<T, GradedError>;
