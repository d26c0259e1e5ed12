//! Error types for steps and transforms

use folio_model::ModelError;
use thiserror::Error;

pub type StepResult<T> = Result<T, StepError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Step range {from}..{to} out of document (size {size})")]
    OutOfRange { from: usize, to: usize, size: usize },

    #[error("Cannot {action} at {pos}: {reason}")]
    Structure {
        action: &'static str,
        pos: usize,
        reason: String,
    },

    #[error("Derived transform does not reproduce the target document")]
    Unreproducible,
}

impl StepError {
    pub fn structure(action: &'static str, pos: usize, reason: impl Into<String>) -> Self {
        Self::Structure {
            action,
            pos,
            reason: reason.into(),
        }
    }
}
