//! Error types for the editor

use folio_html::HtmlError;
use folio_model::ModelError;
use folio_transform::StepError;
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Capability '{name}' is registered more than once")]
    SchemaConflict { name: String },

    #[error("Invalid schema fragment for '{name}': {message}")]
    InvalidSchemaFragment { name: String, message: String },

    #[error("Shortcut '{key}' is bound by both {first} and {second}")]
    DuplicateShortcut {
        key: String,
        first: String,
        second: String,
    },

    #[error("Unrecognized shortcut '{0}'")]
    InvalidShortcut(String),

    #[error("Capability '{0}' has no entry in the schema")]
    UnknownCapability(String),

    #[error("No editing surface is mounted")]
    NoActiveSurface,

    #[error("Transaction was built against a different document")]
    MismatchedTransaction,

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Step error: {0}")]
    Step(#[from] StepError),

    #[error("HTML error: {0}")]
    Html(#[from] HtmlError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
