use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid schema for '{name}': {message}")]
    InvalidSchema { name: String, message: String },

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Unknown mark type: {0}")]
    UnknownMarkType(String),

    #[error("Invalid attributes for '{name}': {message}")]
    InvalidAttrs { name: String, message: String },

    #[error("Invalid content for node {0}")]
    InvalidContent(String),

    #[error("Mark {mark} is not allowed in node {node}")]
    MarkNotAllowed { mark: String, node: String },

    #[error("Position {pos} out of range (size {size})")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Replace error: {0}")]
    Replace(String),

    #[error("DOM parse error: {0}")]
    DomParse(String),
}

impl ModelError {
    pub fn invalid_schema(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_attrs(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttrs {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::InvalidJson(message.into())
    }

    pub fn replace(message: impl Into<String>) -> Self {
        Self::Replace(message.into())
    }
}
