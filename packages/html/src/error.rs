use folio_model::ModelError;
use thiserror::Error;

pub type HtmlResult<T> = Result<T, HtmlError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HtmlError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Node type '{0}' has no HTML representation")]
    NoSerializer(String),

    #[error("Markup rejected at {pos}: {message}")]
    Markup { pos: usize, message: String },
}

impl HtmlError {
    pub fn markup(pos: usize, message: impl Into<String>) -> Self {
        Self::Markup {
            pos,
            message: message.into(),
        }
    }
}

impl From<HtmlError> for ModelError {
    fn from(err: HtmlError) -> Self {
        match err {
            HtmlError::Model(inner) => inner,
            other => ModelError::DomParse(other.to_string()),
        }
    }
}
