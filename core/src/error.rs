use crate::DocId;

/// Errors surfaced by the index.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed input: negative or duplicate id, forbidden characters, bad minus syntax.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The operation needs a document that is not in the index.
    #[error("document {0} not found")]
    NotFound(DocId),
    /// Configuration could not be loaded or is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
