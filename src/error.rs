//! Error types for nerfuse.

use thiserror::Error;

/// Result type for nerfuse operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for nerfuse operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An entity was inserted with an internal id already in use.
    #[error("Duplicate internal id: {0}")]
    DuplicateId(i64),

    /// Two distinct entities of the same type claim the same external id.
    #[error("Duplicate external id: {0}")]
    DuplicateExternalId(String),

    /// Two distinct valued entities claim the same value.
    #[error("Duplicate entity value: {0}")]
    DuplicateValue(String),

    /// No entity with the requested id exists in the collection.
    #[error("Unknown entity id: {0}")]
    UnknownEntity(i64),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A feature vector did not have the expected shape.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A classifier output could not be mapped back to a decision.
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Classifier inference failed.
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Evaluation produced an impossible result (e.g. precision above 1).
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// A persisted file could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an encoding error.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Error::Encoding(msg.into())
    }

    /// Create a decoding error.
    pub fn decoding(msg: impl Into<String>) -> Self {
        Error::Decoding(msg.into())
    }

    /// Create an inference error.
    pub fn inference(msg: impl Into<String>) -> Self {
        Error::Inference(msg.into())
    }

    /// Create an evaluation error.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Error::Evaluation(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }
}
