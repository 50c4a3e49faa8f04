//! Error types for the volume profile engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the volume profile engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Input bars or parameters cannot produce a profile.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every bucket ended up with zero volume.
    #[error("Empty profile: {0}")]
    EmptyProfile(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse error category, for callers that map errors onto their own types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    EmptyProfile,
    Config,
    Io,
    Json,
}

impl Error {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::EmptyProfile(_) => ErrorKind::EmptyProfile,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
            Error::Json(_) => ErrorKind::Json,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an empty profile error.
    pub fn empty_profile(msg: impl Into<String>) -> Self {
        Error::EmptyProfile(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// True for [`Error::InvalidInput`].
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }

    /// True for [`Error::EmptyProfile`]. Callers show an empty state for these.
    pub fn is_empty_profile(&self) -> bool {
        matches!(self, Error::EmptyProfile(_))
    }
}
