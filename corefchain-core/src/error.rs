//! Error types for corefchain-core.

use thiserror::Error;

/// Result type for corefchain-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for corefchain-core operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A document or document view could not be resolved.
    #[error("Document lookup failed: {0}")]
    DocumentLookup(String),

    /// A span does not fit inside its document.
    #[error("Span out of bounds: [{begin}, {end}) in document of length {len}")]
    SpanOutOfBounds {
        /// Span start
        begin: usize,
        /// Span end
        end: usize,
        /// Document text length in bytes
        len: usize,
    },
}

impl Error {
    /// Create a document lookup error.
    #[must_use]
    pub fn document_lookup(msg: impl Into<String>) -> Self {
        Self::DocumentLookup(msg.into())
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
