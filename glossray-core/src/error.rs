//! Error types for glossray-core.

use crate::span::TextSpan;
use crate::ChunkId;
use thiserror::Error;

/// Result type for glossray operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for glossray operations.
///
/// Every variant except [`Error::NoGlossAvailable`] aborts the whole pass:
/// a pass either produces complete Word-Wise/X-Ray output or nothing.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Offsets do not form a non-empty half-open range.
    #[error("Invalid span: [{start}, {end}) must satisfy start < end")]
    InvalidSpan {
        /// Offending start offset
        start: usize,
        /// Offending end offset
        end: usize,
    },

    /// A chunk arrived with a base offset lower than its predecessor.
    #[error("Out-of-order chunk {chunk_id}: base offset {base_offset} precedes {previous}")]
    OutOfOrderChunk {
        /// Chunk that was rejected
        chunk_id: ChunkId,
        /// Its base offset
        base_offset: usize,
        /// Base offset of the last accepted chunk in the same pass
        previous: usize,
    },

    /// Two token spans from the same pipeline pass overlap.
    #[error("Overlapping tokens in pass {pass}: {first} and {second}")]
    OverlappingTokens {
        /// Pipeline pass both tokens belong to
        pass: u32,
        /// Token already accepted
        first: TextSpan,
        /// Token that was rejected
        second: TextSpan,
    },

    /// A token has no usable gloss candidate. Local to that token.
    #[error("No gloss available for token at {span}")]
    NoGlossAvailable {
        /// Span of the token
        span: TextSpan,
    },

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be parsed.
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create an invalid span error.
    #[must_use]
    pub fn invalid_span(start: usize, end: usize) -> Self {
        Self::InvalidSpan { start, end }
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a config error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error only affects a single token rather than the pass.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::NoGlossAvailable { .. })
    }
}
