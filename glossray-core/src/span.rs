//! Half-open character spans over a document's extracted text.
//!
//! Every annotation the engine handles, token or mention, is tied to a
//! [`TextSpan`]. Offsets are document-wide and count Unicode scalar values
//! (chars), not bytes:
//!
//! ```text
//! Text:   "Jon Snow left Winterfell."
//!          0123456789...
//!
//! "Jon Snow"    -> [0, 8)
//! "Winterfell"  -> [14, 24)
//! ```
//!
//! A span is never empty. The only way to build one is [`TextSpan::new`]
//! (or a `TryFrom`/deserialize that goes through it), so once you hold a
//! `TextSpan` the `start < end` invariant holds.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A non-empty, half-open `[start, end)` range of char offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "SpanRepr")]
pub struct TextSpan {
    start: usize,
    end: usize,
}

#[derive(Deserialize)]
struct SpanRepr {
    start: usize,
    end: usize,
}

impl TryFrom<SpanRepr> for TextSpan {
    type Error = Error;

    fn try_from(repr: SpanRepr) -> Result<Self> {
        Self::new(repr.start, repr.end)
    }
}

impl TextSpan {
    /// Create a span, failing with [`Error::InvalidSpan`] unless `start < end`.
    ///
    /// # Example
    /// ```
    /// use glossray_core::TextSpan;
    ///
    /// let span = TextSpan::new(4, 8).unwrap();
    /// assert_eq!(span.len(), 4);
    /// assert!(TextSpan::new(8, 8).is_err());
    /// ```
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(Error::invalid_span(start, end))
        }
    }

    /// Start offset (inclusive).
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// End offset (exclusive).
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Number of chars covered. Always at least 1.
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Offsets as a `Range`.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether the two spans share at least one offset.
    #[must_use]
    pub const fn overlaps(&self, other: &TextSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `point` falls inside this span.
    #[must_use]
    pub const fn contains(&self, point: usize) -> bool {
        self.start <= point && point < self.end
    }

    /// Whether `other` lies entirely within this span.
    #[must_use]
    pub const fn contains_span(&self, other: &TextSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Translate a chunk-local span into document coordinates.
    ///
    /// Fails with [`Error::InvalidInput`] if the shifted offsets overflow.
    pub fn shifted(&self, base: usize) -> Result<Self> {
        match (self.start.checked_add(base), self.end.checked_add(base)) {
            (Some(start), Some(end)) => Ok(Self { start, end }),
            _ => Err(Error::invalid_input(format!(
                "span {} shifted by {} overflows",
                self, base
            ))),
        }
    }

    /// Slice the covered text out of `text`, counting chars.
    ///
    /// Returns an empty string if the span lies beyond the text.
    #[must_use]
    pub fn extract(&self, text: &str) -> String {
        text.chars().skip(self.start).take(self.len()).collect()
    }
}

impl TryFrom<Range<usize>> for TextSpan {
    type Error = Error;

    fn try_from(range: Range<usize>) -> Result<Self> {
        Self::new(range.start, range.end)
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
