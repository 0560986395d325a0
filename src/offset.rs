//! Byte to character offset conversion for chunk input.
//!
//! Every span in the document index is measured in characters (Unicode
//! scalar values). Some NLP pipelines report UTF-8 byte offsets instead:
//!
//! ```text
//! Text:   "Dany paid €50"
//!
//! bytes:  D a n y _ p a i d _ [ € ] 5 0
//!         0 1 2 3 4 5 6 7 8 9 10-12 13 14
//!
//! chars:  D a n y _ p a i d _  €  5  0
//!         0 1 2 3 4 5 6 7 8 9 10 11 12
//! ```
//!
//! "€50" is bytes `[10, 15)` but chars `[10, 13)`. Chunks tagged with
//! [`OffsetUnit::Bytes`](crate::collector::OffsetUnit) are converted with a
//! [`SpanConverter`] built from the chunk text before anything is inserted.
//!
//! Byte offsets inside a multi-byte character or past the end of the text
//! are rejected with [`Error::InvalidInput`].

use crate::{Error, Result};

/// Converter for many spans over the same chunk text.
///
/// Pre-computes the byte position of every character boundary, so each
/// conversion is a binary search.
#[derive(Debug, Clone)]
pub struct SpanConverter {
    /// Byte offset of each char start, followed by `text.len()`
    boundaries: Vec<usize>,
    is_ascii: bool,
}

impl SpanConverter {
    /// Create a converter for the given text.
    #[must_use]
    pub fn new(text: &str) -> Self {
        if text.is_ascii() {
            return Self {
                boundaries: vec![text.len()],
                is_ascii: true,
            };
        }
        let mut boundaries: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        boundaries.push(text.len());
        Self {
            boundaries,
            is_ascii: false,
        }
    }

    /// Whether byte and char offsets coincide.
    #[must_use]
    pub const fn is_ascii(&self) -> bool {
        self.is_ascii
    }

    /// Length of the text in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.boundaries.last().copied().unwrap_or(0)
    }

    /// Length of the text in chars.
    #[must_use]
    pub fn char_len(&self) -> usize {
        if self.is_ascii {
            self.byte_len()
        } else {
            self.boundaries.len() - 1
        }
    }

    /// Convert a byte offset to a char offset.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if the offset is past the end of the text or
    /// not on a character boundary.
    pub fn byte_to_char(&self, byte_idx: usize) -> Result<usize> {
        if byte_idx > self.byte_len() {
            return Err(Error::invalid_input(format!(
                "byte offset {} is past the end of a {}-byte chunk",
                byte_idx,
                self.byte_len()
            )));
        }
        if self.is_ascii {
            return Ok(byte_idx);
        }
        self.boundaries.binary_search(&byte_idx).map_err(|_| {
            Error::invalid_input(format!(
                "byte offset {} is inside a multi-byte character",
                byte_idx
            ))
        })
    }

    /// Convert a char offset to a byte offset.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if the offset is past the end of the text.
    pub fn char_to_byte(&self, char_idx: usize) -> Result<usize> {
        if self.is_ascii {
            return if char_idx <= self.byte_len() {
                Ok(char_idx)
            } else {
                Err(self.char_overflow(char_idx))
            };
        }
        self.boundaries
            .get(char_idx)
            .copied()
            .ok_or_else(|| self.char_overflow(char_idx))
    }

    /// Convert a byte range to a char range.
    ///
    /// # Errors
    ///
    /// See [`SpanConverter::byte_to_char`].
    pub fn bytes_to_chars(&self, byte_start: usize, byte_end: usize) -> Result<(usize, usize)> {
        Ok((self.byte_to_char(byte_start)?, self.byte_to_char(byte_end)?))
    }

    fn char_overflow(&self, char_idx: usize) -> Error {
        Error::invalid_input(format!(
            "char offset {} is past the end of a {}-char chunk",
            char_idx,
            self.char_len()
        ))
    }
}

/// Convert a single byte range without keeping a converter around.
///
/// # Errors
///
/// See [`SpanConverter::byte_to_char`].
pub fn bytes_to_chars(text: &str, byte_start: usize, byte_end: usize) -> Result<(usize, usize)> {
    SpanConverter::new(text).bytes_to_chars(byte_start, byte_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_identity() {
        let conv = SpanConverter::new("Winter is coming");
        assert!(conv.is_ascii());
        assert_eq!(conv.byte_to_char(7).unwrap(), 7);
        assert_eq!(conv.char_to_byte(16).unwrap(), 16);
        assert!(conv.byte_to_char(17).is_err());
    }

    #[test]
    fn test_euro_sign() {
        let text = "Dany paid €50";
        let conv = SpanConverter::new(text);
        assert!(!conv.is_ascii());
        assert_eq!(conv.bytes_to_chars(10, 15).unwrap(), (10, 13));
        assert_eq!(conv.char_len(), 13);
        assert_eq!(conv.byte_len(), 15);
        assert_eq!(conv.char_to_byte(11).unwrap(), 13);
    }

    #[test]
    fn test_mid_character_offset_is_rejected() {
        let conv = SpanConverter::new("café");
        // 'é' occupies bytes 3..5
        assert_eq!(conv.byte_to_char(3).unwrap(), 3);
        let err = conv.byte_to_char(4).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(conv.byte_to_char(5).unwrap(), 4);
    }

    #[test]
    fn test_emoji_and_cjk() {
        let text = "🐉 火 dragon";
        let conv = SpanConverter::new(text);
        // 🐉 = 4 bytes, space, 火 = 3 bytes, space
        assert_eq!(bytes_to_chars(text, 0, 4).unwrap(), (0, 1));
        assert_eq!(conv.bytes_to_chars(5, 8).unwrap(), (2, 3));
        assert_eq!(conv.bytes_to_chars(9, 15).unwrap(), (4, 10));
        assert!(conv.byte_to_char(2).is_err());
    }

    #[test]
    fn test_out_of_range() {
        let conv = SpanConverter::new("ñ");
        assert!(conv.byte_to_char(3).is_err());
        assert!(conv.char_to_byte(2).is_err());
        assert_eq!(conv.char_to_byte(1).unwrap(), 2);
    }

    #[test]
    fn test_empty_text() {
        let conv = SpanConverter::new("");
        assert_eq!(conv.char_len(), 0);
        assert_eq!(conv.byte_to_char(0).unwrap(), 0);
        assert!(conv.byte_to_char(1).is_err());
    }
}
