//! Chunk ingestion into the document index.
//!
//! The upstream NLP pipeline processes a book one chunk (usually one
//! chapter) at a time and reports offsets relative to the chunk. The
//! collector shifts them to document offsets, validates them and inserts
//! them into the [`DocumentIndex`].
//!
//! # Ordering
//!
//! Within one pass, chunks must arrive with non-decreasing `base_offset`.
//! A chunk that goes backwards fails with [`Error::OutOfOrderChunk`]. When
//! the producer cannot guarantee order, use [`BufferedCollector`], which
//! sorts before feeding.
//!
//! # Atomicity
//!
//! A chunk is validated completely before its first annotation is inserted.
//! Any error leaves the index exactly as it was.

use crate::offset::SpanConverter;
use crate::{Error, Result};
use glossray_core::{
    Annotation, ChunkId, DocumentIndex, EntityKind, GlossCandidate, Mention, PartOfSpeech,
    TextSpan, TokenAnnotation,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Wire shape
// =============================================================================

/// Unit of the offsets in a [`RawChunk`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetUnit {
    /// Unicode scalar values (the index's own unit)
    #[default]
    Chars,
    /// UTF-8 bytes; the chunk must carry its text
    Bytes,
}

/// A mention as reported by the NER model, with chunk-local offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMention {
    /// Chunk-local start
    pub start: usize,
    /// Chunk-local end (exclusive)
    pub end: usize,
    /// Mention text; taken from the chunk text when empty
    #[serde(default)]
    pub surface_form: String,
    /// Model label
    pub kind: EntityKind,
    /// Model score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_score: Option<f64>,
}

impl RawMention {
    /// Create a raw mention.
    #[must_use]
    pub fn new(start: usize, end: usize, surface_form: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            start,
            end,
            surface_form: surface_form.into(),
            kind,
            raw_score: None,
        }
    }
}

fn default_pos() -> PartOfSpeech {
    PartOfSpeech::Other
}

/// A token as reported by the tokenizer/lemmatizer, with chunk-local offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToken {
    /// Chunk-local start
    pub start: usize,
    /// Chunk-local end (exclusive)
    pub end: usize,
    /// Dictionary form
    pub lemma: String,
    /// UD tag
    #[serde(default = "default_pos")]
    pub pos: PartOfSpeech,
    /// Gloss candidates in upstream order
    #[serde(default)]
    pub candidates: Vec<GlossCandidate>,
}

impl RawToken {
    /// Create a raw token.
    #[must_use]
    pub fn new(
        start: usize,
        end: usize,
        lemma: impl Into<String>,
        pos: PartOfSpeech,
        candidates: Vec<GlossCandidate>,
    ) -> Self {
        Self {
            start,
            end,
            lemma: lemma.into(),
            pos,
            candidates,
        }
    }
}

/// One chunk of NLP output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChunk {
    /// Chunk identifier
    pub chunk_id: ChunkId,
    /// Document offset (chars) of the chunk's first char
    pub base_offset: usize,
    /// NLP pass that produced the chunk
    #[serde(default)]
    pub pass: u32,
    /// Unit of `start`/`end` in tokens and mentions
    #[serde(default)]
    pub offsets: OffsetUnit,
    /// Chunk text; required for [`OffsetUnit::Bytes`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Tokens
    #[serde(default)]
    pub tokens: Vec<RawToken>,
    /// Entity mentions
    #[serde(default)]
    pub mentions: Vec<RawMention>,
}

impl RawChunk {
    /// Empty chunk from pass 0 with char offsets.
    #[must_use]
    pub fn new(chunk_id: ChunkId, base_offset: usize) -> Self {
        Self {
            chunk_id,
            base_offset,
            pass: 0,
            offsets: OffsetUnit::Chars,
            text: None,
            tokens: Vec::new(),
            mentions: Vec::new(),
        }
    }

    /// Set the pass.
    #[must_use]
    pub fn with_pass(mut self, pass: u32) -> Self {
        self.pass = pass;
        self
    }

    /// Attach the chunk text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Mark offsets as UTF-8 bytes.
    #[must_use]
    pub fn with_byte_offsets(mut self) -> Self {
        self.offsets = OffsetUnit::Bytes;
        self
    }

    /// Add a mention.
    #[must_use]
    pub fn with_mention(mut self, mention: RawMention) -> Self {
        self.mentions.push(mention);
        self
    }

    /// Add a token.
    #[must_use]
    pub fn with_token(mut self, token: RawToken) -> Self {
        self.tokens.push(token);
        self
    }
}

// =============================================================================
// Collector
// =============================================================================

/// Translates chunk-local annotations into a document-wide index.
///
/// Takes `&mut self` for every insertion, so a collector cannot be fed from
/// two threads at once.
///
/// # Example
///
/// ```
/// use glossray::collector::{MentionCollector, RawMention};
/// use glossray::EntityKind;
///
/// let mut collector = MentionCollector::new();
/// collector.add_chunk(1, 0, vec![RawMention::new(0, 3, "Jon", EntityKind::Person)])?;
/// collector.add_chunk(2, 500, vec![RawMention::new(4, 8, "Snow", EntityKind::Person)])?;
///
/// let index = collector.finish();
/// let spans: Vec<_> = index.mentions().map(|(_, m)| (m.span.start(), m.span.end())).collect();
/// assert_eq!(spans, vec![(0, 3), (504, 508)]);
/// # Ok::<(), glossray::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct MentionCollector {
    index: DocumentIndex,
    /// Base offset of the last accepted chunk, per pass
    last_base: BTreeMap<u32, usize>,
    /// Accepted token spans per pass, start -> end
    token_spans: BTreeMap<u32, BTreeMap<usize, usize>>,
    chunks: usize,
}

impl MentionCollector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest mentions of one chunk from pass 0 with char offsets.
    ///
    /// # Errors
    ///
    /// See [`MentionCollector::ingest`].
    pub fn add_chunk(
        &mut self,
        chunk_id: ChunkId,
        base_offset: usize,
        raw_mentions: impl IntoIterator<Item = RawMention>,
    ) -> Result<()> {
        let mut chunk = RawChunk::new(chunk_id, base_offset);
        chunk.mentions = raw_mentions.into_iter().collect();
        self.ingest(chunk)
    }

    /// Ingest a full chunk of tokens and mentions.
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfOrderChunk`] if `base_offset` precedes the previous
    ///   chunk of the same pass
    /// - [`Error::InvalidSpan`] for an empty or inverted range
    /// - [`Error::OverlappingTokens`] if a token overlaps another token of
    ///   the same pass
    /// - [`Error::InvalidInput`] for byte offsets without text, offsets off a
    ///   char boundary or offset overflow
    ///
    /// On error nothing from the chunk is inserted.
    pub fn ingest(&mut self, chunk: RawChunk) -> Result<()> {
        let RawChunk {
            chunk_id,
            base_offset,
            pass,
            offsets,
            text,
            tokens: raw_tokens,
            mentions: raw_mentions,
        } = chunk;

        if let Some(&previous) = self.last_base.get(&pass) {
            if base_offset < previous {
                return Err(Error::OutOfOrderChunk {
                    chunk_id,
                    base_offset,
                    previous,
                });
            }
        }

        let locate = Locator::new(chunk_id, base_offset, offsets, text.as_deref())?;

        let mut mentions = Vec::with_capacity(raw_mentions.len());
        for raw in raw_mentions {
            let span = locate.span(raw.start, raw.end)?;
            let surface_form = if raw.surface_form.trim().is_empty() {
                locate.surface(raw.start, raw.end)?
            } else {
                raw.surface_form
            };
            let mut mention = Mention::new(span, surface_form, raw.kind, chunk_id);
            mention.raw_score = raw.raw_score;
            mentions.push(mention);
        }

        let mut tokens = Vec::with_capacity(raw_tokens.len());
        for raw in raw_tokens {
            let span = locate.span(raw.start, raw.end)?;
            tokens.push(
                TokenAnnotation::new(span, raw.lemma, raw.pos, raw.candidates).with_pass(pass),
            );
        }
        self.check_token_overlaps(pass, &tokens)?;

        // Validated: from here on nothing can fail.
        let accepted = self.token_spans.entry(pass).or_default();
        for token in &tokens {
            accepted.insert(token.span.start(), token.span.end());
        }
        let (mention_count, token_count) = (mentions.len(), tokens.len());
        for mention in mentions {
            self.index.insert(mention.span, Annotation::Mention(mention));
        }
        for token in tokens {
            self.index.insert(token.span, Annotation::Token(token));
        }
        self.last_base.insert(pass, base_offset);
        self.chunks += 1;

        log::debug!(
            "chunk {} (pass {}, base {}): {} mentions, {} tokens",
            chunk_id,
            pass,
            base_offset,
            mention_count,
            token_count
        );
        Ok(())
    }

    /// Ingest several chunks, stopping at the first error.
    ///
    /// Chunks before the failing one stay ingested.
    ///
    /// # Errors
    ///
    /// See [`MentionCollector::ingest`].
    pub fn ingest_all(&mut self, chunks: impl IntoIterator<Item = RawChunk>) -> Result<()> {
        for chunk in chunks {
            self.ingest(chunk)?;
        }
        Ok(())
    }

    fn check_token_overlaps(&self, pass: u32, tokens: &[TokenAnnotation]) -> Result<()> {
        let mut spans: Vec<TextSpan> = tokens.iter().map(|t| t.span).collect();
        spans.sort();

        let mut widest: Option<TextSpan> = None;
        for &span in &spans {
            if let Some(prev) = widest {
                if prev.end() > span.start() {
                    return Err(Error::OverlappingTokens {
                        pass,
                        first: prev,
                        second: span,
                    });
                }
            }
            if widest.map_or(true, |w| span.end() > w.end()) {
                widest = Some(span);
            }
        }

        if let Some(accepted) = self.token_spans.get(&pass) {
            for &span in &spans {
                if let Some((&start, &end)) = accepted.range(..span.end()).next_back() {
                    if end > span.start() {
                        return Err(Error::OverlappingTokens {
                            pass,
                            first: TextSpan::new(start, end)?,
                            second: span,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// The index built so far.
    #[must_use]
    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// Number of chunks accepted.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// End ingestion and hand over the index.
    #[must_use]
    pub fn finish(self) -> DocumentIndex {
        log::info!(
            "collected {} annotations from {} chunks",
            self.index.len(),
            self.chunks
        );
        self.index
    }
}

/// Chunk-local to document offset translation for one chunk.
struct Locator<'a> {
    base: usize,
    text: Option<&'a str>,
    converter: Option<SpanConverter>,
}

impl<'a> Locator<'a> {
    fn new(
        chunk_id: ChunkId,
        base: usize,
        offsets: OffsetUnit,
        text: Option<&'a str>,
    ) -> Result<Self> {
        let converter = match offsets {
            OffsetUnit::Chars => None,
            OffsetUnit::Bytes => {
                let text = text.ok_or_else(|| {
                    Error::invalid_input(format!(
                        "chunk {} uses byte offsets but carries no text",
                        chunk_id
                    ))
                })?;
                Some(SpanConverter::new(text))
            }
        };
        Ok(Self {
            base,
            text,
            converter,
        })
    }

    fn local_chars(&self, start: usize, end: usize) -> Result<(usize, usize)> {
        if start >= end {
            return Err(Error::invalid_span(start, end));
        }
        match &self.converter {
            Some(conv) => conv.bytes_to_chars(start, end),
            None => Ok((start, end)),
        }
    }

    fn span(&self, start: usize, end: usize) -> Result<TextSpan> {
        let (start, end) = self.local_chars(start, end)?;
        TextSpan::new(start, end)?.shifted(self.base)
    }

    fn surface(&self, start: usize, end: usize) -> Result<String> {
        let text = self
            .text
            .ok_or_else(|| Error::invalid_input("mention without surface form or chunk text"))?;
        let (start, end) = self.local_chars(start, end)?;
        let surface = TextSpan::new(start, end)?.extract(text);
        if surface.is_empty() {
            return Err(Error::invalid_input(format!(
                "mention [{}, {}) lies outside the chunk text",
                start, end
            )));
        }
        Ok(surface)
    }
}

// =============================================================================
// Buffered collector
// =============================================================================

/// Buffer-and-sort front end for producers that emit chunks out of order.
///
/// Chunks are held until [`BufferedCollector::finish`], then stably sorted by
/// `base_offset` and fed to a [`MentionCollector`].
#[derive(Debug, Default)]
pub struct BufferedCollector {
    chunks: Vec<RawChunk>,
}

impl BufferedCollector {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a chunk.
    pub fn push(&mut self, chunk: RawChunk) {
        self.chunks.push(chunk);
    }

    /// Number of buffered chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Sort and ingest everything.
    ///
    /// # Errors
    ///
    /// Any ingestion error other than ordering; see [`MentionCollector::ingest`].
    pub fn finish(mut self) -> Result<DocumentIndex> {
        self.chunks.sort_by_key(|c| c.base_offset);
        let mut collector = MentionCollector::new();
        collector.ingest_all(self.chunks)?;
        Ok(collector.finish())
    }
}

impl Extend<RawChunk> for BufferedCollector {
    fn extend<I: IntoIterator<Item = RawChunk>>(&mut self, iter: I) {
        self.chunks.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(start: usize, end: usize, surface: &str) -> RawMention {
        RawMention::new(start, end, surface, EntityKind::Person)
    }

    fn token(start: usize, end: usize, lemma: &str) -> RawToken {
        RawToken::new(start, end, lemma, PartOfSpeech::Verb, vec![GlossCandidate::new(lemma, 1.0)])
    }

    #[test]
    fn test_offsets_are_shifted_by_base() {
        let mut collector = MentionCollector::new();
        collector
            .add_chunk(7, 1000, vec![person(4, 8, "Arya")])
            .unwrap();
        let index = collector.finish();
        let (_, mention) = index.mentions().next().unwrap();
        assert_eq!(mention.span, TextSpan::new(1004, 1008).unwrap());
        assert_eq!(mention.source_chunk_id, 7);
    }

    #[test]
    fn test_out_of_order_chunk_leaves_index_unchanged() {
        let mut collector = MentionCollector::new();
        collector.add_chunk(1, 100, vec![person(0, 3, "Jon")]).unwrap();
        let err = collector
            .add_chunk(2, 50, vec![person(0, 4, "Arya")])
            .unwrap_err();
        assert_eq!(
            err,
            Error::OutOfOrderChunk {
                chunk_id: 2,
                base_offset: 50,
                previous: 100
            }
        );
        assert_eq!(collector.index().len(), 1);
        assert_eq!(collector.chunk_count(), 1);

        // Equal base offsets are allowed.
        collector.add_chunk(3, 100, vec![person(10, 14, "Bran")]).unwrap();
        assert_eq!(collector.index().len(), 2);
    }

    #[test]
    fn test_passes_are_ordered_independently() {
        let mut collector = MentionCollector::new();
        collector
            .ingest(RawChunk::new(1, 500).with_token(token(0, 2, "go")))
            .unwrap();
        collector
            .ingest(RawChunk::new(2, 0).with_pass(1).with_token(token(0, 2, "go")))
            .unwrap();
        assert_eq!(collector.index().len(), 2);
    }

    #[test]
    fn test_invalid_span_is_atomic() {
        let mut collector = MentionCollector::new();
        let err = collector
            .add_chunk(1, 0, vec![person(0, 3, "Jon"), person(5, 5, "")])
            .unwrap_err();
        assert_eq!(err, Error::invalid_span(5, 5));
        assert!(collector.index().is_empty());
    }

    #[test]
    fn test_overlapping_tokens_within_chunk() {
        let mut collector = MentionCollector::new();
        let chunk = RawChunk::new(1, 0)
            .with_token(token(0, 5, "walk"))
            .with_token(token(3, 8, "away"));
        let err = collector.ingest(chunk).unwrap_err();
        assert!(matches!(err, Error::OverlappingTokens { pass: 0, .. }));
        assert!(collector.index().is_empty());
    }

    #[test]
    fn test_overlapping_tokens_across_chunks() {
        let mut collector = MentionCollector::new();
        collector
            .ingest(RawChunk::new(1, 0).with_token(token(0, 5, "walk")))
            .unwrap();
        let err = collector
            .ingest(RawChunk::new(2, 2).with_token(token(0, 2, "al")))
            .unwrap_err();
        assert_eq!(
            err,
            Error::OverlappingTokens {
                pass: 0,
                first: TextSpan::new(0, 5).unwrap(),
                second: TextSpan::new(2, 4).unwrap(),
            }
        );
        // Adjacent is fine.
        collector
            .ingest(RawChunk::new(3, 5).with_token(token(0, 3, "on")))
            .unwrap();
    }

    #[test]
    fn test_byte_offsets_are_converted() {
        let text = "Daenerys paid €50 in Meereen";
        // "Meereen" starts at char 21, byte 23
        let chunk = RawChunk::new(1, 100)
            .with_text(text)
            .with_byte_offsets()
            .with_mention(RawMention::new(23, 30, "", EntityKind::Place));
        let mut collector = MentionCollector::new();
        collector.ingest(chunk).unwrap();
        let index = collector.finish();
        let (_, mention) = index.mentions().next().unwrap();
        assert_eq!(mention.span, TextSpan::new(121, 128).unwrap());
        assert_eq!(mention.surface_form, "Meereen");
    }

    #[test]
    fn test_byte_offsets_without_text_fail() {
        let chunk = RawChunk::new(1, 0)
            .with_byte_offsets()
            .with_mention(person(0, 3, "Jon"));
        let err = MentionCollector::new().ingest(chunk).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_offset_overflow_fails() {
        let err = MentionCollector::new()
            .add_chunk(1, usize::MAX - 1, vec![person(0, 3, "Jon")])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_buffered_collector_sorts() {
        let mut buffer = BufferedCollector::new();
        buffer.push(RawChunk::new(2, 100).with_mention(person(0, 4, "Snow")));
        buffer.push(RawChunk::new(1, 0).with_mention(person(0, 3, "Jon")));
        assert_eq!(buffer.len(), 2);

        let index = buffer.finish().unwrap();
        let chunks: Vec<ChunkId> = index.mentions().map(|(_, m)| m.source_chunk_id).collect();
        assert_eq!(chunks, vec![1, 2]);
    }
}
