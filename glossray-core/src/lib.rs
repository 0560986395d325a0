//! # glossray-core
//!
//! Core types for glossray: shared data structures used across all crates.
//!
//! This crate provides:
//! - **Spans**: [`TextSpan`], the non-empty half-open offset range
//! - **X-Ray types**: [`EntityKind`], [`Mention`], [`MentionRef`], [`Entity`]
//! - **Word-Wise types**: [`TokenAnnotation`], [`GlossCandidate`], [`PartOfSpeech`]
//! - **Interval index**: [`IntervalIndex`] and the per-document [`DocumentIndex`]
//!
//! All other crates in the glossray workspace depend on `glossray-core` so the
//! collector, resolver and projector agree on one representation.

#![warn(missing_docs)]

pub mod entity;
pub mod error;
pub mod index;
pub mod span;
pub mod token;

/// Identifier of an input chunk (usually one chapter).
pub type ChunkId = u64;

/// Identifier of a resolved entity. Assigned from 1 in creation order.
pub type EntityId = u64;

/// Identifier of an entry in an [`IntervalIndex`] (its insertion sequence number).
pub type EntryId = usize;

// Re-exports for convenience
pub use entity::{Entity, EntityKind, Mention, MentionRef};
pub use error::{Error, Result};
pub use index::{Annotation, DocumentIndex, Entry, IntervalIndex, Iter};
pub use span::TextSpan;
pub use token::{GlossCandidate, PartOfSpeech, TokenAnnotation};
