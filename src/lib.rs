//! # glossray
//!
//! Position-indexed annotation engine for e-book Word-Wise and X-Ray data.
//!
//! An external NLP pipeline reports tokens and named-entity mentions chunk by
//! chunk. glossray stores them in one interval index per book and derives
//! two layers from it:
//!
//! - **Word-Wise**: for every token, the best simplified gloss in context
//! - **X-Ray**: for every mention, the canonical entity it refers to, with
//!   surface variants merged and entities ranked by mention count
//!
//! ## Pipeline
//!
//! ```text
//! RawChunk ─► collector ─► DocumentIndex ─┬─► glossray_coalesce::Resolver ─► Resolution
//!                                         └─► gloss::GlossSelector ───────► GlossSelection
//!                                                          │
//!                                   export::project ◄──────┘
//!                                     ├─ word_wise(): (span, gloss)
//!                                     └─ xray():      (span, entity_id) + entity table
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use glossray::collector::{RawChunk, RawMention};
//! use glossray::pass::AnnotationPass;
//! use glossray::{EngineConfig, EntityKind};
//! use std::collections::HashMap;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     [[aliases]]
//!     canonical = "Jon Snow"
//!     aliases = ["Jon", "Snow"]
//! "#)?;
//!
//! let chunks = vec![
//!     RawChunk::new(1, 0)
//!         .with_mention(RawMention::new(0, 3, "Jon", EntityKind::Person))
//!         .with_mention(RawMention::new(20, 28, "Jon Snow", EntityKind::Person)),
//!     RawChunk::new(2, 1000)
//!         .with_mention(RawMention::new(5, 9, "Snow", EntityKind::Person)),
//! ];
//!
//! let output = AnnotationPass::from_config(&config).run_chunks(chunks, None, &HashMap::new())?;
//! let bundle = output.bundle();
//! assert_eq!(bundle.entities.len(), 1);
//! assert_eq!(bundle.entities[0].mention_count, 3);
//! # Ok::<(), glossray::Error>(())
//! ```
//!
//! ## Crates
//!
//! | Crate | Contents |
//! |-------|----------|
//! | `glossray-core` | spans, entities, tokens, interval index, errors |
//! | `glossray-coalesce` | overlap resolution, alias grouping, ranking |
//! | `glossray` | ingestion, gloss selection, export, configuration |

#![warn(missing_docs)]

pub mod collector;
pub mod config;
pub mod export;
pub mod gloss;
pub mod offset;
pub mod pass;

pub use glossray_core::index;

pub use collector::{BufferedCollector, MentionCollector, OffsetUnit, RawChunk, RawMention, RawToken};
pub use config::EngineConfig;
pub use export::{project, EntityRecord, ExportBundle, Projection, WordWiseEntry, XRayEntry};
pub use gloss::{Disambiguation, GlossSelection, GlossSelector};
pub use glossray_coalesce::{AliasClass, AliasTable, DescriptionSource, Resolution, Resolver};
pub use glossray_core::{
    Annotation, ChunkId, DocumentIndex, Entity, EntityId, EntityKind, EntryId, Error,
    GlossCandidate, IntervalIndex, Mention, MentionRef, PartOfSpeech, Result, TextSpan,
    TokenAnnotation,
};
pub use pass::{AnnotationPass, PassOutput};
