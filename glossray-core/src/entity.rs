//! Named-entity mentions and the entities they resolve to (the X-Ray layer).

use crate::span::TextSpan;
use crate::{ChunkId, EntityId, EntryId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// Entity Kind
// =============================================================================

/// Coarse entity classification used by X-Ray.
///
/// Only the tag matters; every kind is processed the same way except for
/// [`EntityKind::priority`], which breaks ties between overlapping mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKind {
    /// People and characters (PER)
    Person,
    /// Geographic and geo-political places (LOC, GPE, FAC)
    Place,
    /// Companies, institutions, houses, armies (ORG)
    Organization,
    /// Named things that are none of the above (MISC, NORP, EVENT, ...)
    Misc,
    /// Anything the upstream model labelled with an unknown tag
    Other,
}

impl EntityKind {
    /// All kinds, highest overlap priority first.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Person,
        EntityKind::Organization,
        EntityKind::Place,
        EntityKind::Misc,
        EntityKind::Other,
    ];

    /// Overlap priority: Person > Organization > Place > Misc > Other.
    ///
    /// Higher wins when two mentions of equal length cover overlapping text.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            EntityKind::Person => 4,
            EntityKind::Organization => 3,
            EntityKind::Place => 2,
            EntityKind::Misc => 1,
            EntityKind::Other => 0,
        }
    }

    /// Short label.
    #[must_use]
    pub const fn as_label(self) -> &'static str {
        match self {
            EntityKind::Person => "PER",
            EntityKind::Place => "LOC",
            EntityKind::Organization => "ORG",
            EntityKind::Misc => "MISC",
            EntityKind::Other => "OTHER",
        }
    }

    /// Parse an upstream NER label (CoNLL, OntoNotes/spaCy, or BIO-prefixed).
    ///
    /// Unknown labels map to [`EntityKind::Other`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let upper = label.trim().to_uppercase();
        let bare = upper
            .strip_prefix("B-")
            .or_else(|| upper.strip_prefix("I-"))
            .unwrap_or(&upper);
        match bare {
            "PER" | "PERSON" => EntityKind::Person,
            "LOC" | "LOCATION" | "GPE" | "FAC" | "PLACE" => EntityKind::Place,
            "ORG" | "ORGANIZATION" | "ORGANISATION" => EntityKind::Organization,
            "MISC" | "NORP" | "EVENT" | "WORK_OF_ART" | "PRODUCT" | "LAW" | "LANGUAGE" => {
                EntityKind::Misc
            }
            _ => EntityKind::Other,
        }
    }
}

impl From<String> for EntityKind {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.as_label().to_string()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

// =============================================================================
// Mention
// =============================================================================

/// One occurrence of a named entity in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    /// Document-wide span
    pub span: TextSpan,
    /// Text as it appears in the book
    pub surface_form: String,
    /// Kind assigned by the upstream model
    pub kind: EntityKind,
    /// Chunk the mention was reported in
    pub source_chunk_id: ChunkId,
    /// Upstream model score, when the model reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_score: Option<f64>,
}

impl Mention {
    /// Create a mention without a model score.
    #[must_use]
    pub fn new(
        span: TextSpan,
        surface_form: impl Into<String>,
        kind: EntityKind,
        source_chunk_id: ChunkId,
    ) -> Self {
        Self {
            span,
            surface_form: surface_form.into(),
            kind,
            source_chunk_id,
            raw_score: None,
        }
    }

    /// Attach the upstream model score.
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.raw_score = Some(score);
        self
    }
}

/// Handle from an [`Entity`] to a mention stored in the interval index.
///
/// The span is cached so ordering and ranking do not need the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MentionRef {
    /// Entry id of the mention in the index
    pub entry: EntryId,
    /// Span of the mention
    pub span: TextSpan,
}

// =============================================================================
// Entity
// =============================================================================

/// A canonical referent aggregating one or more mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Assigned in creation order, stable for one pass
    pub id: EntityId,
    /// Display name
    pub canonical_name: String,
    /// Kind after majority vote across mentions
    pub kind: EntityKind,
    /// Mentions ordered by span start
    pub mentions: Vec<MentionRef>,
    /// Other surface forms seen for this entity
    pub aliases: BTreeSet<String>,
    /// Summary from the description source, if one was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity {
    /// Create an entity with no mentions yet.
    #[must_use]
    pub fn new(id: EntityId, canonical_name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id,
            canonical_name: canonical_name.into(),
            kind,
            mentions: Vec::new(),
            aliases: BTreeSet::new(),
            description: None,
        }
    }

    /// Number of mentions attached to this entity.
    #[must_use]
    pub fn mention_count(&self) -> usize {
        self.mentions.len()
    }

    /// Span of the earliest mention.
    #[must_use]
    pub fn first_occurrence(&self) -> Option<TextSpan> {
        self.mentions.first().map(|m| m.span)
    }

    /// Add a surface form to the alias set unless it is the canonical name.
    pub fn add_alias(&mut self, surface: &str) {
        if surface != self.canonical_name && !self.aliases.contains(surface) {
            self.aliases.insert(surface.to_string());
        }
    }
}
