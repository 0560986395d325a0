//! Export projection of the Word-Wise and X-Ray layers.
//!
//! The projector walks the read-only index once per stream, in span order,
//! and joins each entry with the resolver's and selector's results. The
//! streams borrow everything and allocate nothing up front; an external
//! writer turns them into the reader's database format.
//!
//! ```text
//! DocumentIndex ──all()──► Token   ──GlossSelection──► WordWiseEntry {span, gloss}
//!                     └──► Mention ──Resolution──────► XRayEntry {span, entity_id}
//! ```
//!
//! Both streams are restartable: every call to `iter()` starts from the
//! beginning of the document.

use crate::gloss::GlossSelection;
use glossray_coalesce::Resolution;
use glossray_core::{Annotation, DocumentIndex, Entity, EntityId, EntityKind, TextSpan};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::iter::FusedIterator;

/// One Word-Wise hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordWiseEntry {
    /// Token span
    pub span: TextSpan,
    /// Gloss shown above the token
    pub gloss: String,
}

/// One X-Ray occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XRayEntry {
    /// Mention span
    pub span: TextSpan,
    /// Entity the mention resolved to
    pub entity_id: EntityId,
}

/// Row of the X-Ray entity table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity id
    pub id: EntityId,
    /// Display name
    pub canonical_name: String,
    /// Kind after majority vote
    pub kind: EntityKind,
    /// Number of surviving mentions
    pub mention_count: usize,
    /// Other surface forms
    pub aliases: BTreeSet<String>,
    /// Summary, if the description source had one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Entity> for EntityRecord {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            canonical_name: entity.canonical_name.clone(),
            kind: entity.kind,
            mention_count: entity.mention_count(),
            aliases: entity.aliases.clone(),
            description: entity.description.clone(),
        }
    }
}

/// Build the export view over a finished pass.
#[must_use]
pub fn project<'a>(
    index: &'a DocumentIndex,
    resolution: &'a Resolution,
    selection: &'a GlossSelection,
) -> Projection<'a> {
    Projection {
        index,
        resolution,
        selection,
    }
}

/// Borrowed view joining the index with resolution and gloss selection.
#[derive(Debug, Clone, Copy)]
pub struct Projection<'a> {
    index: &'a DocumentIndex,
    resolution: &'a Resolution,
    selection: &'a GlossSelection,
}

impl<'a> Projection<'a> {
    /// Word-Wise stream.
    #[must_use]
    pub fn word_wise(&self) -> WordWiseStream<'a> {
        WordWiseStream {
            index: self.index,
            selection: self.selection,
        }
    }

    /// X-Ray stream.
    #[must_use]
    pub fn xray(&self) -> XRayStream<'a> {
        XRayStream {
            index: self.index,
            resolution: self.resolution,
        }
    }

    /// Materialize both streams and the entity table.
    #[must_use]
    pub fn bundle(&self) -> ExportBundle {
        let xray = self.xray();
        ExportBundle {
            word_wise: self.word_wise().iter().collect(),
            xray: xray.iter().collect(),
            entities: xray.entities().collect(),
            ranking: self.resolution.ranking().to_vec(),
        }
    }
}

// =============================================================================
// Word-Wise
// =============================================================================

/// Restartable stream of Word-Wise hints.
#[derive(Debug, Clone, Copy)]
pub struct WordWiseStream<'a> {
    index: &'a DocumentIndex,
    selection: &'a GlossSelection,
}

impl<'a> WordWiseStream<'a> {
    /// Iterate from the start of the document.
    #[must_use]
    pub fn iter(&self) -> WordWiseIter<'a> {
        WordWiseIter {
            inner: self.index.all(),
            selection: self.selection,
        }
    }
}

impl<'a> IntoIterator for &WordWiseStream<'a> {
    type Item = WordWiseEntry;
    type IntoIter = WordWiseIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over [`WordWiseEntry`] in span order.
#[derive(Debug)]
pub struct WordWiseIter<'a> {
    inner: glossray_core::Iter<'a, Annotation>,
    selection: &'a GlossSelection,
}

impl Iterator for WordWiseIter<'_> {
    type Item = WordWiseEntry;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.inner.by_ref() {
            if !matches!(entry.value, Annotation::Token(_)) {
                continue;
            }
            if let Some(selected) = self.selection.get(entry.id) {
                return Some(WordWiseEntry {
                    span: entry.span,
                    gloss: selected.gloss.text.clone(),
                });
            }
        }
        None
    }
}

impl FusedIterator for WordWiseIter<'_> {}

// =============================================================================
// X-Ray
// =============================================================================

/// Restartable stream of X-Ray occurrences plus the entity table.
#[derive(Debug, Clone, Copy)]
pub struct XRayStream<'a> {
    index: &'a DocumentIndex,
    resolution: &'a Resolution,
}

impl<'a> XRayStream<'a> {
    /// Iterate occurrences from the start of the document.
    #[must_use]
    pub fn iter(&self) -> XRayIter<'a> {
        XRayIter {
            inner: self.index.all(),
            resolution: self.resolution,
        }
    }

    /// Entity table ordered by id.
    pub fn entities(&self) -> impl Iterator<Item = EntityRecord> + 'a {
        self.resolution.entities().iter().map(EntityRecord::from)
    }

    /// Record for one entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<EntityRecord> {
        self.resolution.entity(id).map(EntityRecord::from)
    }
}

impl<'a> IntoIterator for &XRayStream<'a> {
    type Item = XRayEntry;
    type IntoIter = XRayIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over [`XRayEntry`] in span order.
#[derive(Debug)]
pub struct XRayIter<'a> {
    inner: glossray_core::Iter<'a, Annotation>,
    resolution: &'a Resolution,
}

impl Iterator for XRayIter<'_> {
    type Item = XRayEntry;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.inner.by_ref() {
            if !matches!(entry.value, Annotation::Mention(_)) {
                continue;
            }
            if let Some(entity_id) = self.resolution.entity_of(entry.id) {
                return Some(XRayEntry {
                    span: entry.span,
                    entity_id,
                });
            }
        }
        None
    }
}

impl FusedIterator for XRayIter<'_> {}

// =============================================================================
// Bundle
// =============================================================================

/// Fully materialized export, ready to hand to a writer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    /// Word-Wise hints in span order
    pub word_wise: Vec<WordWiseEntry>,
    /// X-Ray occurrences in span order
    pub xray: Vec<XRayEntry>,
    /// Entity table ordered by id
    pub entities: Vec<EntityRecord>,
    /// Entity ids by importance
    pub ranking: Vec<EntityId>,
}
