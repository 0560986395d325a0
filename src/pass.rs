//! One export pass over a book.
//!
//! ```text
//! RawChunk* ──MentionCollector──► DocumentIndex ──┬── Resolver ──────► Resolution
//!                                                 └── GlossSelector ─► GlossSelection
//!                                                           │
//!                                  PassOutput::projection() ◄┘
//! ```
//!
//! After collection the index is read-only, so resolution and gloss
//! selection run side by side on the rayon pool. Nothing is returned until
//! both have finished; a failed pass produces no partial output.

use crate::collector::{MentionCollector, RawChunk};
use crate::config::EngineConfig;
use crate::export::{project, ExportBundle, Projection};
use crate::gloss::{Disambiguation, GlossSelection, GlossSelector};
use crate::Result;
use glossray_coalesce::{DescriptionSource, Resolution, Resolver};
use glossray_core::{DocumentIndex, TextSpan};
use std::collections::HashMap;

/// Resolver and selector settings for a pass.
#[derive(Debug, Clone, Default)]
pub struct AnnotationPass {
    resolver: Resolver,
    selector: GlossSelector,
}

impl AnnotationPass {
    /// Create a pass from its two stages.
    #[must_use]
    pub fn new(resolver: Resolver, selector: GlossSelector) -> Self {
        Self { resolver, selector }
    }

    /// Create a pass from configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.build_resolver(), config.build_selector())
    }

    /// The entity resolver.
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// The gloss selector.
    #[must_use]
    pub fn selector(&self) -> &GlossSelector {
        &self.selector
    }

    /// Resolve entities and select glosses over a finished index.
    #[must_use]
    pub fn run(
        &self,
        index: DocumentIndex,
        descriptions: Option<&dyn DescriptionSource>,
        disambiguations: &HashMap<TextSpan, Disambiguation>,
    ) -> PassOutput {
        let (resolution, selection) = rayon::join(
            || self.resolver.resolve_with(&index, descriptions),
            || self.selector.select_all(&index, disambiguations),
        );
        PassOutput {
            index,
            resolution,
            selection,
        }
    }

    /// Collect chunks, then [`AnnotationPass::run`].
    ///
    /// # Errors
    ///
    /// The first ingestion error; see [`MentionCollector::ingest`].
    pub fn run_chunks(
        &self,
        chunks: impl IntoIterator<Item = RawChunk>,
        descriptions: Option<&dyn DescriptionSource>,
        disambiguations: &HashMap<TextSpan, Disambiguation>,
    ) -> Result<PassOutput> {
        let mut collector = MentionCollector::new();
        collector.ingest_all(chunks)?;
        Ok(self.run(collector.finish(), descriptions, disambiguations))
    }
}

/// Everything one pass produced.
#[derive(Debug, Clone)]
pub struct PassOutput {
    /// The collected index
    pub index: DocumentIndex,
    /// X-Ray entities
    pub resolution: Resolution,
    /// Word-Wise glosses
    pub selection: GlossSelection,
}

impl PassOutput {
    /// Export view over this output.
    #[must_use]
    pub fn projection(&self) -> Projection<'_> {
        project(&self.index, &self.resolution, &self.selection)
    }

    /// Materialized export.
    #[must_use]
    pub fn bundle(&self) -> ExportBundle {
        self.projection().bundle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{RawMention, RawToken};
    use glossray_core::{EntityKind, GlossCandidate, PartOfSpeech};

    #[test]
    fn test_run_chunks() {
        let chunks = vec![
            RawChunk::new(1, 0)
                .with_mention(RawMention::new(0, 4, "Arya", EntityKind::Person))
                .with_token(RawToken::new(
                    5,
                    10,
                    "flee",
                    PartOfSpeech::Verb,
                    vec![GlossCandidate::new("run away", 0.8)],
                )),
            RawChunk::new(2, 100).with_mention(RawMention::new(0, 4, "Arya", EntityKind::Person)),
        ];
        let output = AnnotationPass::default()
            .run_chunks(chunks, None, &HashMap::new())
            .unwrap();

        assert_eq!(output.resolution.len(), 1);
        assert_eq!(output.resolution.entities()[0].mention_count(), 2);
        assert_eq!(output.selection.len(), 1);

        let bundle = output.bundle();
        assert_eq!(bundle.xray.len(), 2);
        assert_eq!(bundle.word_wise[0].gloss, "run away");
    }

    #[test]
    fn test_failed_ingestion_produces_nothing() {
        let chunks = vec![RawChunk::new(1, 100), RawChunk::new(2, 0)];
        let result = AnnotationPass::default().run_chunks(chunks, None, &HashMap::new());
        assert!(result.is_err());
    }
}
