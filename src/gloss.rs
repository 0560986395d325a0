//! Word-Wise gloss selection.
//!
//! Each token carries ranked gloss candidates from the upstream lexicon
//! lookup. The selector picks one per token:
//!
//! 1. With a word-sense disambiguation result whose score reaches the
//!    threshold, the best candidate matching that sense.
//! 2. Otherwise the best candidate by score; ties keep upstream order.
//!
//! Candidates harder than the configured difficulty limit are never picked.
//! A token left without candidates is skipped, not fatal.
//!
//! # Multiple passes
//!
//! [`GlossSelector::select_all`] first reconciles tokens from different
//! passes: identical spans merge their candidate lists, and where spans from
//! different passes partially overlap, the lower pass wins.

use crate::{Error, Result};
use glossray_core::{DocumentIndex, EntryId, GlossCandidate, TextSpan, TokenAnnotation};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

/// Output of an external word-sense disambiguation model for one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disambiguation {
    /// Chosen sense id (or gloss text when the lexicon has no sense ids)
    pub sense: String,
    /// Model confidence
    #[serde(default = "full_confidence")]
    pub score: f64,
}

fn full_confidence() -> f64 {
    1.0
}

impl Disambiguation {
    /// Create a disambiguation result.
    #[must_use]
    pub fn new(sense: impl Into<String>, score: f64) -> Self {
        Self {
            sense: sense.into(),
            score,
        }
    }
}

/// Chooses one gloss per token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlossSelector {
    /// Minimum disambiguation score to trust
    #[serde(default)]
    pub wsd_threshold: f64,
    /// Highest candidate difficulty allowed
    #[serde(default)]
    pub difficulty_limit: Option<u8>,
}

impl Default for GlossSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl GlossSelector {
    /// Selector that trusts every disambiguation and allows every difficulty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            wsd_threshold: 0.0,
            difficulty_limit: None,
        }
    }

    /// Set the disambiguation threshold.
    #[must_use]
    pub fn with_wsd_threshold(mut self, threshold: f64) -> Self {
        self.wsd_threshold = threshold;
        self
    }

    /// Drop candidates with a difficulty above `limit`.
    #[must_use]
    pub fn with_difficulty_limit(mut self, limit: Option<u8>) -> Self {
        self.difficulty_limit = limit;
        self
    }

    /// Pick the gloss for one token.
    ///
    /// # Errors
    ///
    /// [`Error::NoGlossAvailable`] if no candidate survives filtering.
    ///
    /// # Example
    ///
    /// ```
    /// use glossray::gloss::{Disambiguation, GlossSelector};
    /// use glossray::{GlossCandidate, PartOfSpeech, TextSpan, TokenAnnotation};
    ///
    /// let token = TokenAnnotation::new(
    ///     TextSpan::new(0, 4)?,
    ///     "quit",
    ///     PartOfSpeech::Verb,
    ///     vec![GlossCandidate::new("go", 0.4), GlossCandidate::new("leave", 0.9)],
    /// );
    /// let selector = GlossSelector::new();
    /// assert_eq!(selector.select_gloss(&token, None)?.text, "leave");
    ///
    /// let wsd = Disambiguation::new("go", 0.8);
    /// assert_eq!(selector.select_gloss(&token, Some(&wsd))?.text, "go");
    /// # Ok::<(), glossray::Error>(())
    /// ```
    pub fn select_gloss(
        &self,
        token: &TokenAnnotation,
        disambiguation: Option<&Disambiguation>,
    ) -> Result<GlossCandidate> {
        self.select_from(token.span, &token.candidates, disambiguation)
    }

    fn select_from(
        &self,
        span: TextSpan,
        candidates: &[GlossCandidate],
        disambiguation: Option<&Disambiguation>,
    ) -> Result<GlossCandidate> {
        let usable = || candidates.iter().filter(|c| self.usable(c));

        if let Some(wsd) = disambiguation.filter(|d| d.score >= self.wsd_threshold) {
            if let Some(best) = best_by_score(usable().filter(|c| c.matches_sense(&wsd.sense))) {
                return Ok(best.clone());
            }
            log::debug!("no candidate at {} matches sense {:?}", span, wsd.sense);
        }

        best_by_score(usable())
            .cloned()
            .ok_or(Error::NoGlossAvailable { span })
    }

    fn usable(&self, candidate: &GlossCandidate) -> bool {
        if candidate.score.is_nan() {
            return false;
        }
        match (self.difficulty_limit, candidate.difficulty) {
            (Some(limit), Some(difficulty)) => difficulty <= limit,
            _ => true,
        }
    }

    /// Reconcile passes and pick a gloss for every remaining token.
    ///
    /// `disambiguations` is keyed by token span.
    #[must_use]
    pub fn select_all(
        &self,
        index: &DocumentIndex,
        disambiguations: &HashMap<TextSpan, Disambiguation>,
    ) -> GlossSelection {
        let reconciled = reconcile(index);
        let mut selection = GlossSelection {
            stats: GlossStats {
                tokens: reconciled.tokens.len(),
                merged: reconciled.merged,
                dropped_conflicts: reconciled.dropped_conflicts,
                ..GlossStats::default()
            },
            ..GlossSelection::default()
        };

        for token in reconciled.tokens {
            let wsd = disambiguations.get(&token.span);
            match self.select_from(token.span, &token.candidates, wsd) {
                Ok(gloss) => {
                    selection
                        .by_entry
                        .insert(token.entry, selection.selected.len());
                    selection.selected.push(SelectedGloss {
                        entry: token.entry,
                        span: token.span,
                        gloss,
                    });
                }
                Err(err) => {
                    log::debug!("skipping token: {}", err);
                    selection.stats.skipped += 1;
                }
            }
        }
        selection.stats.selected = selection.selected.len();

        log::info!(
            "selected {} glosses ({} skipped, {} merged, {} cross-pass conflicts)",
            selection.stats.selected,
            selection.stats.skipped,
            selection.stats.merged,
            selection.stats.dropped_conflicts
        );
        selection
    }
}

/// Highest score; the first of equal scores wins.
fn best_by_score<'a>(candidates: impl Iterator<Item = &'a GlossCandidate>) -> Option<&'a GlossCandidate> {
    let mut best: Option<&GlossCandidate> = None;
    for candidate in candidates {
        if best.map_or(true, |b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }
    best
}

// =============================================================================
// Pass reconciliation
// =============================================================================

/// A token after cross-pass reconciliation.
#[derive(Debug, Clone)]
pub struct ReconciledToken<'a> {
    /// Entry id of the representative (lowest pass) token
    pub entry: EntryId,
    /// Span
    pub span: TextSpan,
    /// Lowest pass that produced this span
    pub pass: u32,
    /// Candidates, merged across passes for identical spans
    pub candidates: Cow<'a, [GlossCandidate]>,
}

/// Tokens of an index reduced to one per span, without cross-pass overlaps.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation<'a> {
    /// Surviving tokens in document order
    pub tokens: Vec<ReconciledToken<'a>>,
    /// Tokens folded into an identical span from a lower pass
    pub merged: usize,
    /// Tokens dropped for partially overlapping a lower pass
    pub dropped_conflicts: usize,
}

/// Merge identical spans and resolve partial overlaps between passes.
#[must_use]
pub fn reconcile(index: &DocumentIndex) -> Reconciliation<'_> {
    let mut by_span: BTreeMap<TextSpan, Vec<(EntryId, &TokenAnnotation)>> = BTreeMap::new();
    for (entry, token) in index.tokens() {
        by_span.entry(token.span).or_default().push((entry, token));
    }

    let mut result = Reconciliation::default();
    let mut merged_tokens: Vec<ReconciledToken<'_>> = Vec::with_capacity(by_span.len());
    for (span, mut group) in by_span {
        group.sort_by_key(|(entry, token)| (token.pass, *entry));
        let (entry, first) = group[0];
        let candidates = if group.len() == 1 {
            Cow::Borrowed(first.candidates.as_slice())
        } else {
            result.merged += group.len() - 1;
            Cow::Owned(merge_candidates(group.iter().map(|(_, t)| *t)))
        };
        merged_tokens.push(ReconciledToken {
            entry,
            span,
            pass: first.pass,
            candidates,
        });
    }

    // Lower pass first; within a pass spans are already disjoint.
    let mut order: Vec<usize> = (0..merged_tokens.len()).collect();
    order.sort_by_key(|&i| (merged_tokens[i].pass, merged_tokens[i].span));

    let mut accepted: BTreeMap<usize, usize> = BTreeMap::new();
    let mut keep = vec![false; merged_tokens.len()];
    for i in order {
        let span = merged_tokens[i].span;
        let blocked = accepted
            .range(..span.end())
            .next_back()
            .is_some_and(|(_, &end)| end > span.start());
        if blocked {
            result.dropped_conflicts += 1;
        } else {
            accepted.insert(span.start(), span.end());
            keep[i] = true;
        }
    }

    result.tokens = merged_tokens
        .into_iter()
        .zip(keep)
        .filter_map(|(token, keep)| keep.then_some(token))
        .collect();
    result
}

/// Concatenate candidate lists; a repeated gloss text keeps its first
/// position and its highest score.
fn merge_candidates<'a>(tokens: impl Iterator<Item = &'a TokenAnnotation>) -> Vec<GlossCandidate> {
    let mut merged: Vec<GlossCandidate> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();
    for candidate in tokens.flat_map(|t| t.candidates.iter()) {
        match position.get(&candidate.text) {
            Some(&i) => {
                if candidate.score > merged[i].score {
                    merged[i] = candidate.clone();
                }
            }
            None => {
                position.insert(candidate.text.clone(), merged.len());
                merged.push(candidate.clone());
            }
        }
    }
    merged
}

// =============================================================================
// Selection result
// =============================================================================

/// The gloss chosen for one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedGloss {
    /// Entry id of the token in the index
    pub entry: EntryId,
    /// Token span
    pub span: TextSpan,
    /// Chosen candidate
    pub gloss: GlossCandidate,
}

/// Counters for one [`GlossSelector::select_all`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossStats {
    /// Tokens left after reconciliation
    pub tokens: usize,
    /// Tokens that received a gloss
    pub selected: usize,
    /// Tokens without a usable candidate
    pub skipped: usize,
    /// Tokens merged into an identical span of a lower pass
    pub merged: usize,
    /// Tokens dropped for overlapping a lower pass
    pub dropped_conflicts: usize,
}

/// Glosses for every token that resolved one, in document order.
#[derive(Debug, Clone, Default)]
pub struct GlossSelection {
    selected: Vec<SelectedGloss>,
    by_entry: HashMap<EntryId, usize>,
    stats: GlossStats,
}

impl GlossSelection {
    /// Selected glosses ordered by span start.
    #[must_use]
    pub fn selected(&self) -> &[SelectedGloss] {
        &self.selected
    }

    /// Gloss chosen for a token entry. `None` for skipped, merged or dropped
    /// tokens.
    #[must_use]
    pub fn get(&self, entry: EntryId) -> Option<&SelectedGloss> {
        self.by_entry.get(&entry).map(|&i| &self.selected[i])
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> GlossStats {
        self.stats
    }

    /// Number of selected glosses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether no gloss was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
