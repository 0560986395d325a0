//! Overlap resolution between mention spans.
//!
//! NER passes report nested and crossing mentions ("the [Bank of [Braavos]]").
//! X-Ray needs one entity per stretch of text, so overlapping mentions compete
//! and only winners survive:
//!
//! 1. Longer span wins.
//! 2. Equal length: kind priority Person > Organization > Place > Misc > Other.
//! 3. Still tied: earlier start, then earlier insertion.
//!
//! Candidates are accepted greedily in that order; a candidate is discarded
//! if it overlaps any already accepted span. A span that only overlapped a
//! loser survives.

use glossray_core::{EntryId, Mention};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Result of [`resolve_overlaps`].
#[derive(Debug, Clone, Default)]
pub struct OverlapOutcome<'a> {
    /// Winning mentions, in the input (document) order
    pub survivors: Vec<(EntryId, &'a Mention)>,
    /// Entry ids of the discarded mentions, in the input order
    pub discarded: Vec<EntryId>,
}

/// Compare two mentions by overlap priority. `Less` means `a` wins.
#[must_use]
pub fn priority_order(a: (EntryId, &Mention), b: (EntryId, &Mention)) -> Ordering {
    let (id_a, a) = a;
    let (id_b, b) = b;
    b.span
        .len()
        .cmp(&a.span.len())
        .then_with(|| b.kind.priority().cmp(&a.kind.priority()))
        .then_with(|| a.span.start().cmp(&b.span.start()))
        .then_with(|| id_a.cmp(&id_b))
}

/// Keep a non-overlapping subset of `mentions` chosen by priority.
///
/// `mentions` is expected in document order (as produced by the interval
/// index); the outcome preserves that order.
#[must_use]
pub fn resolve_overlaps<'a>(mentions: &[(EntryId, &'a Mention)]) -> OverlapOutcome<'a> {
    let mut order: Vec<usize> = (0..mentions.len()).collect();
    order.sort_by(|&a, &b| priority_order(mentions[a], mentions[b]));

    // Accepted spans are pairwise disjoint, so the accepted span with the
    // greatest start below `end` is the only one that can reach past `start`.
    let mut accepted: BTreeMap<usize, usize> = BTreeMap::new();
    let mut keep = vec![false; mentions.len()];
    for i in order {
        let span = mentions[i].1.span;
        let blocked = accepted
            .range(..span.end())
            .next_back()
            .is_some_and(|(_, &end)| end > span.start());
        if !blocked {
            accepted.insert(span.start(), span.end());
            keep[i] = true;
        }
    }

    let mut outcome = OverlapOutcome::default();
    for (i, &(id, mention)) in mentions.iter().enumerate() {
        if keep[i] {
            outcome.survivors.push((id, mention));
        } else {
            outcome.discarded.push(id);
        }
    }
    outcome
}
