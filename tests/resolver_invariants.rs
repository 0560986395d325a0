//! Invariant tests for entity resolution.
//!
//! These hold for any mention set: partition of surviving mentions,
//! non-overlapping survivors, deterministic ids and a well-ordered ranking.


use fuzz_strategies::mention_index_strategy;
use glossray::{AliasTable, DocumentIndex, EntityId, Resolution, Resolver};
use proptest::prelude::*;
use std::collections::HashMap;

fn resolver() -> Resolver {
    Resolver::with_aliases(
        AliasTable::new()
            .with_class("Jon Snow", ["Jon", "Snow"])
            .with_class("Arya Stark", ["Arya"]),
    )
}

fn surviving_spans(index: &DocumentIndex, resolution: &Resolution) -> Vec<(usize, usize)> {
    index
        .mentions()
        .filter(|(entry, _)| resolution.entity_of(*entry).is_some())
        .map(|(_, m)| (m.span.start(), m.span.end()))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn surviving_mentions_are_partitioned(index in mention_index_strategy(80)) {
        let resolution = resolver().resolve(&index);
        let stats = resolution.stats();

        let total: usize = resolution.entities().iter().map(|e| e.mention_count()).sum();
        prop_assert_eq!(total, stats.surviving_mentions);
        prop_assert_eq!(
            stats.surviving_mentions + stats.discarded_overlaps + stats.pruned_mentions,
            stats.total_mentions
        );

        let mut owner: HashMap<usize, EntityId> = HashMap::new();
        for entity in resolution.entities() {
            prop_assert!(entity.mention_count() > 0);
            for mention in &entity.mentions {
                prop_assert!(owner.insert(mention.entry, entity.id).is_none());
                prop_assert_eq!(resolution.entity_of(mention.entry), Some(entity.id));
            }
            prop_assert!(entity.mentions.windows(2).all(|w| w[0].span.start() <= w[1].span.start()));
        }
    }

    #[test]
    fn survivors_never_overlap(index in mention_index_strategy(80)) {
        let resolution = resolver().resolve(&index);
        let spans = surviving_spans(&index, &resolution);
        prop_assert!(spans.windows(2).all(|w| w[0].1 <= w[1].0), "overlap in {:?}", spans);
    }

    #[test]
    fn resolution_is_deterministic(index in mention_index_strategy(60)) {
        let first = resolver().resolve(&index);
        let second = resolver().resolve(&index);
        prop_assert_eq!(first.entities(), second.entities());
        prop_assert_eq!(first.ranking(), second.ranking());
    }

    #[test]
    fn ids_are_dense_and_ranking_is_ordered(index in mention_index_strategy(60)) {
        let resolution = resolver().resolve(&index);

        let ids: Vec<EntityId> = resolution.entities().iter().map(|e| e.id).collect();
        let expected: Vec<EntityId> = (1..=ids.len() as EntityId).collect();
        prop_assert_eq!(ids, expected);

        let ranked: Vec<(usize, usize)> = resolution
            .ranked()
            .map(|e| (e.mention_count(), e.first_occurrence().map_or(0, |s| s.start())))
            .collect();
        prop_assert_eq!(ranked.len(), resolution.len());
        for w in ranked.windows(2) {
            prop_assert!(w[0].0 > w[1].0 || (w[0].0 == w[1].0 && w[0].1 <= w[1].1));
        }
    }

    #[test]
    fn pruning_only_removes(index in mention_index_strategy(60), min in 1usize..4) {
        let all = resolver().resolve(&index);
        let pruned = resolver().with_min_mention_count(min).resolve(&index);

        prop_assert!(pruned.len() <= all.len());
        for entity in pruned.entities() {
            prop_assert!(entity.mention_count() >= min);
            prop_assert_eq!(all.entity(entity.id), Some(entity));
        }
    }
}

#[test]
fn overlap_tie_breaks() {
    use glossray::{Annotation, EntityKind, Mention, TextSpan};

    let mut index = DocumentIndex::new();
    let mut add = |start, end, kind| {
        let span = TextSpan::new(start, end).unwrap();
        index.insert(span, Annotation::Mention(Mention::new(span, "Braavos", kind, 0)));
    };
    add(0, 10, EntityKind::Place);
    add(2, 6, EntityKind::Person);
    add(20, 25, EntityKind::Organization);
    add(20, 25, EntityKind::Person);

    let resolution = Resolver::new().resolve(&index);
    let kinds: Vec<(usize, EntityKind)> = index
        .mentions()
        .filter(|(entry, _)| resolution.entity_of(*entry).is_some())
        .map(|(_, m)| (m.span.start(), m.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![(0, EntityKind::Place), (20, EntityKind::Person)]
    );
    assert_eq!(resolution.stats().discarded_overlaps, 2);
}
