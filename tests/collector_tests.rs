//! Ingestion tests: ordering, validation, atomicity and the JSON wire shape.


use fuzz_strategies::chunk_strategy;
use glossray::collector::{BufferedCollector, MentionCollector, RawChunk, RawMention, RawToken};
use glossray::{EntityKind, Error, GlossCandidate, PartOfSpeech, TextSpan};
use proptest::prelude::*;

fn snapshot(collector: &MentionCollector) -> Vec<(usize, usize, usize)> {
    collector
        .index()
        .all()
        .map(|e| (e.id, e.span.start(), e.span.end()))
        .collect()
}

#[test]
fn chunk_from_json() {
    let json = r#"{
        "chunk_id": 4,
        "base_offset": 1200,
        "pass": 0,
        "tokens": [
            {"start": 4, "end": 8, "lemma": "flee", "pos": "VERB",
             "candidates": [{"text": "run away", "score": 0.8}]}
        ],
        "mentions": [
            {"start": 0, "end": 3, "surface_form": "Jon", "kind": "PERSON", "raw_score": 0.93}
        ]
    }"#;
    let chunk: RawChunk = serde_json::from_str(json).unwrap();
    let mut collector = MentionCollector::new();
    collector.ingest(chunk).unwrap();
    let index = collector.finish();

    let (_, mention) = index.mentions().next().unwrap();
    assert_eq!(mention.span, TextSpan::new(1200, 1203).unwrap());
    assert_eq!(mention.kind, EntityKind::Person);
    assert_eq!(mention.raw_score, Some(0.93));
    assert_eq!(mention.source_chunk_id, 4);

    let (_, token) = index.tokens().next().unwrap();
    assert_eq!(token.span, TextSpan::new(1204, 1208).unwrap());
    assert_eq!(token.pos, PartOfSpeech::Verb);
    assert_eq!(token.candidates[0].text, "run away");
}

#[test]
fn every_failure_leaves_the_index_unchanged() {
    let mut collector = MentionCollector::new();
    collector
        .ingest(
            RawChunk::new(1, 100)
                .with_mention(RawMention::new(0, 3, "Jon", EntityKind::Person))
                .with_token(RawToken::new(4, 8, "go", PartOfSpeech::Verb, vec![])),
        )
        .unwrap();
    let before = snapshot(&collector);

    let failures = vec![
        RawChunk::new(2, 50).with_mention(RawMention::new(0, 4, "Arya", EntityKind::Person)),
        RawChunk::new(3, 200)
            .with_mention(RawMention::new(0, 4, "Arya", EntityKind::Person))
            .with_mention(RawMention::new(9, 2, "Bran", EntityKind::Person)),
        RawChunk::new(4, 102)
            .with_mention(RawMention::new(10, 14, "Arya", EntityKind::Person))
            .with_token(RawToken::new(0, 4, "oh", PartOfSpeech::Intj, vec![])),
        RawChunk::new(5, 300)
            .with_byte_offsets()
            .with_mention(RawMention::new(0, 4, "Arya", EntityKind::Person)),
    ];
    for chunk in failures {
        assert!(collector.ingest(chunk).is_err());
        assert_eq!(snapshot(&collector), before);
    }
    assert_eq!(collector.chunk_count(), 1);
}

#[test]
fn out_of_order_error_names_both_offsets() {
    let mut collector = MentionCollector::new();
    collector.add_chunk(1, 500, vec![]).unwrap();
    match collector.add_chunk(9, 499, vec![]) {
        Err(Error::OutOfOrderChunk {
            chunk_id,
            base_offset,
            previous,
        }) => {
            assert_eq!((chunk_id, base_offset, previous), (9, 499, 500));
        }
        other => panic!("expected OutOfOrderChunk, got {:?}", other),
    }
}

#[test]
fn byte_offsets_with_multibyte_text() {
    let text = "Brienne of Tarth — Oathkeeper";
    let start = text.find("Oathkeeper").unwrap();
    let chunk = RawChunk::new(1, 0)
        .with_text(text)
        .with_byte_offsets()
        .with_mention(RawMention::new(start, start + "Oathkeeper".len(), "", EntityKind::Misc))
        .with_token(RawToken::new(
            0,
            7,
            "Brienne",
            PartOfSpeech::Propn,
            vec![GlossCandidate::new("a knight", 0.5)],
        ));
    let mut collector = MentionCollector::new();
    collector.ingest(chunk).unwrap();
    let index = collector.finish();

    let (_, mention) = index.mentions().next().unwrap();
    // The em dash is three bytes but one char.
    assert_eq!(mention.span, TextSpan::new(19, 29).unwrap());
    assert_eq!(mention.surface_form, "Oathkeeper");
}

#[test]
fn buffered_collector_accepts_any_order() {
    let mut buffer = BufferedCollector::new();
    buffer.extend(vec![
        RawChunk::new(3, 2000).with_mention(RawMention::new(0, 4, "Bran", EntityKind::Person)),
        RawChunk::new(1, 0).with_mention(RawMention::new(0, 3, "Jon", EntityKind::Person)),
        RawChunk::new(2, 1000).with_mention(RawMention::new(0, 4, "Arya", EntityKind::Person)),
    ]);
    let index = buffer.finish().unwrap();
    let starts: Vec<usize> = index.mentions().map(|(_, m)| m.span.start()).collect();
    assert_eq!(starts, vec![0, 1000, 2000]);
}

proptest! {
    #[test]
    fn ordered_chunks_keep_all_mentions(
        first in chunk_strategy(1, 0),
        second in chunk_strategy(2, 600),
    ) {
        let expected = first.mentions.len() + second.mentions.len();
        let mut collector = MentionCollector::new();
        collector.ingest(first).unwrap();
        collector.ingest(second).unwrap();
        let index = collector.finish();

        prop_assert_eq!(index.len(), expected);
        let starts: Vec<usize> = index.mentions().map(|(_, m)| m.span.start()).collect();
        prop_assert!(starts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn buffered_equals_sorted_sequential(
        a in chunk_strategy(1, 0),
        b in chunk_strategy(2, 600),
        c in chunk_strategy(3, 1200),
    ) {
        let mut sequential = MentionCollector::new();
        sequential.ingest_all(vec![a.clone(), b.clone(), c.clone()]).unwrap();
        let sequential = sequential.finish();

        let mut buffer = BufferedCollector::new();
        buffer.extend(vec![c, a, b]);
        let buffered = buffer.finish().unwrap();

        let spans = |index: &glossray::DocumentIndex| -> Vec<(usize, usize)> {
            index.all().map(|e| (e.span.start(), e.span.end())).collect()
        };
        prop_assert_eq!(spans(&sequential), spans(&buffered));
    }
}
