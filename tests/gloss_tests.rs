//! Gloss selection tests.


use fuzz_strategies::candidates_strategy;
use glossray::collector::{MentionCollector, RawChunk, RawToken};
use glossray::{
    Disambiguation, Error, GlossCandidate, GlossSelector, PartOfSpeech, TextSpan, TokenAnnotation,
};
use proptest::prelude::*;
use std::collections::HashMap;

fn token(candidates: Vec<GlossCandidate>) -> TokenAnnotation {
    TokenAnnotation::new(TextSpan::new(0, 4).unwrap(), "quit", PartOfSpeech::Verb, candidates)
}

#[test]
fn highest_score_without_disambiguation() {
    let t = token(vec![GlossCandidate::new("go", 0.4), GlossCandidate::new("leave", 0.9)]);
    assert_eq!(GlossSelector::new().select_gloss(&t, None).unwrap().text, "leave");
}

#[test]
fn disambiguation_picks_matching_sense() {
    let t = token(vec![GlossCandidate::new("go", 0.4), GlossCandidate::new("leave", 0.9)]);
    let wsd = Disambiguation::new("go", 0.95);
    assert_eq!(
        GlossSelector::new().select_gloss(&t, Some(&wsd)).unwrap().text,
        "go"
    );
}

#[test]
fn empty_candidates_are_local_errors() {
    let err = GlossSelector::new().select_gloss(&token(vec![]), None).unwrap_err();
    assert!(matches!(err, Error::NoGlossAvailable { .. }));
    assert!(err.is_local());
}

#[test]
fn two_passes_reconcile_before_selection() {
    let word = |start, end, lemma: &str, glosses: &[(&str, f64)]| {
        RawToken::new(
            start,
            end,
            lemma,
            PartOfSpeech::Verb,
            glosses.iter().map(|&(t, s)| GlossCandidate::new(t, s)).collect(),
        )
    };

    let mut collector = MentionCollector::new();
    collector
        .ingest(
            RawChunk::new(1, 0)
                .with_token(word(0, 4, "quit", &[("stop", 0.5)]))
                .with_token(word(5, 12, "hastily", &[("quickly", 0.7)])),
        )
        .unwrap();
    collector
        .ingest(
            RawChunk::new(1, 0)
                .with_pass(1)
                .with_token(word(0, 4, "quit", &[("leave", 0.8), ("stop", 0.6)]))
                .with_token(word(8, 15, "tily fl", &[("nonsense", 1.0)])),
        )
        .unwrap();
    let index = collector.finish();

    let selection = GlossSelector::new().select_all(&index, &HashMap::new());
    let glosses: Vec<(usize, &str)> = selection
        .selected()
        .iter()
        .map(|s| (s.span.start(), s.gloss.text.as_str()))
        .collect();
    assert_eq!(glosses, vec![(0, "leave"), (5, "quickly")]);

    let stats = selection.stats();
    assert_eq!(stats.merged, 1);
    assert_eq!(stats.dropped_conflicts, 1);
    assert_eq!(stats.skipped, 0);
}

#[test]
fn threshold_and_difficulty_from_config() {
    let config = glossray::EngineConfig::from_toml_str(
        "[gloss]\nwsd_threshold = 0.9\ndifficulty_limit = 2\n",
    )
    .unwrap();
    let selector = config.build_selector();
    let t = token(vec![
        GlossCandidate::new("depart", 0.9).with_difficulty(4),
        GlossCandidate::new("go", 0.4).with_difficulty(1),
        GlossCandidate::new("leave", 0.8).with_difficulty(2),
    ]);

    // Difficulty 4 is filtered; the weak disambiguation is ignored.
    let weak = Disambiguation::new("go", 0.5);
    assert_eq!(selector.select_gloss(&t, Some(&weak)).unwrap().text, "leave");

    let strong = Disambiguation::new("go", 0.95);
    assert_eq!(selector.select_gloss(&t, Some(&strong)).unwrap().text, "go");
}

proptest! {
    #[test]
    fn selected_gloss_has_the_top_score(candidates in candidates_strategy()) {
        let t = token(candidates.clone());
        match GlossSelector::new().select_gloss(&t, None) {
            Ok(gloss) => {
                let top = candidates.iter().map(|c| c.score).fold(f64::MIN, f64::max);
                prop_assert_eq!(gloss.score, top);
                let first_top = candidates.iter().find(|c| c.score == top).unwrap();
                prop_assert_eq!(&gloss, first_top);
            }
            Err(_) => prop_assert!(candidates.is_empty()),
        }
    }

    #[test]
    fn difficulty_limit_is_respected(candidates in candidates_strategy(), limit in 1u8..=5) {
        let t = token(candidates);
        let selector = GlossSelector::new().with_difficulty_limit(Some(limit));
        if let Ok(gloss) = selector.select_gloss(&t, None) {
            prop_assert!(gloss.difficulty.map_or(true, |d| d <= limit));
        }
    }
}
