//! Token annotations and their gloss candidates (the Word-Wise layer).

use crate::span::TextSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Universal Dependencies coarse part-of-speech tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PartOfSpeech {
    /// Adjective (ADJ)
    Adj,
    /// Adposition (ADP)
    Adp,
    /// Adverb (ADV)
    Adv,
    /// Auxiliary (AUX)
    Aux,
    /// Conjunction (CCONJ, SCONJ)
    Conj,
    /// Determiner (DET)
    Det,
    /// Interjection (INTJ)
    Intj,
    /// Noun (NOUN)
    Noun,
    /// Numeral (NUM)
    Num,
    /// Particle (PART)
    Part,
    /// Pronoun (PRON)
    Pron,
    /// Proper noun (PROPN)
    Propn,
    /// Verb (VERB)
    Verb,
    /// Punctuation, symbols and anything else
    Other,
}

impl PartOfSpeech {
    /// UD label.
    #[must_use]
    pub const fn as_label(self) -> &'static str {
        match self {
            PartOfSpeech::Adj => "ADJ",
            PartOfSpeech::Adp => "ADP",
            PartOfSpeech::Adv => "ADV",
            PartOfSpeech::Aux => "AUX",
            PartOfSpeech::Conj => "CCONJ",
            PartOfSpeech::Det => "DET",
            PartOfSpeech::Intj => "INTJ",
            PartOfSpeech::Noun => "NOUN",
            PartOfSpeech::Num => "NUM",
            PartOfSpeech::Part => "PART",
            PartOfSpeech::Pron => "PRON",
            PartOfSpeech::Propn => "PROPN",
            PartOfSpeech::Verb => "VERB",
            PartOfSpeech::Other => "X",
        }
    }

    /// Parse a UD tag. Unknown tags map to [`PartOfSpeech::Other`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "ADJ" => PartOfSpeech::Adj,
            "ADP" => PartOfSpeech::Adp,
            "ADV" => PartOfSpeech::Adv,
            "AUX" => PartOfSpeech::Aux,
            "CCONJ" | "SCONJ" | "CONJ" => PartOfSpeech::Conj,
            "DET" => PartOfSpeech::Det,
            "INTJ" => PartOfSpeech::Intj,
            "NOUN" => PartOfSpeech::Noun,
            "NUM" => PartOfSpeech::Num,
            "PART" => PartOfSpeech::Part,
            "PRON" => PartOfSpeech::Pron,
            "PROPN" => PartOfSpeech::Propn,
            "VERB" => PartOfSpeech::Verb,
            _ => PartOfSpeech::Other,
        }
    }
}

impl From<String> for PartOfSpeech {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<PartOfSpeech> for String {
    fn from(pos: PartOfSpeech) -> Self {
        pos.as_label().to_string()
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One possible simplified gloss for a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlossCandidate {
    /// Gloss text shown above the word
    pub text: String,
    /// Upstream ranking score, higher is better
    pub score: f64,
    /// Sense identifier used to match word-sense disambiguation output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sense: Option<String>,
    /// Difficulty level of the headword (1 = hardest word, shown most often)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
}

impl GlossCandidate {
    /// Create a candidate with no sense id or difficulty.
    #[must_use]
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
            sense: None,
            difficulty: None,
        }
    }

    /// Attach a sense identifier.
    #[must_use]
    pub fn with_sense(mut self, sense: impl Into<String>) -> Self {
        self.sense = Some(sense.into());
        self
    }

    /// Attach a difficulty level.
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Whether this candidate is the sense a disambiguator picked.
    ///
    /// Candidates without a sense id are identified by their gloss text.
    #[must_use]
    pub fn matches_sense(&self, sense: &str) -> bool {
        match &self.sense {
            Some(own) => own == sense,
            None => self.text == sense,
        }
    }
}

/// A token with its lemma, POS and ranked gloss candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAnnotation {
    /// Document-wide span
    pub span: TextSpan,
    /// Dictionary form
    pub lemma: String,
    /// Coarse POS tag
    pub pos: PartOfSpeech,
    /// Candidates in upstream order
    pub candidates: Vec<GlossCandidate>,
    /// NLP pass that produced the token; spans within one pass never overlap
    #[serde(default)]
    pub pass: u32,
}

impl TokenAnnotation {
    /// Create a token from pass 0.
    #[must_use]
    pub fn new(
        span: TextSpan,
        lemma: impl Into<String>,
        pos: PartOfSpeech,
        candidates: Vec<GlossCandidate>,
    ) -> Self {
        Self {
            span,
            lemma: lemma.into(),
            pos,
            candidates,
            pass: 0,
        }
    }

    /// Set the producing pass.
    #[must_use]
    pub fn with_pass(mut self, pass: u32) -> Self {
        self.pass = pass;
        self
    }
}
