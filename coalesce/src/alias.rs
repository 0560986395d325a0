//! Alias table and surface-form normalization.
//!
//! The alias table is configuration, not something computed here: the user
//! (or an upstream curated list) declares which surface forms name the same
//! entity. The table also carries the leading articles and honorifics that
//! are stripped during normalization.
//!
//! ```text
//! "The Lord Commander's"  --lowercase-->      "the lord commander's"
//!                         --possessive-->     "the lord commander"
//!                         --prefixes-->       "commander"
//! ```

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// Articles and honorifics stripped from the front of a surface form.
pub static DEFAULT_PREFIXES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "the", "a", "an", "mr", "mrs", "ms", "miss", "mx", "dr", "sir", "dame", "lord", "lady",
        "master", "captain", "capt", "professor", "prof", "king", "queen", "prince", "princess",
        "saint", "st",
    ]
});

/// One equivalence class of surface forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasClass {
    /// Name used for the resolved entity
    pub canonical: String,
    /// Other surface forms of the same entity
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl AliasClass {
    /// Create a class.
    #[must_use]
    pub fn new<I, S>(canonical: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            canonical: canonical.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }

    fn members(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Surface-form equivalence classes plus the prefix list used to normalize.
#[derive(Debug, Clone)]
pub struct AliasTable {
    classes: Vec<AliasClass>,
    prefixes: HashSet<String>,
    lookup: HashMap<String, usize>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self {
            classes: Vec::new(),
            prefixes: DEFAULT_PREFIXES.iter().map(|p| (*p).to_string()).collect(),
            lookup: HashMap::new(),
        }
    }
}

impl AliasTable {
    /// Empty table with the default prefixes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the given classes and the default prefixes.
    #[must_use]
    pub fn from_classes(classes: impl IntoIterator<Item = AliasClass>) -> Self {
        let mut table = Self::new();
        for class in classes {
            table.add_class(class);
        }
        table
    }

    /// Add a class (builder form).
    #[must_use]
    pub fn with_class<I, S>(mut self, canonical: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_class(AliasClass::new(canonical, aliases));
        self
    }

    /// Replace the prefix list. Prefixes are matched case-insensitively.
    #[must_use]
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.prefixes = prefixes
            .into_iter()
            .map(|p| p.as_ref().trim().trim_end_matches('.').to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        self.rebuild();
        self
    }

    /// Add a class and return its index.
    ///
    /// A form that already belongs to an earlier class stays with that class.
    pub fn add_class(&mut self, class: AliasClass) -> usize {
        let id = self.classes.len();
        self.classes.push(class);
        self.index_class(id);
        id
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no classes are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Configured classes, in declaration order.
    #[must_use]
    pub fn classes(&self) -> &[AliasClass] {
        &self.classes
    }

    /// Class by index.
    #[must_use]
    pub fn class(&self, id: usize) -> Option<&AliasClass> {
        self.classes.get(id)
    }

    /// Class containing an already-normalized form.
    #[must_use]
    pub fn class_of(&self, normalized: &str) -> Option<usize> {
        self.lookup.get(normalized).copied()
    }

    /// Normalize a surface form with this table's prefixes.
    #[must_use]
    pub fn normalize(&self, surface: &str) -> String {
        normalize_surface(surface, &self.prefixes)
    }

    fn rebuild(&mut self) {
        self.lookup.clear();
        for id in 0..self.classes.len() {
            self.index_class(id);
        }
    }

    fn index_class(&mut self, id: usize) {
        let forms: Vec<String> = self.classes[id]
            .members()
            .map(|m| normalize_surface(m, &self.prefixes))
            .filter(|n| !n.is_empty())
            .collect();
        for form in forms {
            match self.lookup.entry(form) {
                Entry::Occupied(existing) => {
                    if *existing.get() != id {
                        log::warn!(
                            "alias {:?} is listed under both {:?} and {:?}; keeping the first",
                            existing.key(),
                            self.classes[*existing.get()].canonical,
                            self.classes[id].canonical
                        );
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
        }
    }
}

/// Case-fold, strip a trailing possessive and leading prefixes.
///
/// Prefixes are only stripped while at least one word remains, so a mention
/// consisting solely of "The" normalizes to "the".
#[must_use]
pub fn normalize_surface(surface: &str, prefixes: &HashSet<String>) -> String {
    let lowered = surface.to_lowercase();
    let trimmed = lowered.trim_matches(|c: char| !c.is_alphanumeric());
    let mut words: Vec<&str> = trimmed.split_whitespace().collect();

    if let Some(last) = words.last_mut() {
        let word: &str = *last;
        if let Some(stem) = word.strip_suffix("'s").or_else(|| word.strip_suffix("’s")) {
            if !stem.is_empty() {
                *last = stem;
            }
        }
    }

    let mut start = 0;
    while words.len() - start > 1 && prefixes.contains(words[start].trim_end_matches('.')) {
        start += 1;
    }

    let normalized = words[start..].join(" ");
    if normalized.is_empty() {
        lowered.trim().to_string()
    } else {
        normalized
    }
}
