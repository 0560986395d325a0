//! Replaceable grouping policy for entity resolution.
//!
//! The resolver only asks three questions of a policy: how to normalize a
//! surface form, which group a normalized form belongs to, and which kind
//! wins when a group's mentions disagree. [`AliasPolicy`] answers them with
//! case-folding, the configured [`AliasTable`] and a majority vote.

use crate::alias::AliasTable;
use glossray_core::EntityKind;

/// Grouping key for mentions that refer to the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Member of a configured alias class
    Alias(usize),
    /// Bare normalized surface form
    Form(String),
}

impl GroupKey {
    /// Whether the key came from the alias table.
    #[must_use]
    pub fn is_alias(&self) -> bool {
        matches!(self, GroupKey::Alias(_))
    }
}

/// Normalization and grouping rules used by [`crate::Resolver`].
pub trait ResolutionPolicy: Send + Sync {
    /// Normalize a raw surface form.
    fn normalize(&self, surface: &str) -> String;

    /// Group for a normalized form.
    fn group_key(&self, normalized: &str) -> GroupKey;

    /// Configured display name for a group, if any.
    fn canonical_name(&self, key: &GroupKey) -> Option<&str>;

    /// Kind of an entity whose mentions carry `kinds` (in document order).
    fn vote_kind(&self, kinds: &[EntityKind]) -> Option<EntityKind> {
        majority_kind(kinds)
    }
}

/// Most frequent kind; ties go to the kind seen first.
///
/// # Example
///
/// ```
/// use glossray_coalesce::policy::majority_kind;
/// use glossray_core::EntityKind::{Organization, Person};
///
/// assert_eq!(majority_kind(&[Organization, Person, Person]), Some(Person));
/// assert_eq!(majority_kind(&[Organization, Person]), Some(Organization));
/// assert_eq!(majority_kind(&[]), None);
/// ```
#[must_use]
pub fn majority_kind(kinds: &[EntityKind]) -> Option<EntityKind> {
    let mut tally: Vec<(EntityKind, usize)> = Vec::new();
    for &kind in kinds {
        match tally.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, count)) => *count += 1,
            None => tally.push((kind, 1)),
        }
    }

    let mut best: Option<(EntityKind, usize)> = None;
    for (kind, count) in tally {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((kind, count));
        }
    }
    best.map(|(kind, _)| kind)
}

/// Default policy: normalized-form equality or shared alias class.
#[derive(Debug, Clone, Default)]
pub struct AliasPolicy {
    table: AliasTable,
}

impl AliasPolicy {
    /// Create a policy over an alias table.
    #[must_use]
    pub fn new(table: AliasTable) -> Self {
        Self { table }
    }

    /// The alias table.
    #[must_use]
    pub fn table(&self) -> &AliasTable {
        &self.table
    }
}

impl ResolutionPolicy for AliasPolicy {
    fn normalize(&self, surface: &str) -> String {
        self.table.normalize(surface)
    }

    fn group_key(&self, normalized: &str) -> GroupKey {
        match self.table.class_of(normalized) {
            Some(class) => GroupKey::Alias(class),
            None => GroupKey::Form(normalized.to_string()),
        }
    }

    fn canonical_name(&self, key: &GroupKey) -> Option<&str> {
        match key {
            GroupKey::Alias(class) => self.table.class(*class).map(|c| c.canonical.as_str()),
            GroupKey::Form(_) => None,
        }
    }
}
