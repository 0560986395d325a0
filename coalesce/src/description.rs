//! Entity descriptions supplied by an external collaborator.
//!
//! Summaries come from an encyclopedia lookup (Wikipedia, a MediaWiki
//! server, or a cache of earlier lookups) that runs outside the engine. The
//! resolver only reads from it, and only through this trait, passed in by
//! reference for one pass.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Read-only key-value source of entity descriptions keyed by canonical name.
pub trait DescriptionSource: Send + Sync {
    /// Description for an entity, if the source knows it.
    fn description(&self, name: &str) -> Option<String>;
}

impl<S: BuildHasher + Send + Sync> DescriptionSource for HashMap<String, String, S> {
    fn description(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl DescriptionSource for BTreeMap<String, String> {
    fn description(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_sources() {
        let mut hashed = HashMap::new();
        hashed.insert("Winterfell".to_string(), "Seat of House Stark".to_string());
        assert_eq!(
            hashed.description("Winterfell").as_deref(),
            Some("Seat of House Stark")
        );
        assert!(hashed.description("winterfell").is_none());

        let ordered: BTreeMap<String, String> = BTreeMap::new();
        assert!(ordered.description("Winterfell").is_none());
    }
}
