//! Engine configuration.
//!
//! Settings come from the host application as TOML:
//!
//! ```toml
//! prefixes = ["the", "ser", "maester"]
//!
//! [resolver]
//! min_mention_count = 2
//! search_people = true
//! partial_name_window = 2000
//!
//! [gloss]
//! wsd_threshold = 0.6
//! difficulty_limit = 3
//!
//! [[aliases]]
//! canonical = "Jon Snow"
//! aliases = ["Jon", "Lord Snow"]
//! ```
//!
//! Every section and key is optional.

use crate::gloss::GlossSelector;
use crate::{Error, Result};
use glossray_coalesce::{AliasClass, AliasTable, Resolver};
use serde::{Deserialize, Serialize};

/// X-Ray resolution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Entities with fewer mentions and no description are dropped
    pub min_mention_count: usize,
    /// Keep only entities from the alias table
    pub custom_entity_only: bool,
    /// Look up descriptions for people
    pub search_people: bool,
    /// Partial-name linking window in chars; off when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_name_window: Option<usize>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_mention_count: 1,
            custom_entity_only: false,
            search_people: false,
            partial_name_window: None,
        }
    }
}

/// Word-Wise selection settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlossConfig {
    /// Minimum disambiguation score to trust, in `[0, 1]`
    pub wsd_threshold: f64,
    /// Highest candidate difficulty shown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_limit: Option<u8>,
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Articles and honorifics stripped during normalization; defaults when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefixes: Option<Vec<String>>,
    /// X-Ray settings
    pub resolver: ResolverConfig,
    /// Word-Wise settings
    pub gloss: GlossConfig,
    /// Alias classes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<AliasClass>,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for malformed TOML, unknown keys or out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| Error::config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::config(format!("failed to serialize: {}", e)))
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.resolver.min_mention_count == 0 {
            return Err(Error::config("resolver.min_mention_count must be at least 1"));
        }
        let threshold = self.gloss.wsd_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::config(format!(
                "gloss.wsd_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if let Some(class) = self.aliases.iter().find(|c| c.canonical.trim().is_empty()) {
            return Err(Error::config(format!(
                "alias class with aliases {:?} has an empty canonical name",
                class.aliases
            )));
        }
        Ok(())
    }

    /// Alias table with the configured prefixes and classes.
    #[must_use]
    pub fn alias_table(&self) -> AliasTable {
        let mut table = match &self.prefixes {
            Some(prefixes) => AliasTable::new().with_prefixes(prefixes),
            None => AliasTable::new(),
        };
        for class in &self.aliases {
            table.add_class(class.clone());
        }
        table
    }

    /// Resolver configured from the `[resolver]` section and the alias table.
    #[must_use]
    pub fn build_resolver(&self) -> Resolver {
        Resolver::with_aliases(self.alias_table())
            .with_min_mention_count(self.resolver.min_mention_count)
            .custom_entity_only(self.resolver.custom_entity_only)
            .search_people(self.resolver.search_people)
            .with_partial_name_window(self.resolver.partial_name_window)
    }

    /// Selector configured from the `[gloss]` section.
    #[must_use]
    pub fn build_selector(&self) -> GlossSelector {
        GlossSelector::new()
            .with_wsd_threshold(self.gloss.wsd_threshold)
            .with_difficulty_limit(self.gloss.difficulty_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.resolver.min_mention_count, 1);
    }

    #[test]
    fn test_full_document() {
        let config = EngineConfig::from_toml_str(
            r#"
            prefixes = ["ser", "maester"]

            [resolver]
            min_mention_count = 2
            search_people = true
            partial_name_window = 2000

            [gloss]
            wsd_threshold = 0.6
            difficulty_limit = 3

            [[aliases]]
            canonical = "Jon Snow"
            aliases = ["Jon", "Lord Snow"]

            [[aliases]]
            canonical = "Winterfell"
            "#,
        )
        .unwrap();

        assert_eq!(config.resolver.min_mention_count, 2);
        assert!(config.resolver.search_people);
        assert!(!config.resolver.custom_entity_only);
        assert_eq!(config.resolver.partial_name_window, Some(2000));
        assert_eq!(config.gloss.difficulty_limit, Some(3));
        assert_eq!(config.aliases.len(), 2);
        assert!(config.aliases[1].aliases.is_empty());

        let table = config.alias_table();
        assert_eq!(table.normalize("Maester Aemon"), "aemon");
        // "the" is no longer a prefix
        assert_eq!(table.normalize("The Wall"), "the wall");
        assert_eq!(table.class_of("jon"), Some(0));

        let selector = config.build_selector();
        assert_eq!(selector.wsd_threshold, 0.6);
    }

    #[test]
    fn test_errors_are_config_errors() {
        for source in [
            "[resolver]\nmin_mention_count = 0",
            "[gloss]\nwsd_threshold = 1.5",
            "[resolver]\nunknown_key = true",
            "[[aliases]]\ncanonical = \"  \"",
            "not toml at all [",
        ] {
            let err = EngineConfig::from_toml_str(source).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{source}: {err:?}");
        }
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = EngineConfig::default();
        config.resolver.min_mention_count = 3;
        config.aliases.push(AliasClass::new("Arya Stark", ["Arya"]));
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
