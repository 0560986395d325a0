//! # glossray-coalesce
//!
//! Book-wide entity resolution for X-Ray.
//!
//! Mentions arrive from the NER passes chunk by chunk, overlapping and with
//! inconsistent kinds. This crate turns them into one entity list:
//!
//! - [`overlap`]: pick one mention per stretch of text
//! - [`alias`]: normalize surface forms and apply the configured alias table
//! - [`policy`]: the replaceable grouping rules
//! - [`resolver`]: grouping, kind voting, pruning and ranking
//!
//! # Example
//!
//! ```
//! use glossray_coalesce::Resolver;
//! use glossray_core::{Annotation, DocumentIndex, EntityKind, Mention, TextSpan};
//!
//! let mut index = DocumentIndex::new();
//! let span = TextSpan::new(0, 10).unwrap();
//! index.insert(span, Annotation::Mention(Mention::new(span, "Winterfell", EntityKind::Place, 0)));
//!
//! let resolution = Resolver::new().resolve(&index);
//! assert_eq!(resolution.ranking(), &[1]);
//! ```

#![warn(missing_docs)]

pub mod alias;
pub mod description;
pub mod overlap;
pub mod policy;
pub mod resolver;

pub use alias::{AliasClass, AliasTable, DEFAULT_PREFIXES};
pub use description::DescriptionSource;
pub use overlap::{resolve_overlaps, OverlapOutcome};
pub use policy::{AliasPolicy, GroupKey, ResolutionPolicy};
pub use resolver::{rank, Resolution, ResolutionStats, Resolver};
