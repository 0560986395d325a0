//! Book-wide entity resolution for X-Ray.

use crate::alias::AliasTable;
use crate::description::DescriptionSource;
use crate::overlap::resolve_overlaps;
use crate::policy::{AliasPolicy, GroupKey, ResolutionPolicy};
use glossray_core::{DocumentIndex, Entity, EntityId, EntityKind, EntryId, Mention, MentionRef};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Counters describing what resolution did with the mentions it was given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStats {
    /// Mentions read from the index
    pub total_mentions: usize,
    /// Mentions assigned to an exported entity
    pub surviving_mentions: usize,
    /// Mentions dropped because a higher-priority mention overlapped them
    pub discarded_overlaps: usize,
    /// Entities removed by `min_mention_count` or `custom_entity_only`
    pub pruned_entities: usize,
    /// Mentions belonging to pruned entities
    pub pruned_mentions: usize,
    /// Surviving mentions whose kind lost the entity's majority vote
    pub reclassified_mentions: usize,
    /// Mentions attached by the partial-name heuristic
    pub partial_name_links: usize,
}

/// Output of [`Resolver::resolve`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    entities: Vec<Entity>,
    ranking: Vec<EntityId>,
    assignments: HashMap<EntryId, EntityId>,
    stats: ResolutionStats,
}

impl Resolution {
    /// Entities ordered by id.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| &self.entities[i])
    }

    /// Entity ids by mention count descending, then first occurrence.
    #[must_use]
    pub fn ranking(&self) -> &[EntityId] {
        &self.ranking
    }

    /// Entities in ranking order.
    pub fn ranked(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.ranking.iter().filter_map(|&id| self.entity(id))
    }

    /// Entity a mention entry was assigned to. `None` for discarded or pruned
    /// mentions and for non-mention entries.
    #[must_use]
    pub fn entity_of(&self, entry: EntryId) -> Option<EntityId> {
        self.assignments.get(&entry).copied()
    }

    /// Diagnostics counters.
    #[must_use]
    pub fn stats(&self) -> ResolutionStats {
        self.stats
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entity was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Take the entities, ordered by id.
    #[must_use]
    pub fn into_entities(self) -> Vec<Entity> {
        self.entities
    }
}

/// Mentions grouped so far under one key, before ids are assigned.
struct Draft<'a> {
    canonical_name: String,
    from_alias: bool,
    kinds: Vec<EntityKind>,
    mentions: Vec<MentionRef>,
    surfaces: Vec<&'a str>,
    words: HashSet<String>,
    last_end: usize,
}

impl<'a> Draft<'a> {
    fn new(canonical_name: String, from_alias: bool) -> Self {
        Self {
            canonical_name,
            from_alias,
            kinds: Vec::new(),
            mentions: Vec::new(),
            surfaces: Vec::new(),
            words: HashSet::new(),
            last_end: 0,
        }
    }

    fn push(&mut self, entry: EntryId, mention: &'a Mention, normalized: &str) {
        self.mentions.push(MentionRef {
            entry,
            span: mention.span,
        });
        self.kinds.push(mention.kind);
        self.surfaces.push(&mention.surface_form);
        if normalized.split_whitespace().nth(1).is_some() {
            self.words
                .extend(normalized.split_whitespace().map(str::to_string));
        }
        self.last_end = self.last_end.max(mention.span.end());
    }

    fn first_kind(&self) -> Option<EntityKind> {
        self.kinds.first().copied()
    }
}

/// Groups surviving mentions into entities.
///
/// # Algorithm
///
/// 1. Read all mentions in document order from the index
/// 2. Drop mentions that lose an overlap (see [`crate::overlap`])
/// 3. Normalize surface forms and group by form or alias class
/// 4. Settle each entity's kind by majority vote
/// 5. Assign ids in creation order, attach descriptions, prune
/// 6. Rank by mention count, then first occurrence
///
/// # Example
///
/// ```
/// use glossray_coalesce::{AliasTable, Resolver};
/// use glossray_core::{Annotation, DocumentIndex, EntityKind, Mention, TextSpan};
///
/// let mut index = DocumentIndex::new();
/// for (start, end, surface) in [(0, 3, "Jon"), (10, 18, "Jon Snow"), (30, 34, "Snow")] {
///     let span = TextSpan::new(start, end).unwrap();
///     index.insert(span, Annotation::Mention(Mention::new(span, surface, EntityKind::Person, 0)));
/// }
///
/// let resolver = Resolver::with_aliases(
///     AliasTable::new().with_class("Jon Snow", ["Jon", "Snow"]),
/// );
/// let resolution = resolver.resolve(&index);
/// assert_eq!(resolution.len(), 1);
/// assert_eq!(resolution.entities()[0].mention_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Resolver<P = AliasPolicy> {
    policy: P,
    min_mention_count: usize,
    custom_entity_only: bool,
    search_people: bool,
    partial_name_window: Option<usize>,
}

impl Resolver<AliasPolicy> {
    /// Create a resolver with an empty alias table.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(AliasPolicy::default())
    }

    /// Create a resolver over an alias table.
    #[must_use]
    pub fn with_aliases(table: AliasTable) -> Self {
        Self::with_policy(AliasPolicy::new(table))
    }
}

impl Default for Resolver<AliasPolicy> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ResolutionPolicy> Resolver<P> {
    /// Create a resolver with a custom grouping policy.
    #[must_use]
    pub fn with_policy(policy: P) -> Self {
        Self {
            policy,
            min_mention_count: 1,
            custom_entity_only: false,
            search_people: false,
            partial_name_window: None,
        }
    }

    /// The grouping policy.
    #[must_use]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Drop entities with fewer mentions unless they have a description.
    #[must_use]
    pub fn with_min_mention_count(mut self, count: usize) -> Self {
        self.min_mention_count = count.max(1);
        self
    }

    /// Keep only entities that matched a configured alias class.
    #[must_use]
    pub fn custom_entity_only(mut self, only: bool) -> Self {
        self.custom_entity_only = only;
        self
    }

    /// Look up descriptions for Person entities too.
    #[must_use]
    pub fn search_people(mut self, search: bool) -> Self {
        self.search_people = search;
        self
    }

    /// Link unmatched one-word mentions to a nearby multi-word entity.
    ///
    /// The window is the maximum distance in chars between the end of the
    /// entity's latest mention and the start of the candidate mention.
    #[must_use]
    pub fn with_partial_name_window(mut self, window: Option<usize>) -> Self {
        self.partial_name_window = window;
        self
    }

    /// Resolve without a description source.
    #[must_use]
    pub fn resolve(&self, index: &DocumentIndex) -> Resolution {
        self.resolve_with(index, None)
    }

    /// Resolve all mentions of `index` into entities.
    ///
    /// Deterministic: the same index (same insertion order) always yields the
    /// same ids and ranking.
    #[must_use]
    pub fn resolve_with(
        &self,
        index: &DocumentIndex,
        descriptions: Option<&dyn DescriptionSource>,
    ) -> Resolution {
        let mentions: Vec<(EntryId, &Mention)> = index.mentions().collect();
        let outcome = resolve_overlaps(&mentions);

        let mut stats = ResolutionStats {
            total_mentions: mentions.len(),
            discarded_overlaps: outcome.discarded.len(),
            ..ResolutionStats::default()
        };

        let mut drafts: Vec<Draft<'_>> = Vec::new();
        let mut by_key: HashMap<GroupKey, usize> = HashMap::new();

        for &(entry, mention) in &outcome.survivors {
            let normalized = self.policy.normalize(&mention.surface_form);
            let key = self.policy.group_key(&normalized);

            let slot = match by_key.get(&key) {
                Some(&slot) => slot,
                None => {
                    let linked = if key.is_alias() {
                        None
                    } else {
                        self.partial_name_match(&drafts, &normalized, mention)
                    };
                    let slot = match linked {
                        Some(slot) => {
                            stats.partial_name_links += 1;
                            log::debug!(
                                "linked {:?} at {} to {:?}",
                                mention.surface_form,
                                mention.span,
                                drafts[slot].canonical_name
                            );
                            slot
                        }
                        None => {
                            let canonical = self
                                .policy
                                .canonical_name(&key)
                                .map_or_else(|| mention.surface_form.clone(), str::to_string);
                            drafts.push(Draft::new(canonical, key.is_alias()));
                            drafts.len() - 1
                        }
                    };
                    by_key.insert(key, slot);
                    slot
                }
            };
            drafts[slot].push(entry, mention, &normalized);
        }

        let mut entities = Vec::with_capacity(drafts.len());
        let mut assignments = HashMap::new();

        for (i, draft) in drafts.into_iter().enumerate() {
            let id = i as EntityId + 1;
            let kind = self
                .policy
                .vote_kind(&draft.kinds)
                .unwrap_or(EntityKind::Other);
            let dissent = draft.kinds.iter().filter(|&&k| k != kind).count();

            let mut entity = Entity::new(id, draft.canonical_name, kind);
            for surface in draft.surfaces {
                entity.add_alias(surface);
            }
            entity.mentions = draft.mentions;

            if let Some(source) = descriptions {
                if kind != EntityKind::Person || self.search_people {
                    entity.description = source.description(&entity.canonical_name);
                }
            }

            let too_rare =
                entity.mention_count() < self.min_mention_count && entity.description.is_none();
            let not_custom = self.custom_entity_only && !draft.from_alias;
            if too_rare || not_custom {
                stats.pruned_entities += 1;
                stats.pruned_mentions += entity.mention_count();
                continue;
            }

            stats.reclassified_mentions += dissent;
            stats.surviving_mentions += entity.mention_count();
            for mention in &entity.mentions {
                assignments.insert(mention.entry, id);
            }
            entities.push(entity);
        }

        let ranking = rank(&entities);

        log::info!(
            "resolved {} entities from {} mentions ({} overlap discards, {} pruned entities)",
            entities.len(),
            stats.total_mentions,
            stats.discarded_overlaps,
            stats.pruned_entities
        );

        Resolution {
            entities,
            ranking,
            assignments,
            stats,
        }
    }

    fn partial_name_match(
        &self,
        drafts: &[Draft<'_>],
        normalized: &str,
        mention: &Mention,
    ) -> Option<usize> {
        let window = self.partial_name_window?;
        let mut words = normalized.split_whitespace();
        let word = words.next()?;
        if words.next().is_some() {
            return None;
        }

        drafts
            .iter()
            .enumerate()
            .filter(|(_, d)| d.first_kind() == Some(mention.kind) && d.words.contains(word))
            .filter(|(_, d)| {
                d.last_end <= mention.span.start() && mention.span.start() - d.last_end <= window
            })
            .max_by_key(|(i, d)| (d.last_end, std::cmp::Reverse(*i)))
            .map(|(i, _)| i)
    }
}

/// Entity ids by mention count descending, first occurrence ascending.
#[must_use]
pub fn rank(entities: &[Entity]) -> Vec<EntityId> {
    let mut keyed: Vec<(usize, usize, EntityId)> = entities
        .iter()
        .map(|e| {
            let first = e.first_occurrence().map_or(usize::MAX, |s| s.start());
            (e.mention_count(), first, e.id)
        })
        .collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
    keyed.into_iter().map(|(_, _, id)| id).collect()
}
