//! The discovery engine.
//!
//! Pure and deterministic: no I/O beyond the entity list passed in, and the
//! output is sorted by relationship key so reordering the input never
//! changes the result.

use std::collections::BTreeMap;

use crate::metadata::Entity;

use super::rules::{default_rules, DiscoveryRule};
use super::{thresholds, CandidateRelationship, DiscoveryMethod, RelationshipKey};

/// Configuration for a discovery pass.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Candidates below this confidence are not emitted.
    pub min_confidence: f64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_confidence: thresholds::MIN_PERSIST,
        }
    }
}

impl DiscoveryConfig {
    /// Builder: set the minimum confidence, clamped to [0, 1].
    pub fn with_min_confidence(mut self, threshold: f64) -> Self {
        self.min_confidence = threshold.clamp(0.0, 1.0);
        self
    }
}

/// Turns an entity inventory into scored candidate relationships.
#[derive(Debug)]
pub struct DiscoveryEngine {
    rules: Vec<DiscoveryRule>,
    config: DiscoveryConfig,
}

impl Default for DiscoveryEngine {
    fn default() -> Self {
        Self::with_config(DiscoveryConfig::default())
    }
}

impl DiscoveryEngine {
    /// Engine with custom configuration and the default rule table.
    pub fn with_config(config: DiscoveryConfig) -> Self {
        Self {
            rules: default_rules(),
            config,
        }
    }

    /// Run one discovery pass over `entities`.
    ///
    /// For every ordered pair of distinct entities and every source column,
    /// the rule table is walked in order and the first match wins. A
    /// column that is its own table's sole key is skipped (it identifies
    /// the row, it does not reference one); columns of a composite key stay
    /// in play and yield one independent candidate per matching pair.
    #[must_use]
    pub fn discover(&self, entities: &[Entity]) -> Vec<CandidateRelationship> {
        // BTreeMap on the natural key: dedupes and fixes output order in
        // one move, so the scan order of `entities` cannot leak through.
        let mut candidates: BTreeMap<RelationshipKey, CandidateRelationship> = BTreeMap::new();

        for source in entities {
            let source_name = source.qualified_name();
            let source_keys = source.key_columns();
            let sole_key = if source_keys.len() == 1 {
                Some(source_keys[0].name.clone())
            } else {
                None
            };

            for target in entities {
                if source.qualified_name() == target.qualified_name() {
                    continue;
                }

                for column in &source.columns {
                    if sole_key
                        .as_deref()
                        .is_some_and(|k| k.eq_ignore_ascii_case(&column.name))
                    {
                        continue;
                    }

                    let Some(m) = self
                        .rules
                        .iter()
                        .find_map(|rule| rule.try_match(column, target))
                    else {
                        continue;
                    };

                    if m.confidence < self.config.min_confidence {
                        continue;
                    }

                    let candidate = CandidateRelationship {
                        source_table: source_name.clone(),
                        source_column: column.name.clone(),
                        target_table: target.qualified_name(),
                        target_column: m.target_column.clone(),
                        relationship_type: m.relationship_type(),
                        confidence: m.confidence,
                        discovery_method: DiscoveryMethod::MetadataInferred,
                        rule: m.rule_name,
                    };
                    candidates.insert(RelationshipKey::of(&candidate), candidate);
                }
            }
        }

        candidates.into_values().collect()
    }
}
