//! Relationship discovery engine.
//!
//! Many landscape schemas (SAP-style tables generated from metadata files)
//! declare no foreign keys at all, so the relationships a browser needs must
//! be inferred from naming and typing conventions. This module turns one
//! entity inventory into a list of scored candidate relationships.
//!
//! # Architecture
//!
//! Discovery is a pure function over the inventory: for every ordered pair
//! of distinct entities, each source column is tested against an ordered
//! rule list (see [`rules::default_rules`]); the first matching rule wins
//! and fixes the confidence. Candidates live only for the duration of one
//! discovery pass — persistence is the cache store's job.

pub mod engine;
pub mod inflection;
pub mod rules;

pub use engine::{DiscoveryConfig, DiscoveryEngine};
pub use rules::{default_rules, DiscoveryRule, RuleMatch};

use serde::{Deserialize, Serialize};

/// Confidence levels fixed by the rule table, plus the persistence and
/// reporting thresholds that depend on them.
pub mod thresholds {
    /// Column name equals the target's key column name, types compatible.
    pub const EXACT_KEY: f64 = 1.0;
    /// Column name resolves to a target column, types compatible.
    pub const NAME_AND_TYPE: f64 = 0.9;
    /// Column name resolves to a target column, type categories differ.
    pub const NAME_ONLY: f64 = 0.7;
    /// Column name embeds the target's singular name with a key-like suffix.
    pub const PARTIAL_NAME: f64 = 0.5;
    /// Candidates below this are never persisted.
    pub const MIN_PERSIST: f64 = 0.5;
    /// Reporting cutoff for the "high confidence" status counter.
    pub const HIGH_CONFIDENCE: f64 = 0.9;
}

/// How a relationship entered the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    /// Inferred by the discovery engine from schema metadata.
    MetadataInferred,
    /// Inserted by a curator, overriding or supplementing inference.
    ManualOverride,
    /// An inferred row a curator has confirmed as correct.
    ManualVerified,
}

impl DiscoveryMethod {
    /// Stable wire/storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryMethod::MetadataInferred => "metadata_inferred",
            DiscoveryMethod::ManualOverride => "manual_override",
            DiscoveryMethod::ManualVerified => "manual_verified",
        }
    }

    /// Parse the storage form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "metadata_inferred" => Some(DiscoveryMethod::MetadataInferred),
            "manual_override" => Some(DiscoveryMethod::ManualOverride),
            "manual_verified" => Some(DiscoveryMethod::ManualVerified),
            _ => None,
        }
    }

    /// Whether this row carries curator input that must survive a refresh.
    pub fn is_manual(&self) -> bool {
        !matches!(self, DiscoveryMethod::MetadataInferred)
    }
}

impl std::fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural kind of a discovered relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// The target column is the target table's discoverable key.
    ManyToOne,
    /// The target column is an ordinary column.
    Reference,
}

impl RelationshipType {
    /// Stable wire/storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::ManyToOne => "many_to_one",
            RelationshipType::Reference => "reference",
        }
    }

    /// Parse the storage form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "many_to_one" => Some(RelationshipType::ManyToOne),
            "reference" => Some(RelationshipType::Reference),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored candidate relationship, the output of one discovery pass.
///
/// Ephemeral: candidates live only for the duration of one pass and are
/// never persisted themselves. Table names are schema-qualified
/// (`schema.table`) so that identically named tables in different schemas
/// stay distinct.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRelationship {
    /// Qualified source table.
    pub source_table: String,
    /// Referencing column on the source table.
    pub source_column: String,
    /// Qualified target table.
    pub target_table: String,
    /// Referenced column on the target table.
    pub target_column: String,
    /// Structural kind of the edge.
    pub relationship_type: RelationshipType,
    /// Confidence fixed by the matching rule.
    pub confidence: f64,
    /// Always `metadata_inferred` for engine output.
    pub discovery_method: DiscoveryMethod,
    /// Name of the rule that matched.
    pub rule: &'static str,
}

/// Natural key identifying a relationship by its endpoints.
///
/// Relationship identity is derived from the endpoints, never from scan
/// order, so reruns of discovery are diffable. Names are lowercased for
/// case-insensitive comparison.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct RelationshipKey {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
}

impl RelationshipKey {
    /// Build a key with normalized (lowercase) names.
    #[must_use]
    pub fn new(
        source_table: &str,
        source_column: &str,
        target_table: &str,
        target_column: &str,
    ) -> Self {
        Self {
            source_table: source_table.to_lowercase(),
            source_column: source_column.to_lowercase(),
            target_table: target_table.to_lowercase(),
            target_column: target_column.to_lowercase(),
        }
    }

    /// Key of a candidate.
    #[must_use]
    pub fn of(candidate: &CandidateRelationship) -> Self {
        Self::new(
            &candidate.source_table,
            &candidate.source_column,
            &candidate.target_table,
            &candidate.target_column,
        )
    }
}
