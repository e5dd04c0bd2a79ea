//! Durable ontology cache.
//!
//! Persists the relationships the discovery engine found (plus curator
//! edits) in a SQLite database, partitioned by source id. The store is the
//! only durable state in the system; entity metadata itself is re-read from
//! the provider on every refresh and never cached.
//!
//! # Layout
//!
//! ```text
//! relationships(edge_id, source_id, source_table, source_column,
//!               target_table, target_column, relationship_type,
//!               confidence, discovery_method, is_active, notes,
//!               created_at, updated_at)
//!   UNIQUE (source_id, source_table, source_column,
//!           target_table, target_column)
//!
//! cache_metadata(source_id, key, value, updated_at)
//!   PRIMARY KEY (source_id, key)
//! ```

mod ontology;

pub use ontology::OntologyCacheStore;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::discovery::{DiscoveryMethod, RelationshipType};

/// Errors from cache store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to determine cache directory")]
    NoCacheDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A persisted relationship.
///
/// Only rows with `is_active = true` and `confidence >= 0.5` are ever
/// handed to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRelationship {
    /// Stable row identity (uuid v4).
    pub edge_id: String,
    /// Cache partition this row belongs to.
    pub source_id: String,
    /// Qualified source table.
    pub source_table: String,
    /// Referencing column.
    pub source_column: String,
    /// Qualified target table.
    pub target_table: String,
    /// Referenced column.
    pub target_column: String,
    /// Structural kind of the edge.
    pub relationship_type: RelationshipType,
    /// Confidence at discovery (or 1.0 for manual overrides).
    pub confidence: f64,
    /// How the row entered the cache.
    pub discovery_method: DiscoveryMethod,
    /// Soft-hide flag; inactive rows are kept but never served.
    pub is_active: bool,
    /// Curator notes, if any.
    pub notes: Option<String>,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds.
    pub updated_at: i64,
}

/// Singleton cache metadata per source partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub source_id: String,
    /// When the last discovery pass finished.
    pub last_discovery: DateTime<Utc>,
    /// Wall-clock duration of that pass in milliseconds.
    pub discovery_duration_ms: f64,
}

/// Statistics from one `replace_inferred` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceStats {
    /// Inferred rows removed by the clear step.
    pub cleared: usize,
    /// Candidate rows written.
    pub inserted: usize,
    /// Rows updated in place (always 0 under clear-then-reinsert).
    pub updated: usize,
    /// Manual rows left untouched.
    pub preserved: usize,
}

/// Aggregate counters backing the status endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationshipCounts {
    /// Active rows at or above the persistence threshold.
    pub total: usize,
    /// Subset with confidence >= 0.9.
    pub high_confidence: usize,
    /// Subset with `manual_verified` provenance.
    pub manually_verified: usize,
}

impl ToSql for DiscoveryMethod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for DiscoveryMethod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        DiscoveryMethod::parse(text).ok_or_else(|| FromSqlError::Other(
            format!("unknown discovery_method '{}'", text).into(),
        ))
    }
}

impl ToSql for RelationshipType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RelationshipType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        RelationshipType::parse(text).ok_or_else(|| FromSqlError::Other(
            format!("unknown relationship_type '{}'", text).into(),
        ))
    }
}
