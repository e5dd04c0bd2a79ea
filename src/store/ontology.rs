//! SQLite-backed ontology cache store.
//!
//! One store serves every source partition; rows are keyed by `source_id`
//! plus the relationship's natural key. The refresh swap runs inside a
//! single transaction so readers observe either the fully-old or the
//! fully-new relationship set, never a partial clear.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::discovery::{
    thresholds, CandidateRelationship, DiscoveryMethod, RelationshipKey, RelationshipType,
};

use super::{
    CacheMetadata, CachedRelationship, RelationshipCounts, ReplaceStats, StoreError, StoreResult,
};

/// Current cache schema version. Bump when the layout changes; a mismatch
/// clears the cache on open.
const SCHEMA_VERSION: i32 = 1;

const META_KEY_LAST_DISCOVERY: &str = "last_discovery_timestamp";
const META_KEY_DURATION: &str = "discovery_duration_ms";

/// Durable storage for cached relationships and cache metadata.
pub struct OntologyCacheStore {
    conn: Connection,
}

impl OntologyCacheStore {
    /// Open or create the cache at the default location,
    /// `~/.schemalens/ontology.db`.
    pub fn open() -> StoreResult<Self> {
        Self::open_at(&Self::default_path()?)
    }

    /// Open or create the cache at an explicit path.
    pub fn open_at(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// In-memory cache for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Default cache database path.
    pub fn default_path() -> StoreResult<PathBuf> {
        let base = dirs::home_dir().ok_or(StoreError::NoCacheDir)?;
        Ok(base.join(".schemalens").join("ontology.db"))
    }

    /// Create tables and verify the schema version.
    fn init(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS relationships (
                edge_id           TEXT PRIMARY KEY,
                source_id         TEXT NOT NULL,
                source_table      TEXT NOT NULL,
                source_column     TEXT NOT NULL,
                target_table      TEXT NOT NULL,
                target_column     TEXT NOT NULL,
                relationship_type TEXT NOT NULL,
                confidence        REAL NOT NULL,
                discovery_method  TEXT NOT NULL,
                is_active         INTEGER NOT NULL DEFAULT 1,
                notes             TEXT,
                created_at        INTEGER NOT NULL,
                updated_at        INTEGER NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_relationships_natural_key
                ON relationships (source_id, source_table, source_column,
                                  target_table, target_column);

            CREATE TABLE IF NOT EXISTS cache_metadata (
                source_id  TEXT NOT NULL,
                key        TEXT NOT NULL,
                value      TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (source_id, key)
            );

            CREATE TABLE IF NOT EXISTS meta (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored_version: Option<i32> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                let s: String = row.get(0)?;
                Ok(s.parse().unwrap_or(0))
            })
            .optional()?;

        match stored_version {
            Some(v) if v == SCHEMA_VERSION => {}
            Some(_) => {
                self.clear_all()?;
                self.set_version()?;
            }
            None => {
                self.set_version()?;
            }
        }

        Ok(())
    }

    fn set_version(&self) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )?;
        Ok(())
    }

    /// Drop all cached rows across every source partition.
    pub fn clear_all(&self) -> StoreResult<()> {
        self.conn.execute("DELETE FROM relationships", [])?;
        self.conn.execute("DELETE FROM cache_metadata", [])?;
        Ok(())
    }

    /// All relationships a reader may see for `source_id`: active and at or
    /// above the persistence threshold, in natural-key order. An empty
    /// result is a valid cold cache.
    pub fn load_active(&self, source_id: &str) -> StoreResult<Vec<CachedRelationship>> {
        let mut stmt = self.conn.prepare(
            "SELECT edge_id, source_id, source_table, source_column,
                    target_table, target_column, relationship_type,
                    confidence, discovery_method, is_active, notes,
                    created_at, updated_at
             FROM relationships
             WHERE source_id = ?1 AND is_active = 1 AND confidence >= ?2
             ORDER BY source_table, source_column, target_table, target_column",
        )?;
        let rows = stmt
            .query_map(params![source_id, thresholds::MIN_PERSIST], row_to_relationship)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Swap the inferred relationship set for `source_id`.
    ///
    /// Within one transaction: delete every `metadata_inferred` row for the
    /// partition, insert the incoming candidates at or above
    /// `min_confidence`, and leave all manual rows untouched. A candidate
    /// whose natural key collides with a manual row is skipped — curator
    /// input always wins. On any failure the transaction rolls back and the
    /// store keeps its pre-call state.
    pub fn replace_inferred(
        &mut self,
        source_id: &str,
        candidates: &[CandidateRelationship],
        min_confidence: f64,
    ) -> StoreResult<ReplaceStats> {
        let tx = self.conn.transaction()?;
        let now = Utc::now().timestamp();

        let mut manual_keys: HashSet<RelationshipKey> = HashSet::new();
        {
            let mut stmt = tx.prepare(
                "SELECT source_table, source_column, target_table, target_column
                 FROM relationships
                 WHERE source_id = ?1 AND discovery_method != 'metadata_inferred'",
            )?;
            let keys = stmt.query_map(params![source_id], |row| {
                let st: String = row.get(0)?;
                let sc: String = row.get(1)?;
                let tt: String = row.get(2)?;
                let tc: String = row.get(3)?;
                Ok(RelationshipKey::new(&st, &sc, &tt, &tc))
            })?;
            for key in keys {
                manual_keys.insert(key?);
            }
        }
        let preserved = manual_keys.len();

        let cleared = tx.execute(
            "DELETE FROM relationships
             WHERE source_id = ?1 AND discovery_method = 'metadata_inferred'",
            params![source_id],
        )?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO relationships
                     (edge_id, source_id, source_table, source_column,
                      target_table, target_column, relationship_type,
                      confidence, discovery_method, is_active, notes,
                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, NULL, ?10, ?10)",
            )?;
            for candidate in candidates {
                if candidate.confidence < min_confidence {
                    continue;
                }
                if manual_keys.contains(&RelationshipKey::of(candidate)) {
                    continue;
                }
                stmt.execute(params![
                    uuid::Uuid::new_v4().to_string(),
                    source_id,
                    candidate.source_table,
                    candidate.source_column,
                    candidate.target_table,
                    candidate.target_column,
                    candidate.relationship_type,
                    candidate.confidence,
                    candidate.discovery_method,
                    now,
                ])?;
                inserted += 1;
            }
        }

        tx.commit()?;
        Ok(ReplaceStats {
            cleared,
            inserted,
            updated: 0,
            preserved,
        })
    }

    /// Cache metadata for `source_id`, or None if it was never refreshed.
    pub fn get_metadata(&self, source_id: &str) -> StoreResult<Option<CacheMetadata>> {
        let Some(ts_raw) = self.metadata_value(source_id, META_KEY_LAST_DISCOVERY)? else {
            return Ok(None);
        };
        let secs: i64 = ts_raw
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("bad timestamp '{}'", ts_raw)))?;
        let last_discovery = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {}", secs)))?;

        let discovery_duration_ms = match self.metadata_value(source_id, META_KEY_DURATION)? {
            Some(raw) => raw
                .parse()
                .map_err(|_| StoreError::Corrupt(format!("bad duration '{}'", raw)))?,
            None => 0.0,
        };

        Ok(Some(CacheMetadata {
            source_id: source_id.to_string(),
            last_discovery,
            discovery_duration_ms,
        }))
    }

    /// Record the completion of a discovery pass.
    pub fn set_metadata(
        &self,
        source_id: &str,
        last_discovery: DateTime<Utc>,
        duration_ms: f64,
    ) -> StoreResult<()> {
        let now = Utc::now().timestamp();
        self.conn.execute(
            "INSERT OR REPLACE INTO cache_metadata (source_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                source_id,
                META_KEY_LAST_DISCOVERY,
                last_discovery.timestamp().to_string(),
                now
            ],
        )?;
        self.conn.execute(
            "INSERT OR REPLACE INTO cache_metadata (source_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![source_id, META_KEY_DURATION, duration_ms.to_string(), now],
        )?;
        Ok(())
    }

    /// Counters backing the status endpoint.
    pub fn counts(&self, source_id: &str) -> StoreResult<RelationshipCounts> {
        let row = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(confidence >= ?2), 0),
                    COALESCE(SUM(discovery_method = 'manual_verified'), 0)
             FROM relationships
             WHERE source_id = ?1 AND is_active = 1 AND confidence >= ?3",
            params![
                source_id,
                thresholds::HIGH_CONFIDENCE,
                thresholds::MIN_PERSIST
            ],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )?;
        Ok(RelationshipCounts {
            total: row.0 as usize,
            high_confidence: row.1 as usize,
            manually_verified: row.2 as usize,
        })
    }

    /// Promote a cached row to `manual_verified`, so later refreshes leave
    /// it alone. Returns false when no row has that edge id.
    pub fn mark_verified(&self, edge_id: &str, notes: Option<&str>) -> StoreResult<bool> {
        let now = Utc::now().timestamp();
        let rows = self.conn.execute(
            "UPDATE relationships
             SET discovery_method = 'manual_verified',
                 notes = COALESCE(?2, notes),
                 updated_at = ?3
             WHERE edge_id = ?1",
            params![edge_id, notes, now],
        )?;
        Ok(rows > 0)
    }

    /// Insert (or overwrite by natural key) a curator-defined relationship.
    ///
    /// Manual overrides carry confidence 1.0 and survive refreshes.
    /// Returns the edge id of the stored row.
    #[allow(clippy::too_many_arguments)]
    pub fn add_manual_override(
        &self,
        source_id: &str,
        source_table: &str,
        source_column: &str,
        target_table: &str,
        target_column: &str,
        relationship_type: RelationshipType,
        notes: Option<&str>,
    ) -> StoreResult<String> {
        let now = Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO relationships
                 (edge_id, source_id, source_table, source_column,
                  target_table, target_column, relationship_type,
                  confidence, discovery_method, is_active, notes,
                  created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1.0, ?8, 1, ?9, ?10, ?10)
             ON CONFLICT (source_id, source_table, source_column,
                          target_table, target_column)
             DO UPDATE SET relationship_type = excluded.relationship_type,
                           confidence = excluded.confidence,
                           discovery_method = excluded.discovery_method,
                           is_active = 1,
                           notes = excluded.notes,
                           updated_at = excluded.updated_at",
            params![
                uuid::Uuid::new_v4().to_string(),
                source_id,
                source_table,
                source_column,
                target_table,
                target_column,
                relationship_type,
                DiscoveryMethod::ManualOverride,
                notes,
                now
            ],
        )?;

        let edge_id = self.conn.query_row(
            "SELECT edge_id FROM relationships
             WHERE source_id = ?1 AND source_table = ?2 AND source_column = ?3
               AND target_table = ?4 AND target_column = ?5",
            params![source_id, source_table, source_column, target_table, target_column],
            |row| row.get(0),
        )?;
        Ok(edge_id)
    }

    /// Soft-hide a row without deleting it. Returns false when no row has
    /// that edge id.
    pub fn deactivate(&self, edge_id: &str) -> StoreResult<bool> {
        let now = Utc::now().timestamp();
        let rows = self.conn.execute(
            "UPDATE relationships SET is_active = 0, updated_at = ?2 WHERE edge_id = ?1",
            params![edge_id, now],
        )?;
        Ok(rows > 0)
    }

    fn metadata_value(&self, source_id: &str, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM cache_metadata WHERE source_id = ?1 AND key = ?2",
                params![source_id, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

fn row_to_relationship(row: &Row<'_>) -> rusqlite::Result<CachedRelationship> {
    Ok(CachedRelationship {
        edge_id: row.get(0)?,
        source_id: row.get(1)?,
        source_table: row.get(2)?,
        source_column: row.get(3)?,
        target_table: row.get(4)?,
        target_column: row.get(5)?,
        relationship_type: row.get(6)?,
        confidence: row.get(7)?,
        discovery_method: row.get(8)?,
        is_active: row.get(9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}
