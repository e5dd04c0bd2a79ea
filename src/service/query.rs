//! The cache query service.

use crate::error::OntologyResult;
use crate::store::CachedRelationship;

use super::{CacheStatus, SharedStore};

/// Read path over the ontology cache. No side effects; safe to call
/// concurrently with a running refresh.
pub struct CacheQueryService {
    store: SharedStore,
}

impl CacheQueryService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Cache health for `source_id`.
    ///
    /// A never-refreshed source reports `cache_valid: false` with zero
    /// counts rather than an error.
    pub async fn status(&self, source_id: &str) -> OntologyResult<CacheStatus> {
        let store = self.store.lock().await;
        let counts = store.counts(source_id)?;
        let metadata = store.get_metadata(source_id)?;

        Ok(CacheStatus {
            cache_valid: metadata.is_some() && counts.total > 0,
            total_relationships: counts.total,
            high_confidence: counts.high_confidence,
            manually_verified: counts.manually_verified,
            last_discovery: metadata.map(|m| m.last_discovery),
        })
    }

    /// The full active relationship set for graph construction. Only
    /// `is_active` rows at or above the persistence threshold are returned.
    pub async fn get_edges(&self, source_id: &str) -> OntologyResult<Vec<CachedRelationship>> {
        let store = self.store.lock().await;
        Ok(store.load_active(source_id)?)
    }
}
