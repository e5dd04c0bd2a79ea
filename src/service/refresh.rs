//! The cache refresh service.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::discovery::{thresholds, DiscoveryConfig, DiscoveryEngine};
use crate::error::{OntologyError, OntologyResult};
use crate::metadata::MetadataProvider;

use super::{RefreshResult, SharedStore};

/// Orchestrates one full recompute-and-swap cycle.
///
/// The only writer of the ontology store. A refresh fetches a fresh entity
/// inventory, runs discovery, swaps the inferred relationship set inside a
/// store transaction, and stamps the cache metadata. Provider failures
/// abort before the store is touched, so readers keep the previous cache
/// (stale but valid); store failures roll back to the pre-refresh state.
pub struct CacheRefreshService {
    provider: Arc<dyn MetadataProvider>,
    store: SharedStore,
    engine: DiscoveryEngine,
    min_confidence: f64,
}

impl CacheRefreshService {
    pub fn new(provider: Arc<dyn MetadataProvider>, store: SharedStore) -> Self {
        Self::with_min_confidence(provider, store, thresholds::MIN_PERSIST)
    }

    /// Service with a custom persistence cutoff. The same threshold gates
    /// both the engine's output and the store's swap.
    pub fn with_min_confidence(
        provider: Arc<dyn MetadataProvider>,
        store: SharedStore,
        min_confidence: f64,
    ) -> Self {
        let engine =
            DiscoveryEngine::with_config(DiscoveryConfig::default().with_min_confidence(min_confidence));
        Self {
            provider,
            store,
            engine,
            min_confidence,
        }
    }

    /// Run one refresh cycle for `source_id`.
    ///
    /// Idempotent: with an unchanged schema, a second run discovers the
    /// same candidate set and reports `cleared = N, inserted = N,
    /// updated = 0` with no duplicate accumulation.
    pub async fn refresh(&self, source_id: &str) -> OntologyResult<RefreshResult> {
        let started = Instant::now();

        let entities = self
            .provider
            .list_entities(source_id)
            .await
            .map_err(|e| {
                log::error!("refresh aborted for '{}': metadata fetch failed: {}", source_id, e);
                OntologyError::from_metadata(source_id, e)
            })?;

        let candidates = self.engine.discover(&entities);
        let discovered = candidates.len();
        let discovery_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        let mut store = self.store.lock().await;
        let stats = store
            .replace_inferred(source_id, &candidates, self.min_confidence)
            .map_err(|e| {
                log::error!(
                    "refresh failed for '{}': cache swap did not commit: {}",
                    source_id,
                    e
                );
                OntologyError::from(e)
            })?;
        store.set_metadata(source_id, Utc::now(), discovery_time_ms)?;

        log::info!(
            "refreshed '{}': {} entities, {} discovered, {} inserted, {} cleared, {} preserved in {:.1}ms",
            source_id,
            entities.len(),
            discovered,
            stats.inserted,
            stats.cleared,
            stats.preserved,
            discovery_time_ms
        );

        Ok(RefreshResult {
            cleared: stats.cleared,
            discovered,
            inserted: stats.inserted,
            updated: stats.updated,
            preserved: stats.preserved,
            discovery_time_ms,
        })
    }
}
