//! Refresh and query services.
//!
//! The refresh service is the cache's only writer; the query service is a
//! pure read path. Both share one store handle, and invalidation is
//! explicit: nothing here expires the cache on a timer — a stale cache is
//! served unchanged until an operator triggers a refresh, so the read path
//! has predictable latency.

mod query;
mod refresh;

pub use query::CacheQueryService;
pub use refresh::CacheRefreshService;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::store::OntologyCacheStore;

/// Shared handle to the ontology store.
///
/// All access serializes through this guard, which together with the
/// store's transactional swap gives readers an all-or-nothing view of a
/// refresh; concurrent refreshes serialize, last committed wins.
pub type SharedStore = Arc<Mutex<OntologyCacheStore>>;

/// Wrap a store for sharing between services.
pub fn shared(store: OntologyCacheStore) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Statistics returned by one refresh cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshResult {
    /// Inferred rows removed by the clear step.
    pub cleared: usize,
    /// Candidates the discovery pass produced.
    pub discovered: usize,
    /// Rows written to the cache.
    pub inserted: usize,
    /// Rows updated in place (always 0 under clear-then-reinsert).
    pub updated: usize,
    /// Manual rows left untouched.
    pub preserved: usize,
    /// Wall-clock time of the fetch-and-discover phase, in milliseconds.
    pub discovery_time_ms: f64,
}

/// Snapshot of cache health for one source partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    /// True when metadata exists and at least one relationship is cached.
    pub cache_valid: bool,
    /// Active relationships at or above the persistence threshold.
    pub total_relationships: usize,
    /// Subset with confidence >= 0.9.
    pub high_confidence: usize,
    /// Subset confirmed by a curator.
    pub manually_verified: usize,
    /// Completion time of the last discovery pass, if any.
    pub last_discovery: Option<DateTime<Utc>>,
}
