//! Service-boundary error taxonomy.
//!
//! Every failure that crosses a service boundary (refresh, query, graph
//! assembly) is folded into one of these variants before it reaches a
//! caller. Module-internal errors (`MetadataError`, `StoreError`) carry the
//! underlying detail and convert into this type at the boundary.

use crate::metadata::MetadataError;
use crate::store::StoreError;

/// Result type for service-level operations.
pub type OntologyResult<T> = Result<T, OntologyError>;

/// Errors surfaced by the refresh/query services and the graph assembler.
#[derive(Debug, thiserror::Error)]
pub enum OntologyError {
    /// The metadata provider could not be reached or returned malformed
    /// data. The store has not been touched; readers keep serving the
    /// last-known-good cache.
    #[error("metadata for source '{source_id}' unavailable: {cause}")]
    MetadataUnavailable { source_id: String, cause: String },

    /// The persistence layer failed. For a refresh this means the
    /// transaction did not commit and the cache is unchanged.
    #[error("cache store failure: {0}")]
    StoreTransactionFailed(#[from] StoreError),

    /// An unknown or unconfigured source id was requested. Rejected before
    /// any store access.
    #[error("unknown source id: '{0}'")]
    InvalidSourceId(String),

    /// Two entities resolved to the same graph node id. A data-integrity
    /// bug in the upstream inventory; the assembler refuses to dedupe.
    #[error("duplicate node identity '{0}' in entity inventory")]
    DuplicateNodeIdentity(String),
}

impl OntologyError {
    /// Fold a provider error for `source_id` into the taxonomy.
    pub fn from_metadata(source_id: &str, err: MetadataError) -> Self {
        match err {
            MetadataError::UnknownSource(id) => OntologyError::InvalidSourceId(id),
            other => OntologyError::MetadataUnavailable {
                source_id: source_id.to_string(),
                cause: other.to_string(),
            },
        }
    }
}
