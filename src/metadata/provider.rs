//! MetadataProvider trait and the provider registry.
//!
//! A provider is a read-only supplier of the entity inventory for a named
//! data source. The discovery engine and the refresh service only ever see
//! the normalized [`Entity`] shape, never the provider's raw catalog.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::types::Entity;

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors from metadata providers.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// The requested source id is not configured.
    #[error("unknown source id: '{0}'")]
    UnknownSource(String),

    /// The source exists but could not be reached.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The source answered with data that does not normalize.
    #[error("malformed metadata: {0}")]
    Malformed(String),
}

/// Read-only supplier of entity inventories.
///
/// Implementations must be side-effect-free from the engine's perspective:
/// a `list_entities` call never mutates the underlying source.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fresh entity inventory for `source_id`.
    ///
    /// Called at the start of every refresh; results are never cached by
    /// the caller, so each call reflects the source's current shape.
    async fn list_entities(&self, source_id: &str) -> MetadataResult<Vec<Entity>>;
}

/// In-memory provider serving fixed inventories, for tests and demos.
#[derive(Debug, Default)]
pub struct StaticProvider {
    sources: HashMap<String, Vec<Entity>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixed inventory under `source_id`.
    pub fn with_source(mut self, source_id: &str, entities: Vec<Entity>) -> Self {
        self.sources.insert(source_id.to_string(), entities);
        self
    }
}

#[async_trait]
impl MetadataProvider for StaticProvider {
    async fn list_entities(&self, source_id: &str) -> MetadataResult<Vec<Entity>> {
        self.sources
            .get(source_id)
            .cloned()
            .ok_or_else(|| MetadataError::UnknownSource(source_id.to_string()))
    }
}

/// Dispatches by source id to the provider configured for it.
///
/// Unknown ids are rejected here, before any store access happens.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn MetadataProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` to serve `source_id`.
    pub fn register(&mut self, source_id: &str, provider: Arc<dyn MetadataProvider>) {
        self.providers.insert(source_id.to_string(), provider);
    }

    /// Whether a source id is configured.
    pub fn is_known(&self, source_id: &str) -> bool {
        self.providers.contains_key(source_id)
    }

    /// Configured source ids, sorted.
    pub fn known_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = self.providers.keys().cloned().collect();
        sources.sort();
        sources
    }
}

#[async_trait]
impl MetadataProvider for ProviderRegistry {
    async fn list_entities(&self, source_id: &str) -> MetadataResult<Vec<Entity>> {
        let provider = self
            .providers
            .get(source_id)
            .ok_or_else(|| MetadataError::UnknownSource(source_id.to_string()))?;
        provider.list_entities(source_id).await
    }
}
