// tests/service/refresh_test.rs
use std::sync::Arc;

use async_trait::async_trait;
use schemalens::error::OntologyError;
use schemalens::metadata::{
    Column, Entity, MetadataError, MetadataProvider, MetadataResult, StaticProvider,
};
use schemalens::service::{shared, CacheQueryService, CacheRefreshService, SharedStore};
use schemalens::store::OntologyCacheStore;

fn column(name: &str, data_type: &str) -> Column {
    Column {
        name: name.to_string(),
        data_type: data_type.to_string(),
        length: None,
        nullable: true,
        primary_key: false,
    }
}

fn entity(table: &str, columns: Vec<Column>) -> Entity {
    Entity {
        schema_name: "main".to_string(),
        table_name: table.to_string(),
        columns,
        declared_key: vec![],
    }
}

fn landscape() -> Vec<Entity> {
    vec![
        entity("Supplier", vec![column("id", "INTEGER"), column("name", "TEXT")]),
        entity(
            "Invoice",
            vec![
                column("id", "INTEGER"),
                column("supplier_id", "INTEGER"),
                column("amount", "DECIMAL(10,2)"),
            ],
        ),
        entity(
            "Shipment",
            vec![
                column("id", "INTEGER"),
                column("ref_supplier_code", "VARCHAR(10)"),
            ],
        ),
    ]
}

fn store() -> SharedStore {
    shared(OntologyCacheStore::open_in_memory().unwrap())
}

fn services(
    provider: Arc<dyn MetadataProvider>,
) -> (CacheRefreshService, CacheQueryService) {
    let store = store();
    (
        CacheRefreshService::new(provider, store.clone()),
        CacheQueryService::new(store),
    )
}

/// Provider whose source always fails, for abort-path tests.
struct FailingProvider;

#[async_trait]
impl MetadataProvider for FailingProvider {
    async fn list_entities(&self, _source_id: &str) -> MetadataResult<Vec<Entity>> {
        Err(MetadataError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_refresh_populates_cache() {
    let provider = Arc::new(StaticProvider::new().with_source("sqlite", landscape()));
    let (refresh, query) = services(provider);

    let result = refresh.refresh("sqlite").await.unwrap();
    assert_eq!(result.discovered, 2);
    assert_eq!(result.inserted, 2);
    assert_eq!(result.cleared, 0);
    assert!(result.discovery_time_ms >= 0.0);

    let edges = query.get_edges("sqlite").await.unwrap();
    assert_eq!(edges.len(), 2);
    assert!(edges.iter().all(|e| e.confidence >= 0.5));
}

#[tokio::test]
async fn test_refresh_is_idempotent() {
    let provider = Arc::new(StaticProvider::new().with_source("sqlite", landscape()));
    let (refresh, query) = services(provider);

    let first = refresh.refresh("sqlite").await.unwrap();
    let edges_first = query.get_edges("sqlite").await.unwrap();

    let second = refresh.refresh("sqlite").await.unwrap();
    let edges_second = query.get_edges("sqlite").await.unwrap();

    assert_eq!(first.discovered, second.discovered);
    assert_eq!(second.cleared, first.inserted);
    assert_eq!(second.inserted, first.inserted);
    assert_eq!(second.updated, 0);

    // No duplicate accumulation: same relationship set both times
    assert_eq!(edges_first.len(), edges_second.len());
    for (a, b) in edges_first.iter().zip(edges_second.iter()) {
        assert_eq!(a.source_table, b.source_table);
        assert_eq!(a.source_column, b.source_column);
        assert_eq!(a.target_table, b.target_table);
        assert_eq!(a.target_column, b.target_column);
    }
}

#[tokio::test]
async fn test_refresh_with_zero_entities_clears_prior_cache() {
    let store = store();
    let populated = Arc::new(StaticProvider::new().with_source("sqlite", landscape()));
    let refresh = CacheRefreshService::new(populated, store.clone());
    let prior = refresh.refresh("sqlite").await.unwrap().inserted;
    assert!(prior > 0);

    let emptied = Arc::new(StaticProvider::new().with_source("sqlite", vec![]));
    let refresh = CacheRefreshService::new(emptied, store.clone());
    let result = refresh.refresh("sqlite").await.unwrap();

    assert_eq!(result.cleared, prior);
    assert_eq!(result.discovered, 0);
    assert_eq!(result.inserted, 0);

    let query = CacheQueryService::new(store);
    assert!(query.get_edges("sqlite").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_source_is_rejected_before_store_access() {
    let provider = Arc::new(StaticProvider::new().with_source("sqlite", landscape()));
    let (refresh, query) = services(provider);

    let err = refresh.refresh("hana").await.unwrap_err();
    assert!(matches!(err, OntologyError::InvalidSourceId(id) if id == "hana"));

    // Nothing was written for the bogus source
    let status = query.status("hana").await.unwrap();
    assert!(!status.cache_valid);
    assert_eq!(status.total_relationships, 0);
}

#[tokio::test]
async fn test_provider_failure_keeps_last_known_good_cache() {
    let store = store();
    let provider = Arc::new(StaticProvider::new().with_source("sqlite", landscape()));
    let refresh = CacheRefreshService::new(provider, store.clone());
    refresh.refresh("sqlite").await.unwrap();

    let failing = CacheRefreshService::new(Arc::new(FailingProvider), store.clone());
    let err = failing.refresh("sqlite").await.unwrap_err();
    assert!(matches!(err, OntologyError::MetadataUnavailable { .. }));

    // Readers still see the pre-failure cache, stale but valid
    let query = CacheQueryService::new(store);
    let status = query.status("sqlite").await.unwrap();
    assert!(status.cache_valid);
    assert_eq!(status.total_relationships, 2);
    assert_eq!(query.get_edges("sqlite").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_status_on_cold_cache() {
    let provider = Arc::new(StaticProvider::new().with_source("sqlite", landscape()));
    let (_refresh, query) = services(provider);

    let status = query.status("sqlite").await.unwrap();
    assert!(!status.cache_valid);
    assert_eq!(status.total_relationships, 0);
    assert_eq!(status.high_confidence, 0);
    assert_eq!(status.manually_verified, 0);
    assert!(status.last_discovery.is_none());
}

#[tokio::test]
async fn test_status_after_refresh() {
    let provider = Arc::new(StaticProvider::new().with_source("sqlite", landscape()));
    let (refresh, query) = services(provider);
    refresh.refresh("sqlite").await.unwrap();

    let status = query.status("sqlite").await.unwrap();
    assert!(status.cache_valid);
    // supplier_id (0.9) and ref_supplier_code (0.5)
    assert_eq!(status.total_relationships, 2);
    assert_eq!(status.high_confidence, 1);
    assert_eq!(status.manually_verified, 0);
    assert!(status.last_discovery.is_some());
}

#[tokio::test]
async fn test_refresh_partitions_are_independent() {
    let store = store();
    let provider = Arc::new(
        StaticProvider::new()
            .with_source("sqlite", landscape())
            .with_source(
                "hana",
                vec![
                    entity("VBAK", vec![column("vbeln", "NVARCHAR(10)")]),
                    entity(
                        "VBAP",
                        vec![
                            column("vbeln", "NVARCHAR(10)"),
                            column("posnr", "NVARCHAR(6)"),
                        ],
                    ),
                ],
            ),
    );
    let refresh = CacheRefreshService::new(provider, store.clone());
    refresh.refresh("sqlite").await.unwrap();
    refresh.refresh("hana").await.unwrap();

    let query = CacheQueryService::new(store);
    let sqlite_edges = query.get_edges("sqlite").await.unwrap();
    let hana_edges = query.get_edges("hana").await.unwrap();
    assert!(sqlite_edges.iter().all(|e| e.source_id == "sqlite"));
    assert!(hana_edges.iter().all(|e| e.source_id == "hana"));
}
