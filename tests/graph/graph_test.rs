// tests/graph/graph_test.rs
use std::sync::Arc;

use schemalens::error::OntologyError;
use schemalens::graph::{GraphAssembler, LayoutStrategy};
use schemalens::metadata::{Column, Entity, StaticProvider};
use schemalens::service::{shared, CacheQueryService, CacheRefreshService};
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

fn entity(schema: &str, table: &str, columns: Vec<Column>) -> Entity {
    Entity {
        schema_name: schema.to_string(),
        table_name: table.to_string(),
        columns,
        declared_key: vec![],
    }
}

#[tokio::test]
async fn test_end_to_end_acyclic_graph() {
    let entities = vec![
        entity(
            "main",
            "Supplier",
            vec![column("id", "INTEGER"), column("name", "TEXT")],
        ),
        entity(
            "main",
            "Invoice",
            vec![column("id", "INTEGER"), column("supplier_id", "INTEGER")],
        ),
    ];
    let provider = Arc::new(StaticProvider::new().with_source("sqlite", entities.clone()));
    let store = shared(OntologyCacheStore::open_in_memory().unwrap());
    let refresh = CacheRefreshService::new(provider, store.clone());
    let query = CacheQueryService::new(store);

    refresh.refresh("sqlite").await.unwrap();
    let edges = query.get_edges("sqlite").await.unwrap();
    let graph = GraphAssembler::new().assemble(&entities, &edges).unwrap();

    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.layout, LayoutStrategy::Hierarchical);

    let edge = &graph.edges[0];
    assert_eq!(edge.source, "main.Invoice");
    assert_eq!(edge.target, "main.Supplier");
    assert_eq!(edge.source_column, "supplier_id");
    assert_eq!(edge.target_column, "id");
}

#[tokio::test]
async fn test_end_to_end_cyclic_graph_uses_force_directed() {
    // Employee references Department, Department's manager references
    // Employee: hierarchical layering is infeasible.
    let entities = vec![
        entity(
            "main",
            "Employee",
            vec![column("id", "INTEGER"), column("department_id", "INTEGER")],
        ),
        entity(
            "main",
            "Department",
            vec![column("id", "INTEGER"), column("employee_id", "INTEGER")],
        ),
    ];
    let provider = Arc::new(StaticProvider::new().with_source("sqlite", entities.clone()));
    let store = shared(OntologyCacheStore::open_in_memory().unwrap());
    let refresh = CacheRefreshService::new(provider, store.clone());
    let query = CacheQueryService::new(store);

    refresh.refresh("sqlite").await.unwrap();
    let edges = query.get_edges("sqlite").await.unwrap();
    assert_eq!(edges.len(), 2);

    let graph = GraphAssembler::new().assemble(&entities, &edges).unwrap();
    assert_eq!(graph.layout, LayoutStrategy::ForceDirected);
}

#[test]
fn test_duplicate_node_identity_raises() {
    let entities = vec![
        entity("main", "Order", vec![column("id", "INTEGER")]),
        entity("main", "Order", vec![column("id", "INTEGER")]),
    ];
    let err = GraphAssembler::new().assemble(&entities, &[]).unwrap_err();
    assert!(matches!(
        err,
        OntologyError::DuplicateNodeIdentity(id) if id == "main.Order"
    ));
}

#[test]
fn test_cross_schema_order_tables_are_distinct_nodes() {
    let entities = vec![
        entity("sales", "Order", vec![column("id", "INTEGER")]),
        entity("archive", "Order", vec![column("id", "INTEGER")]),
    ];
    let graph = GraphAssembler::new().assemble(&entities, &[]).unwrap();
    let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["sales.Order", "archive.Order"]);
}
