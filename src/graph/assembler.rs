//! Graph assembly from entities plus cached edges.

use std::collections::HashMap;

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::{OntologyError, OntologyResult};
use crate::metadata::Entity;
use crate::store::CachedRelationship;

use super::{GraphEdge, GraphNode, LayoutStrategy, SchemaGraph};

/// Builds the rendering payload from an entity inventory and the active
/// relationship set.
#[derive(Debug, Default)]
pub struct GraphAssembler;

impl GraphAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assemble nodes and edges, and pick the layout strategy.
    ///
    /// Two entities resolving to the same `schema.table` id are a
    /// data-integrity bug in the inventory; the assembler refuses to
    /// deduplicate and raises instead, because silently dropping one node
    /// renders a wrong picture. Cached edges pointing at tables absent
    /// from the current inventory are skipped with a warning (the cache
    /// may be stale relative to the schema).
    pub fn assemble(
        &self,
        entities: &[Entity],
        relationships: &[CachedRelationship],
    ) -> OntologyResult<SchemaGraph> {
        let mut graph: DiGraph<String, f64> = DiGraph::new();
        let mut index_by_id: HashMap<String, NodeIndex> = HashMap::new();
        let mut nodes = Vec::with_capacity(entities.len());

        for entity in entities {
            let id = entity.qualified_name();
            if index_by_id.contains_key(&id) {
                return Err(OntologyError::DuplicateNodeIdentity(id));
            }
            let index = graph.add_node(id.clone());
            index_by_id.insert(id.clone(), index);
            nodes.push(GraphNode {
                id,
                schema: entity.schema_name.clone(),
                table: entity.table_name.clone(),
                column_count: entity.columns.len(),
            });
        }

        // Collapse parallel rows onto edge identity (source, target, type),
        // keeping the highest-confidence representative.
        let mut edges: HashMap<(String, String, String), GraphEdge> = HashMap::new();
        for rel in relationships {
            let (Some(&from), Some(&to)) = (
                index_by_id.get(&rel.source_table),
                index_by_id.get(&rel.target_table),
            ) else {
                log::warn!(
                    "skipping cached edge {}.{} -> {}.{}: endpoint not in current inventory",
                    rel.source_table,
                    rel.source_column,
                    rel.target_table,
                    rel.target_column
                );
                continue;
            };

            let identity = (
                rel.source_table.clone(),
                rel.target_table.clone(),
                rel.relationship_type.as_str().to_string(),
            );
            let replace = edges
                .get(&identity)
                .is_none_or(|existing| rel.confidence > existing.confidence);
            if replace {
                edges.insert(
                    identity,
                    GraphEdge {
                        source: rel.source_table.clone(),
                        target: rel.target_table.clone(),
                        source_column: rel.source_column.clone(),
                        target_column: rel.target_column.clone(),
                        relationship_type: rel.relationship_type,
                        confidence: rel.confidence,
                        discovery_method: rel.discovery_method,
                    },
                );
            }
            graph.add_edge(from, to, rel.confidence);
        }

        let layout = if is_cyclic_directed(&graph) {
            LayoutStrategy::ForceDirected
        } else {
            LayoutStrategy::Hierarchical
        };

        let mut edges: Vec<GraphEdge> = edges.into_values().collect();
        edges.sort_by(|a, b| {
            (&a.source, &a.target, a.relationship_type.as_str())
                .cmp(&(&b.source, &b.target, b.relationship_type.as_str()))
        });

        Ok(SchemaGraph {
            nodes,
            edges,
            layout,
        })
    }
}
