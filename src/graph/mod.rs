//! Schema graph assembly.
//!
//! Thin downstream consumer of the cache: combines a fresh entity list with
//! the cached relationship set into the node/edge payload the rendering
//! layer draws. No discovery logic lives here — only identity checks and
//! the layout policy.

mod assembler;

pub use assembler::GraphAssembler;

use serde::{Deserialize, Serialize};

use crate::discovery::{DiscoveryMethod, RelationshipType};

/// Rendering layout chosen for a graph.
///
/// A hierarchical (topologically layered) layout is preferred for clarity
/// but is infeasible once the edge set contains a cycle; cyclic graphs fall
/// back to force-directed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStrategy {
    Hierarchical,
    ForceDirected,
}

/// A table node in the rendered graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Globally unique node identity: `schema.table`.
    pub id: String,
    pub schema: String,
    pub table: String,
    /// Number of columns, for node sizing in the renderer.
    pub column_count: usize,
}

/// A relationship edge in the rendered graph.
///
/// Edge identity is `(source, target, relationship_type)`; parallel cached
/// rows with the same identity (composite keys) collapse into one edge
/// carrying the highest confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    pub source_column: String,
    pub target_column: String,
    pub relationship_type: RelationshipType,
    pub confidence: f64,
    pub discovery_method: DiscoveryMethod,
}

/// The assembled node/edge payload handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub layout: LayoutStrategy,
}
