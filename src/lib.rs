//! # schemalens
//!
//! Browse a relational schema as an interactive graph. Many landscape
//! schemas declare no foreign keys, so the relationships worth drawing are
//! inferred from naming and typing conventions, persisted in a queryable
//! cache, and served to the graph layer on demand. Invalidation is
//! explicit: the cache stays put until an operator triggers a refresh.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          MetadataProvider (catalog / schema file)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │ Vec<Entity>
//!                          ▼ [discovery]
//! ┌─────────────────────────────────────────────────────────┐
//! │       DiscoveryEngine (rule table, scored candidates)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │ Vec<CandidateRelationship>
//!                          ▼ [refresh service]
//! ┌─────────────────────────────────────────────────────────┐
//! │     OntologyCacheStore (SQLite, atomic swap per source)  │
//! └─────────────────────────────────────────────────────────┘
//!                          │ get_edges / status
//!                          ▼ [query service]
//! ┌─────────────────────────────────────────────────────────┐
//! │      GraphAssembler (nodes, edges, layout strategy)      │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod service;
pub mod store;
pub mod web;

pub use error::{OntologyError, OntologyResult};
