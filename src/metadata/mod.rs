//! Metadata providers.
//!
//! Providers supply the raw table/column/type inventory for a named data
//! source, normalized into one `Entity` shape at this boundary regardless
//! of where the metadata came from (SQL catalog, schema-description file,
//! in-memory fixture). Providers are strictly read-only.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    ProviderRegistry                      │
//! │   source_id ──► SqliteCatalogProvider (live catalog)     │
//! │             ──► SchemaFileProvider (JSON description)    │
//! │             ──► StaticProvider (fixtures)                │
//! └──────────────────────────────────────────────────────────┘
//!                          │ list_entities(source_id)
//!                          ▼
//!                   Vec<Entity>  (normalized, per-run snapshot)
//! ```

mod catalog;
mod descriptor;
mod provider;
mod types;

pub use catalog::SqliteCatalogProvider;
pub use descriptor::SchemaFileProvider;
pub use provider::{MetadataError, MetadataProvider, MetadataResult, ProviderRegistry, StaticProvider};
pub use types::{parse_declared_length, Column, Entity, TypeCategory};
