//! Schema-description file provider.
//!
//! Landscape schemas are often distributed as metadata documents rather
//! than live catalogs. This provider reads a JSON description of the form
//!
//! ```json
//! {
//!   "entities": [
//!     {
//!       "schema": "sap",
//!       "table": "VBAK",
//!       "key": ["VBELN"],
//!       "columns": [
//!         { "name": "VBELN", "type": "NVARCHAR(10)", "nullable": false },
//!         { "name": "KUNNR", "type": "NVARCHAR(10)" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! and normalizes it into the same [`Entity`] shape the catalog provider
//! produces, so the discovery engine never branches on source kind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::provider::{MetadataError, MetadataProvider, MetadataResult};
use super::types::{parse_declared_length, Column, Entity};

/// Provider backed by a JSON schema-description document.
#[derive(Debug, Clone)]
pub struct SchemaFileProvider {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    entities: Vec<EntityDoc>,
}

#[derive(Debug, Deserialize)]
struct EntityDoc {
    #[serde(default)]
    schema: String,
    table: String,
    #[serde(default)]
    key: Vec<String>,
    #[serde(default)]
    columns: Vec<ColumnDoc>,
}

#[derive(Debug, Deserialize)]
struct ColumnDoc {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
    #[serde(default = "default_nullable")]
    nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl SchemaFileProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn load(&self) -> MetadataResult<Vec<Entity>> {
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| MetadataError::Unavailable(format!("{}: {}", self.path.display(), e)))?;
        let doc: Document =
            serde_json::from_str(&raw).map_err(|e| MetadataError::Malformed(e.to_string()))?;

        Ok(doc
            .entities
            .into_iter()
            .map(|e| {
                let key = e.key;
                let columns = e
                    .columns
                    .into_iter()
                    .map(|c| Column {
                        length: parse_declared_length(&c.data_type),
                        primary_key: key.iter().any(|k| k.eq_ignore_ascii_case(&c.name)),
                        name: c.name,
                        data_type: c.data_type,
                        nullable: c.nullable,
                    })
                    .collect();
                Entity {
                    schema_name: e.schema,
                    table_name: e.table,
                    columns,
                    declared_key: key,
                }
            })
            .collect())
    }
}

#[async_trait]
impl MetadataProvider for SchemaFileProvider {
    async fn list_entities(&self, _source_id: &str) -> MetadataResult<Vec<Entity>> {
        self.load()
    }
}
