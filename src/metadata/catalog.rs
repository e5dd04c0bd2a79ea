//! SQLite catalog introspection.
//!
//! Reads table and column inventory straight out of a SQLite database file
//! (`sqlite_master` plus `PRAGMA table_info`) and normalizes it into the
//! [`Entity`] shape at this boundary, so nothing downstream knows it came
//! from a SQL catalog.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};

use super::provider::{MetadataError, MetadataProvider, MetadataResult};
use super::types::{parse_declared_length, Column, Entity};

/// Provider backed by a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteCatalogProvider {
    path: PathBuf,
}

impl SqliteCatalogProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn introspect(&self) -> MetadataResult<Vec<Entity>> {
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| MetadataError::Unavailable(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .map_err(|e| MetadataError::Unavailable(e.to_string()))?;
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .and_then(|rows| rows.collect())
            .map_err(|e| MetadataError::Malformed(e.to_string()))?;

        let mut entities = Vec::with_capacity(tables.len());
        for table in tables {
            entities.push(read_table(&conn, &table)?);
        }
        Ok(entities)
    }
}

fn read_table(conn: &Connection, table: &str) -> MetadataResult<Entity> {
    // table_info takes an identifier, not a bind parameter
    let quoted = table.replace('"', "\"\"");
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info(\"{}\")", quoted))
        .map_err(|e| MetadataError::Unavailable(e.to_string()))?;

    let mut columns = Vec::new();
    let mut declared_key = Vec::new();
    let rows = stmt
        .query_map([], |row| {
            let name: String = row.get("name")?;
            let data_type: String = row.get("type")?;
            let notnull: bool = row.get("notnull")?;
            let pk: i64 = row.get("pk")?;
            Ok((name, data_type, notnull, pk))
        })
        .map_err(|e| MetadataError::Malformed(e.to_string()))?;

    for row in rows {
        let (name, data_type, notnull, pk) =
            row.map_err(|e| MetadataError::Malformed(e.to_string()))?;
        if pk > 0 {
            declared_key.push(name.clone());
        }
        columns.push(Column {
            length: parse_declared_length(&data_type),
            name,
            data_type,
            nullable: !notnull,
            primary_key: pk > 0,
        });
    }

    Ok(Entity {
        schema_name: "main".to_string(),
        table_name: table.to_string(),
        columns,
        declared_key,
    })
}

#[async_trait]
impl MetadataProvider for SqliteCatalogProvider {
    async fn list_entities(&self, _source_id: &str) -> MetadataResult<Vec<Entity>> {
        self.introspect()
    }
}
