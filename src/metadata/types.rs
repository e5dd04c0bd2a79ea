//! Normalized metadata shapes.
//!
//! Every provider, whatever its source (SQL catalog, schema-description
//! file, in-memory fixture), normalizes its inventory into the `Entity` /
//! `Column` shape defined here. Downstream code never branches on where the
//! metadata came from.

use serde::{Deserialize, Serialize};

use crate::discovery::inflection::singularize;

/// A column in a physical table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name as declared by the source.
    pub name: String,
    /// Declared type string (e.g. `INTEGER`, `NVARCHAR(40)`).
    pub data_type: String,
    /// Declared length, when the type carries one.
    pub length: Option<u32>,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Whether the source declared this column part of the primary key.
    pub primary_key: bool,
}

impl Column {
    /// Broad type category of this column's declared type.
    pub fn type_category(&self) -> TypeCategory {
        TypeCategory::parse(&self.data_type)
    }

    /// Whether this column's type can plausibly reference `other`.
    ///
    /// Categories must agree (numeric↔numeric, text↔text); lengths need not
    /// match. Two columns of unrecognized category are only compatible when
    /// their raw declared types are identical.
    pub fn type_compatible(&self, other: &Column) -> bool {
        let (a, b) = (self.type_category(), other.type_category());
        if a == TypeCategory::Other || b == TypeCategory::Other {
            return self.data_type.eq_ignore_ascii_case(&other.data_type);
        }
        a == b
    }
}

/// A table-like unit supplied by a metadata provider.
///
/// Immutable snapshot for one discovery run; entities are re-read from the
/// source on every run and never cached themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Owning schema (may be empty for schema-less sources).
    pub schema_name: String,
    /// Table name.
    pub table_name: String,
    /// Column inventory in declaration order.
    pub columns: Vec<Column>,
    /// Key columns declared by the source catalog, if any.
    #[serde(default)]
    pub declared_key: Vec<String>,
}

impl Entity {
    /// Node identity: `schema.table`, or just `table` when the schema is
    /// empty. Must be globally unique within one discovery run.
    pub fn qualified_name(&self) -> String {
        if self.schema_name.is_empty() {
            self.table_name.clone()
        } else {
            format!("{}.{}", self.schema_name, self.table_name)
        }
    }

    /// Look up a column by name, case-insensitively.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// The discoverable key columns of this entity.
    ///
    /// Catalog-declared keys win. Without a declaration, fall back to
    /// convention: a column named `id`, else `<singular table>_id` or
    /// `<singular table>id` (case-insensitive). Returns an empty slice-like
    /// vec when nothing qualifies; such tables produce no exact-match
    /// candidates but still participate in the name rules.
    pub fn key_columns(&self) -> Vec<&Column> {
        let declared: Vec<&Column> = self
            .declared_key
            .iter()
            .filter_map(|k| self.column(k))
            .collect();
        if !declared.is_empty() {
            return declared;
        }

        let flagged: Vec<&Column> = self.columns.iter().filter(|c| c.primary_key).collect();
        if !flagged.is_empty() {
            return flagged;
        }

        if let Some(id) = self.column("id") {
            return vec![id];
        }

        let singular = singularize(&self.table_name);
        for candidate in [format!("{}_id", singular), format!("{}id", singular)] {
            if let Some(col) = self.column(&candidate) {
                return vec![col];
            }
        }

        Vec::new()
    }

    /// Whether `name` is one of this entity's discoverable key columns.
    pub fn is_key_column(&self, name: &str) -> bool {
        self.key_columns()
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Broad type categories used for compatibility checks.
///
/// Declared types are mapped onto these buckets so that e.g. `BIGINT` and
/// `DECIMAL(10,2)` count as compatible while `INTEGER` and `VARCHAR(10)`
/// do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// Integer, decimal and floating types.
    Numeric,
    /// Character and text types.
    Text,
    /// Date, time and timestamp types.
    Temporal,
    /// Boolean types.
    Boolean,
    /// Anything unrecognized (vendor-specific types land here).
    Other,
}

impl TypeCategory {
    /// Categorize a declared type string, ignoring case and any length or
    /// precision suffix.
    pub fn parse(declared: &str) -> Self {
        let base = declared
            .split(['(', ' '])
            .next()
            .unwrap_or(declared)
            .to_ascii_lowercase();

        match base.as_str() {
            "int" | "integer" | "bigint" | "smallint" | "tinyint" | "mediumint" | "decimal"
            | "numeric" | "number" | "float" | "double" | "real" | "serial" | "bigserial" => {
                TypeCategory::Numeric
            }
            "char" | "varchar" | "nvarchar" | "nchar" | "text" | "clob" | "string"
            | "character" => TypeCategory::Text,
            "date" | "time" | "datetime" | "timestamp" | "timestamptz" => TypeCategory::Temporal,
            "bool" | "boolean" => TypeCategory::Boolean,
            _ => TypeCategory::Other,
        }
    }
}

/// Extract the declared length from a type string like `VARCHAR(40)`.
pub fn parse_declared_length(declared: &str) -> Option<u32> {
    let open = declared.find('(')?;
    let close = declared[open..].find(')')? + open;
    declared[open + 1..close]
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}
