//! Source and destination schema types. Pure data; no Parquet or CQL dependency here.
//!
//! The source side is described by [`FieldDescriptor`]s read from the file
//! footer; the destination side by [`ColumnMeta`] rows read from the
//! cluster's schema tables. [`crate::validate`] reconciles the two into a
//! [`ColumnMapping`] and an [`InsertTemplate`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic type of a source field.
///
/// Only the first three kinds take part in type checking; anything else is
/// carried as `Unsupported` with a human-readable type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemanticType {
    Utf8String,
    Int32,
    Float64,
    Unsupported(String),
}

impl SemanticType {
    /// The CQL type this semantic type must be stored in, if it is checked.
    pub fn cql_type(&self) -> Option<&'static str> {
        match self {
            SemanticType::Utf8String => Some("text"),
            SemanticType::Int32 => Some("int"),
            SemanticType::Float64 => Some("double"),
            SemanticType::Unsupported(_) => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, SemanticType::Unsupported(_))
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Utf8String => f.write_str("STRING"),
            SemanticType::Int32 => f.write_str("INT32"),
            SemanticType::Float64 => f.write_str("DOUBLE"),
            SemanticType::Unsupported(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub semantic_type: SemanticType,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
        }
    }
}

/// One destination column as reported by the cluster (`system_schema.columns`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    /// CQL type name, e.g. `text`, `int`, `double`, `list<text>`.
    pub cql_type: String,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, cql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cql_type: cql_type.into(),
        }
    }
}

/// One `(source field, destination column, type)` pair of the mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedColumn {
    pub source_field: String,
    pub dest_column: String,
    pub semantic_type: SemanticType,
    pub cql_type: String,
}

/// Canonical column order, identical to the source field order.
///
/// Built once during validation and shared read-only by every worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    columns: Vec<MappedColumn>,
}

impl ColumnMapping {
    pub(crate) fn new(columns: Vec<MappedColumn>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[MappedColumn] {
        &self.columns
    }

    pub fn dest_columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.dest_column.as_str())
    }
}

/// Insert statement with positional placeholders, in mapping order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertTemplate {
    pub keyspace: String,
    pub table: String,
    pub columns: Vec<String>,
    pub statement: String,
}

impl InsertTemplate {
    pub fn new(keyspace: &str, table: &str, mapping: &ColumnMapping) -> Self {
        let columns: Vec<String> = mapping.dest_columns().map(str::to_string).collect();
        let column_list = columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(",");
        let placeholders = vec!["?"; columns.len()].join(",");
        let statement = format!(
            "INSERT INTO {}.{} ({}) VALUES ({})",
            quote_identifier(keyspace),
            quote_identifier(table),
            column_list,
            placeholders
        );
        Self {
            keyspace: keyspace.to_string(),
            table: table.to_string(),
            columns,
            statement,
        }
    }

    pub fn arity(&self) -> usize {
        self.columns.len()
    }
}

/// Double-quote a CQL identifier so case and special characters survive.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(names: &[&str]) -> ColumnMapping {
        ColumnMapping::new(
            names
                .iter()
                .map(|n| MappedColumn {
                    source_field: n.to_string(),
                    dest_column: n.to_string(),
                    semantic_type: SemanticType::Int32,
                    cql_type: "int".into(),
                })
                .collect(),
        )
    }

    #[test]
    fn insert_template_lists_columns_and_placeholders() {
        let tpl = InsertTemplate::new("ks", "events", &mapping(&["id", "name", "score"]));
        assert_eq!(
            tpl.statement,
            r#"INSERT INTO "ks"."events" ("id","name","score") VALUES (?,?,?)"#
        );
        assert_eq!(tpl.arity(), 3);
    }

    #[test]
    fn quote_identifier_escapes_embedded_quotes() {
        assert_eq!(quote_identifier("MixedCase"), "\"MixedCase\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn semantic_type_display_matches_parquet_names() {
        assert_eq!(SemanticType::Utf8String.to_string(), "STRING");
        assert_eq!(SemanticType::Int32.to_string(), "INT32");
        assert_eq!(SemanticType::Float64.to_string(), "DOUBLE");
        assert_eq!(SemanticType::Unsupported("INT64".into()).to_string(), "INT64");
        assert_eq!(SemanticType::Float64.cql_type(), Some("double"));
        assert!(!SemanticType::Unsupported("BOOLEAN".into()).is_supported());
    }
}
