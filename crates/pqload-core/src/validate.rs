//! Schema cross-validation between the source file and the destination table.
//!
//! Only three pairings are type checked: `STRING ↔ text`, `INT32 ↔ int` and
//! `DOUBLE ↔ double`. A field of one of those three source types must land in
//! the matching column kind. A field of any other source type is recorded as
//! unchecked and, unless `strict` is set, allowed through.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::schema::{
    ColumnMapping, ColumnMeta, FieldDescriptor, InsertTemplate, MappedColumn, SemanticType,
};

/// A source/destination pair whose types were not compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncheckedPair {
    pub column: String,
    pub source_type: String,
    pub destination_type: String,
}

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub mapping: ColumnMapping,
    pub template: InsertTemplate,
    pub unchecked: Vec<UncheckedPair>,
}

/// Destination kinds that take part in type checking.
fn checked_kind(cql_type: &str) -> Option<&'static str> {
    match cql_type.trim().to_ascii_lowercase().as_str() {
        "text" | "varchar" => Some("text"),
        "int" => Some("int"),
        "double" => Some("double"),
        _ => None,
    }
}

/// Reconcile `fields` (source order) with `columns` (any order).
///
/// The returned mapping and template follow source field order.
pub fn validate_schema(
    keyspace: &str,
    table: &str,
    fields: &[FieldDescriptor],
    columns: &[ColumnMeta],
    strict: bool,
) -> Result<ValidationOutcome> {
    if fields.len() != columns.len() {
        return Err(Error::SchemaMismatch {
            source_fields: fields.len(),
            destination_columns: columns.len(),
        });
    }

    let by_name: HashMap<&str, &ColumnMeta> =
        columns.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut mapped = Vec::with_capacity(fields.len());
    let mut unchecked = Vec::new();

    for field in fields {
        let column = by_name
            .get(field.name.as_str())
            .ok_or_else(|| Error::MissingColumn(field.name.clone()))?;

        match field.semantic_type.cql_type() {
            Some(expected) => {
                if checked_kind(&column.cql_type) != Some(expected) {
                    return Err(Error::TypeMismatch {
                        column: field.name.clone(),
                        source_type: field.semantic_type.to_string(),
                        destination_type: column.cql_type.clone(),
                    });
                }
            }
            None => {
                if strict {
                    return Err(Error::UnsupportedType {
                        column: field.name.clone(),
                        source_type: field.semantic_type.to_string(),
                        destination_type: column.cql_type.clone(),
                    });
                }
                tracing::warn!(
                    column = %field.name,
                    source_type = %field.semantic_type,
                    destination_type = %column.cql_type,
                    "type check skipped for unsupported pair"
                );
                unchecked.push(UncheckedPair {
                    column: field.name.clone(),
                    source_type: field.semantic_type.to_string(),
                    destination_type: column.cql_type.clone(),
                });
            }
        }

        mapped.push(MappedColumn {
            source_field: field.name.clone(),
            dest_column: column.name.clone(),
            semantic_type: field.semantic_type.clone(),
            cql_type: column.cql_type.clone(),
        });
    }

    let mapping = ColumnMapping::new(mapped);
    let template = InsertTemplate::new(keyspace, table, &mapping);

    Ok(ValidationOutcome {
        mapping,
        template,
        unchecked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("name", SemanticType::Utf8String),
            FieldDescriptor::new("age", SemanticType::Int32),
            FieldDescriptor::new("score", SemanticType::Float64),
        ]
    }

    fn columns() -> Vec<ColumnMeta> {
        // Deliberately not in source order.
        vec![
            ColumnMeta::new("score", "double"),
            ColumnMeta::new("name", "text"),
            ColumnMeta::new("age", "int"),
        ]
    }

    #[test]
    fn matching_schema_keeps_source_order() {
        let out = validate_schema("ks", "people", &fields(), &columns(), false).unwrap();
        let order: Vec<&str> = out.mapping.dest_columns().collect();
        assert_eq!(order, vec!["name", "age", "score"]);
        assert_eq!(out.template.columns, vec!["name", "age", "score"]);
        assert!(out.unchecked.is_empty());
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let mut cols = columns();
        cols.pop();
        let err = validate_schema("ks", "people", &fields(), &cols, false).unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaMismatch {
                source_fields: 3,
                destination_columns: 2
            }
        ));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let cols = vec![
            ColumnMeta::new("name", "text"),
            ColumnMeta::new("age", "double"),
            ColumnMeta::new("score", "double"),
        ];
        let err = validate_schema("ks", "people", &fields(), &cols, false).unwrap_err();
        match err {
            Error::TypeMismatch {
                column,
                source_type,
                destination_type,
            } => {
                assert_eq!(column, "age");
                assert_eq!(source_type, "INT32");
                assert_eq!(destination_type, "double");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn varchar_counts_as_text() {
        let cols = vec![
            ColumnMeta::new("name", "varchar"),
            ColumnMeta::new("age", "int"),
            ColumnMeta::new("score", "double"),
        ];
        assert!(validate_schema("ks", "people", &fields(), &cols, false).is_ok());
    }

    #[test]
    fn unsupported_source_types_are_skipped_unless_strict() {
        let fields = vec![
            FieldDescriptor::new("id", SemanticType::Unsupported("INT64".into())),
            FieldDescriptor::new("tags", SemanticType::Unsupported("LIST".into())),
        ];
        let cols = vec![
            ColumnMeta::new("id", "bigint"),
            ColumnMeta::new("tags", "list<text>"),
        ];

        let out = validate_schema("ks", "t", &fields, &cols, false).unwrap();
        assert_eq!(out.unchecked.len(), 2);
        assert_eq!(out.unchecked[0].column, "id");
        assert_eq!(out.unchecked[1].destination_type, "list<text>");

        let err = validate_schema("ks", "t", &fields, &cols, true).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { ref column, .. } if column == "id"));
    }

    #[test]
    fn checked_source_type_into_other_column_kind_is_rejected() {
        for cql in ["bigint", "list<text>", "blob"] {
            let fields = vec![FieldDescriptor::new("name", SemanticType::Utf8String)];
            let cols = vec![ColumnMeta::new("name", cql)];
            let err = validate_schema("ks", "t", &fields, &cols, false).unwrap_err();
            match err {
                Error::TypeMismatch {
                    column,
                    source_type,
                    destination_type,
                } => {
                    assert_eq!(column, "name");
                    assert_eq!(source_type, "STRING");
                    assert_eq!(destination_type, cql);
                }
                other => panic!("unexpected error for {cql}: {other}"),
            }
        }

        let fields = vec![FieldDescriptor::new("score", SemanticType::Float64)];
        let cols = vec![ColumnMeta::new("score", "float")];
        assert!(matches!(
            validate_schema("ks", "t", &fields, &cols, false),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn renamed_column_is_reported_missing() {
        let cols = vec![
            ColumnMeta::new("full_name", "text"),
            ColumnMeta::new("age", "int"),
            ColumnMeta::new("score", "double"),
        ];
        let err = validate_schema("ks", "people", &fields(), &cols, false).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "name"));
    }
}
