//! Shared fixtures for integration tests: Parquet files and matching tables.

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::{ArrayRef, Float64Array, Int32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use tempfile::TempDir;

use pqload_core::ColumnMeta;

pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// Write `rows` rows of `(name: string, age: int32, score: double)`.
///
/// Every `null_every`-th row (starting at row 0) has all three cells null;
/// 0 disables nulls.
pub fn write_people(
    dir: &Path,
    rows: usize,
    row_group_size: usize,
    null_every: usize,
) -> PathBuf {
    let is_null = |i: usize| null_every > 0 && i % null_every == 0;

    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, true),
        Field::new("age", DataType::Int32, true),
        Field::new("score", DataType::Float64, true),
    ]));
    let names: StringArray = (0..rows)
        .map(|i| (!is_null(i)).then(|| format!("person-{i}")))
        .collect();
    let ages: Int32Array = (0..rows)
        .map(|i| (!is_null(i)).then_some((i % 90) as i32))
        .collect();
    let scores: Float64Array = (0..rows)
        .map(|i| (!is_null(i)).then_some(i as f64 / 4.0))
        .collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(names) as ArrayRef,
            Arc::new(ages) as ArrayRef,
            Arc::new(scores) as ArrayRef,
        ],
    )
    .expect("build batch");

    let path = dir.join(format!("people-{rows}-{row_group_size}-{null_every}.parquet"));
    let props = WriterProperties::builder()
        .set_max_row_group_size(row_group_size.max(1))
        .build();
    let file = File::create(&path).expect("create parquet file");
    let mut writer = ArrowWriter::try_new(file, schema, Some(props)).expect("open writer");
    writer.write(&batch).expect("write batch");
    writer.close().expect("close writer");
    path
}

/// Destination columns matching [`write_people`], in a different order.
pub fn people_columns() -> Vec<ColumnMeta> {
    vec![
        ColumnMeta::new("score", "double"),
        ColumnMeta::new("age", "int"),
        ColumnMeta::new("name", "text"),
    ]
}
