//! Parquet row source (enabled with `--features parquet`).
//!
//! The footer is read once in [`ParquetSource::open`]. Each row group is then
//! decoded on demand through the record API, which hands back one [`Field`]
//! per top-level column; those are mapped onto [`Cell`]s here so the exec
//! layer never sees a parquet type.

use std::fs::File;
use std::path::{Path, PathBuf};

use parquet::basic::{ConvertedType, LogicalType, Type as PhysicalType};
use parquet::file::metadata::RowGroupMetaData;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::serialized_reader::ReadOptionsBuilder;
use parquet::record::reader::RowIter;
use parquet::record::Field;
use parquet::schema::types::Type as SchemaType;

use pqload_core::{Cell, FieldDescriptor, SemanticType};

use crate::error::{Error, Result};
use crate::source::{ChunkStatus, RowGroupCursor, RowSource};

pub struct ParquetSource {
    path: PathBuf,
    fields: Vec<FieldDescriptor>,
    num_row_groups: usize,
    num_rows: u64,
}

impl ParquetSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = SerializedFileReader::new(File::open(&path)?)?;
        let metadata = reader.metadata();

        let fields = metadata
            .file_metadata()
            .schema_descr()
            .root_schema()
            .get_fields()
            .iter()
            .map(|f| FieldDescriptor::new(f.name(), semantic_type(f)))
            .collect();

        let num_rows = metadata.file_metadata().num_rows().max(0) as u64;
        tracing::debug!(
            file = %path.display(),
            row_groups = metadata.num_row_groups(),
            rows = num_rows,
            "parquet file opened"
        );

        Ok(Self {
            path,
            fields,
            num_row_groups: metadata.num_row_groups(),
            num_rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSource for ParquetSource {
    fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn num_row_groups(&self) -> usize {
        self.num_row_groups
    }

    fn num_rows(&self) -> Option<u64> {
        Some(self.num_rows)
    }

    fn open_row_group(&self, index: usize) -> Result<Box<dyn RowGroupCursor + '_>> {
        if index >= self.num_row_groups {
            return Err(Error::RowGroupOutOfRange {
                index,
                count: self.num_row_groups,
            });
        }

        // A reader restricted to one row group lets the row iterator own it.
        let options = ReadOptionsBuilder::new()
            .with_predicate(Box::new(move |_: &RowGroupMetaData, i: usize| i == index))
            .build();
        let reader = SerializedFileReader::new_with_options(File::open(&self.path)?, options)?;
        let rows = RowIter::from_file_into(Box::new(reader));

        Ok(Box::new(ParquetCursor {
            rows,
            width: self.fields.len(),
        }))
    }
}

struct ParquetCursor {
    rows: RowIter<'static>,
    width: usize,
}

impl RowGroupCursor for ParquetCursor {
    fn read_chunk(&mut self, max_rows: usize, out: &mut Vec<Vec<Cell>>) -> Result<ChunkStatus> {
        let mut rows = 0;
        while rows < max_rows {
            match self.rows.next() {
                Some(row) => {
                    let row = row?;
                    let mut cells = Vec::with_capacity(self.width);
                    cells.extend(row.into_columns().into_iter().map(|(_, f)| to_cell(f)));
                    out.push(cells);
                    rows += 1;
                }
                None => {
                    return Ok(ChunkStatus {
                        rows,
                        end_of_stream: true,
                    })
                }
            }
        }
        Ok(ChunkStatus {
            rows,
            end_of_stream: false,
        })
    }
}

/// Map a top-level schema field onto the three checked semantic types.
fn semantic_type(field: &SchemaType) -> SemanticType {
    if !field.is_primitive() {
        return SemanticType::Unsupported("GROUP".into());
    }

    let info = field.get_basic_info();
    let logical = info.logical_type();
    let converted = info.converted_type();

    match field.get_physical_type() {
        PhysicalType::BYTE_ARRAY
            if matches!(logical, Some(LogicalType::String))
                || converted == ConvertedType::UTF8 =>
        {
            SemanticType::Utf8String
        }
        PhysicalType::INT32
            if matches!(
                logical,
                None | Some(LogicalType::Integer {
                    bit_width: 32,
                    is_signed: true
                })
            ) && matches!(converted, ConvertedType::NONE | ConvertedType::INT_32) =>
        {
            SemanticType::Int32
        }
        PhysicalType::DOUBLE => SemanticType::Float64,
        physical => match logical {
            Some(l) => SemanticType::Unsupported(format!("{physical}({l:?})")),
            None => SemanticType::Unsupported(physical.to_string()),
        },
    }
}

fn to_cell(field: Field) -> Cell {
    match field {
        Field::Null => Cell::Null,
        Field::Str(s) => Cell::Utf8(s),
        Field::Bytes(b) => Cell::Bytes(b.data().to_vec()),
        Field::Int(i) => Cell::Int32(i),
        Field::Double(d) => Cell::Float64(d),
        other => Cell::Other(field_kind(&other).to_string()),
    }
}

fn field_kind(field: &Field) -> &'static str {
    match field {
        Field::Bool(_) => "BOOLEAN",
        Field::Byte(_) | Field::Short(_) => "INT32",
        Field::Long(_) => "INT64",
        Field::UByte(_) | Field::UShort(_) | Field::UInt(_) | Field::ULong(_) => "UNSIGNED",
        Field::Float(_) => "FLOAT",
        Field::Decimal(_) => "DECIMAL",
        Field::Date(_) => "DATE",
        Field::TimestampMillis(_) | Field::TimestampMicros(_) => "TIMESTAMP",
        Field::Group(_) => "GROUP",
        Field::ListInternal(_) => "LIST",
        Field::MapInternal(_) => "MAP",
        _ => "UNKNOWN",
    }
}
