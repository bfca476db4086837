//! Cell and value types flowing from the reader to the workers.
//!
//! A [`Cell`] is what the file reader decoded; a [`Value`] is what gets bound
//! to the insert statement. Conversion is total: every cell yields a value,
//! so rows always stay position-aligned to the column mapping.

use serde::{Deserialize, Serialize};

/// Decoded kind of one source cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Null,
    Utf8(String),
    /// Byte array without a string annotation.
    Bytes(Vec<u8>),
    Int32(i32),
    Float64(f64),
    /// Any other decoded kind; carries the kind name for diagnostics.
    Other(String),
}

/// A bound value.
///
/// `Unset` leaves the column untouched on write, which is not the same as
/// writing a null (a null writes a tombstone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Unset,
    Utf8String(String),
    Int32(i32),
    Float64(f64),
}

/// One row, position-aligned to the `ColumnMapping`.
pub type Row = Vec<Value>;

/// Result of converting one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Converted {
    Value(Value),
    /// The cell kind has no value mapping; the column is left unset.
    Skipped(Value),
}

impl Converted {
    pub fn into_value(self) -> Value {
        match self {
            Converted::Value(v) | Converted::Skipped(v) => v,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Converted::Skipped(_))
    }
}

impl Value {
    /// Convert a decoded cell by its kind. Nulls become `Unset`.
    pub fn from_cell(cell: Cell) -> Converted {
        match cell {
            Cell::Null => Converted::Value(Value::Unset),
            Cell::Utf8(s) => Converted::Value(Value::Utf8String(s)),
            Cell::Bytes(b) => Converted::Value(Value::Utf8String(
                String::from_utf8_lossy(&b).into_owned(),
            )),
            Cell::Int32(i) => Converted::Value(Value::Int32(i)),
            Cell::Float64(f) => Converted::Value(Value::Float64(f)),
            Cell::Other(_) => Converted::Skipped(Value::Unset),
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_cells_become_unset() {
        let v = Value::from_cell(Cell::Null);
        assert_eq!(v, Converted::Value(Value::Unset));
        assert!(!v.is_skipped());
    }

    #[test]
    fn typed_cells_keep_their_kind() {
        assert_eq!(
            Value::from_cell(Cell::Utf8("abc".into())).into_value(),
            Value::Utf8String("abc".into())
        );
        assert_eq!(Value::from_cell(Cell::Int32(-7)).into_value(), Value::Int32(-7));
        assert_eq!(
            Value::from_cell(Cell::Float64(2.5)).into_value(),
            Value::Float64(2.5)
        );
    }

    #[test]
    fn raw_bytes_render_as_string() {
        let v = Value::from_cell(Cell::Bytes(b"raw".to_vec())).into_value();
        assert_eq!(v, Value::Utf8String("raw".into()));
    }

    #[test]
    fn other_kinds_are_skipped_and_unset() {
        let v = Value::from_cell(Cell::Other("INT64".into()));
        assert!(v.is_skipped());
        assert!(v.into_value().is_unset());
    }
}
