use crate::conversions::numeric::{parse_decimal, parse_i32};
use crate::error::EtlResult;
use crate::schema::ColumnType;
use crate::types::Cell;

/// Converts a canonical text field into a [`Cell`] of the requested column type.
///
/// Text columns keep the value verbatim, including the empty string.
pub fn parse_cell_from_text(typ: ColumnType, s: &str) -> EtlResult<Cell> {
    match typ {
        ColumnType::Int => parse_i32(s).map(Cell::I32),
        ColumnType::Text => Ok(Cell::String(s.to_owned())),
        ColumnType::Decimal => parse_decimal(s).map(Cell::Numeric),
    }
}
