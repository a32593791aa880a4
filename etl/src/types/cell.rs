use std::fmt;

use bigdecimal::BigDecimal;

/// A single typed column value.
///
/// Only the CQL types used by the target tables are represented. Cells are totally ordered
/// so they can key in-memory partitions the way the store orders clustering columns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cell {
    Null,
    I32(i32),
    String(String),
    Numeric(BigDecimal),
}

impl Cell {
    /// Returns the integer value, if this cell holds one.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Cell::I32(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text value, if this cell holds one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the decimal value, if this cell holds one.
    pub fn as_numeric(&self) -> Option<&BigDecimal> {
        match self {
            Cell::Numeric(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the CQL type name of the value, `"null"` for [`Cell::Null`].
    pub fn type_name(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::I32(_) => "int",
            Cell::String(_) => "text",
            Cell::Numeric(_) => "decimal",
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("null"),
            Cell::I32(value) => write!(f, "{value}"),
            Cell::String(value) => f.write_str(value),
            Cell::Numeric(value) => write!(f, "{value}"),
        }
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::I32(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::String(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::String(value.to_owned())
    }
}

impl From<BigDecimal> for Cell {
    fn from(value: BigDecimal) -> Self {
        Cell::Numeric(value)
    }
}
