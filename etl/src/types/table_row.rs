use crate::types::Cell;

/// A row destined for, or read back from, one target table.
///
/// Values are ordered to match the column list of the table schema or lookup that produced
/// the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    values: Vec<Cell>,
}

impl TableRow {
    /// Creates a row from values ordered like the target columns.
    pub fn new(values: Vec<Cell>) -> Self {
        Self { values }
    }

    /// Returns the row values in column order.
    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    /// Returns the value at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.values.get(index)
    }

    /// Returns the number of values in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when the row holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the row and returns its values in column order.
    pub fn into_values(self) -> Vec<Cell> {
        self.values
    }
}
