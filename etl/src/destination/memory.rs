use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::bail;
use crate::destination::Destination;
use crate::error::{ErrorKind, EtlResult};
use crate::query::SelectStatement;
use crate::schema::TableSchema;
use crate::types::{Cell, TableRow};

/// A table held in memory, rows keyed and ordered by primary key.
#[derive(Debug, Clone)]
struct MemoryTable {
    schema: TableSchema,
    key_indices: Vec<usize>,
    rows: BTreeMap<Vec<Cell>, TableRow>,
}

impl MemoryTable {
    fn new(schema: &TableSchema) -> EtlResult<Self> {
        let mut key_indices = Vec::new();
        for key in schema.primary_key() {
            let Some(index) = schema.column_index(key) else {
                bail!(
                    ErrorKind::DestinationSchemaError,
                    "Primary key column is not declared",
                    format!("Table `{}` has no column `{key}`", schema.name)
                );
            };
            key_indices.push(index);
        }

        Ok(Self {
            schema: *schema,
            key_indices,
            rows: BTreeMap::new(),
        })
    }
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<&'static str, MemoryTable>,
    writes: usize,
    shutdown_calls: usize,
}

/// In-process destination following the CQL semantics the target tables rely on.
///
/// Writing to a table that was never created fails, rows with the same primary key
/// overwrite each other, and rows of a partition come back in ascending clustering order.
/// Selects must restrict the whole partition key and may restrict a prefix of the
/// clustering key. Used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDestination {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDestination {
    /// Creates a destination without any table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rows of `table` in primary key order, or `None` if it does not exist.
    pub async fn table_rows(&self, table: &str) -> Option<Vec<TableRow>> {
        let inner = self.inner.lock().await;
        inner
            .tables
            .get(table)
            .map(|table| table.rows.values().cloned().collect())
    }

    /// Returns the names of the existing tables, sorted.
    pub async fn table_names(&self) -> Vec<&'static str> {
        let inner = self.inner.lock().await;
        let mut names: Vec<_> = inner.tables.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of successful row writes since creation.
    pub async fn writes(&self) -> usize {
        self.inner.lock().await.writes
    }

    /// Returns how many times [`Destination::shutdown`] was called.
    pub async fn shutdown_calls(&self) -> usize {
        self.inner.lock().await.shutdown_calls
    }
}

impl Destination for MemoryDestination {
    fn name() -> &'static str {
        "memory"
    }

    async fn reset_table(&self, table: &TableSchema) -> EtlResult<()> {
        let memory_table = MemoryTable::new(table)?;

        let mut inner = self.inner.lock().await;
        inner.tables.insert(table.name, memory_table);

        info!(table = table.name, "reset table");

        Ok(())
    }

    async fn write_table_row(&self, table: &TableSchema, row: TableRow) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;

        let Some(memory_table) = inner.tables.get_mut(table.name) else {
            bail!(
                ErrorKind::DestinationTableMissing,
                "Table does not exist",
                format!("Table `{}` was not created", table.name)
            );
        };

        if row.len() != memory_table.schema.columns.len() {
            bail!(
                ErrorKind::DestinationQueryFailed,
                "Row does not match the table columns",
                format!(
                    "Table `{}` has {} columns, row has {} values",
                    table.name,
                    memory_table.schema.columns.len(),
                    row.len()
                )
            );
        }

        let partition_key_len = memory_table.schema.partition_key.len();
        let mut key = Vec::with_capacity(memory_table.key_indices.len());
        for (position, index) in memory_table.key_indices.iter().enumerate() {
            match row.get(*index) {
                Some(Cell::Null) | None => bail!(
                    ErrorKind::DestinationQueryFailed,
                    "Primary key value is null",
                    format!(
                        "Table `{}`, column `{}`",
                        table.name, memory_table.schema.columns[*index].name
                    )
                ),
                Some(cell) if position < partition_key_len && cell.as_str() == Some("") => bail!(
                    ErrorKind::DestinationQueryFailed,
                    "Partition key value is empty",
                    format!(
                        "Table `{}`, column `{}`",
                        table.name, memory_table.schema.columns[*index].name
                    )
                ),
                Some(cell) => key.push(cell.clone()),
            }
        }

        debug!(table = table.name, ?key, "writing row");
        memory_table.rows.insert(key, row);
        inner.writes += 1;

        Ok(())
    }

    async fn select_rows(&self, statement: &SelectStatement) -> EtlResult<Vec<TableRow>> {
        let inner = self.inner.lock().await;
        let table_name = statement.table.name;

        let Some(memory_table) = inner.tables.get(table_name) else {
            bail!(
                ErrorKind::DestinationTableMissing,
                "Table does not exist",
                format!("Table `{table_name}` was not created")
            );
        };
        let schema = &memory_table.schema;

        let restricted_columns: Vec<_> = statement.filters.iter().map(|(name, _)| *name).collect();
        let key_prefix: Vec<_> = schema.primary_key().take(restricted_columns.len()).collect();
        if restricted_columns.len() < schema.partition_key.len() || restricted_columns != key_prefix
        {
            bail!(
                ErrorKind::DestinationQueryFailed,
                "Select must restrict the partition key and a clustering key prefix",
                format!(
                    "Table `{table_name}` is keyed by ({}), select restricts ({})",
                    schema.primary_key().collect::<Vec<_>>().join(", "),
                    restricted_columns.join(", ")
                )
            );
        }

        let mut projection = Vec::with_capacity(statement.columns.len());
        for column in statement.columns {
            let Some(index) = schema.column_index(column) else {
                bail!(
                    ErrorKind::DestinationQueryFailed,
                    "Selected column does not exist",
                    format!("Table `{table_name}` has no column `{column}`")
                );
            };
            projection.push(index);
        }

        let prefix: Vec<&Cell> = statement.filter_values().collect();
        let rows = memory_table
            .rows
            .iter()
            .filter(|(key, _)| key.iter().zip(&prefix).all(|(a, b)| a == *b))
            .map(|(_, row)| {
                TableRow::new(
                    projection
                        .iter()
                        .map(|index| row.get(*index).cloned().unwrap_or(Cell::Null))
                        .collect(),
                )
            })
            .collect();

        Ok(rows)
    }

    async fn shutdown(&self) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;
        inner.shutdown_calls += 1;

        Ok(())
    }
}
