use std::future::Future;

use crate::error::EtlResult;
use crate::query::SelectStatement;
use crate::schema::TableSchema;
use crate::types::TableRow;

/// A store holding the denormalized target tables.
///
/// Implementations own one session for their whole lifetime. Values always travel as bound
/// parameters, never as part of statement text.
///
/// Errors of kind [`crate::error::ErrorKind::DestinationConnectionFailed`] mean the session
/// is unusable. Any other write error is taken to concern the single row being written.
pub trait Destination {
    /// Returns the name of the destination.
    fn name() -> &'static str;

    /// Drops `table` if it exists and creates it again, empty.
    ///
    /// Resetting an already reset table leaves the same empty table behind.
    fn reset_table(&self, table: &TableSchema) -> impl Future<Output = EtlResult<()>> + Send;

    /// Inserts `row` into `table`, overwriting any row with the same primary key.
    ///
    /// The row values follow the column order of `table`.
    fn write_table_row(
        &self,
        table: &TableSchema,
        row: TableRow,
    ) -> impl Future<Output = EtlResult<()>> + Send;

    /// Runs a single-partition select and returns the matching rows in clustering order.
    ///
    /// Returned row values follow [`SelectStatement::columns`].
    fn select_rows(
        &self,
        statement: &SelectStatement,
    ) -> impl Future<Output = EtlResult<Vec<TableRow>>> + Send;

    /// Releases the session.
    ///
    /// The default implementation is a no-op.
    fn shutdown(&self) -> impl Future<Output = EtlResult<()>> + Send {
        async { Ok(()) }
    }
}
