//! Projection of canonical records into the target tables.
//!
//! Each table is loaded on its own: every canonical record is coerced into the table's
//! column layout and written as one row. Failures of a single record are logged and
//! counted, a lost connection stops the table being loaded and nothing else.

use tracing::{error, info, warn};

use crate::canonical::CanonicalRecord;
use crate::conversions::text::parse_cell_from_text;
use crate::destination::Destination;
use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::schema::TableSchema;
use crate::types::TableRow;

/// Outcome of loading one target table.
///
/// `attempted` counts the records taken from the canonical set. A record that hit a lost
/// connection is attempted but counted in neither failure bucket, the error is kept in
/// `aborted` instead.
#[derive(Debug, Clone)]
pub struct TableLoadReport {
    pub table: &'static str,
    pub attempted: usize,
    pub succeeded: usize,
    pub conversion_failures: usize,
    pub write_failures: usize,
    pub aborted: Option<EtlError>,
}

impl TableLoadReport {
    fn new(table: &'static str) -> Self {
        Self {
            table,
            attempted: 0,
            succeeded: 0,
            conversion_failures: 0,
            write_failures: 0,
            aborted: None,
        }
    }

    /// Returns the number of attempted records that were not written.
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }

    /// Returns `true` if every record of the canonical set was written.
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none() && self.failed() == 0
    }
}

/// Builds the row of `table` for `record`, coercing each column to its declared type.
pub fn project_record(table: &TableSchema, record: &CanonicalRecord) -> EtlResult<TableRow> {
    let values = table
        .columns
        .iter()
        .map(|column| parse_cell_from_text(column.typ, record.field(column.source)))
        .collect::<EtlResult<Vec<_>>>()?;

    Ok(TableRow::new(values))
}

/// Writes one row per canonical record into `table`.
///
/// Never fails as a whole: conversion and write failures are counted per record and a
/// connection failure ends the table early, all reported in the returned
/// [`TableLoadReport`].
pub async fn project_table<D>(
    destination: &D,
    table: &TableSchema,
    records: &[CanonicalRecord],
) -> TableLoadReport
where
    D: Destination,
{
    let mut report = TableLoadReport::new(table.name);

    for (index, record) in records.iter().enumerate() {
        report.attempted += 1;

        let row = match project_record(table, record) {
            Ok(row) => row,
            Err(err) => {
                warn!(table = table.name, record = index, error = %err, "skipping record that cannot be converted");
                report.conversion_failures += 1;
                continue;
            }
        };

        match destination.write_table_row(table, row).await {
            Ok(()) => report.succeeded += 1,
            Err(err) if err.kind() == ErrorKind::DestinationConnectionFailed => {
                error!(
                    table = table.name,
                    record = index,
                    remaining = records.len() - index - 1,
                    error = %err,
                    "connection lost, aborting table load"
                );
                report.aborted = Some(err);
                break;
            }
            Err(err) => {
                warn!(table = table.name, record = index, error = %err, "row write failed");
                report.write_failures += 1;
            }
        }
    }

    info!(
        table = table.name,
        attempted = report.attempted,
        succeeded = report.succeeded,
        conversion_failures = report.conversion_failures,
        write_failures = report.write_failures,
        aborted = report.aborted.is_some(),
        "loaded table"
    );

    report
}
