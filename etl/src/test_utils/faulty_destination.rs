use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::destination::Destination;
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::query::SelectStatement;
use crate::schema::TableSchema;
use crate::types::TableRow;

/// A failure injected for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every row write is rejected by the store.
    RejectWrites,
    /// Row writes succeed `n` times, then the connection is reported lost.
    LoseConnectionAfter(usize),
    /// Resetting the table fails.
    FailReset,
}

#[derive(Debug, Default)]
struct Inner {
    faults: HashMap<&'static str, Fault>,
    reset_calls: HashMap<&'static str, usize>,
    write_calls: HashMap<&'static str, usize>,
    select_calls: usize,
    shutdown_calls: usize,
}

/// Wraps a [`Destination`], injecting per-table faults and counting every call.
///
/// Calls without a fault are forwarded to the wrapped destination.
#[derive(Debug, Clone)]
pub struct FaultyDestination<D> {
    wrapped: D,
    inner: Arc<Mutex<Inner>>,
}

impl<D> FaultyDestination<D> {
    pub fn wrap(destination: D) -> Self {
        Self {
            wrapped: destination,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Injects `fault` into every later call concerning `table`.
    pub async fn inject(&self, table: &'static str, fault: Fault) {
        self.inner.lock().await.faults.insert(table, fault);
    }

    pub fn wrapped(&self) -> &D {
        &self.wrapped
    }

    /// Returns how many row writes were issued for `table`, failed ones included.
    pub async fn write_calls(&self, table: &str) -> usize {
        let inner = self.inner.lock().await;
        inner.write_calls.get(table).copied().unwrap_or(0)
    }

    pub async fn reset_calls(&self, table: &str) -> usize {
        let inner = self.inner.lock().await;
        inner.reset_calls.get(table).copied().unwrap_or(0)
    }

    pub async fn select_calls(&self) -> usize {
        self.inner.lock().await.select_calls
    }

    pub async fn shutdown_calls(&self) -> usize {
        self.inner.lock().await.shutdown_calls
    }
}

impl<D> Destination for FaultyDestination<D>
where
    D: Destination + Send + Sync,
{
    fn name() -> &'static str {
        D::name()
    }

    async fn reset_table(&self, table: &TableSchema) -> EtlResult<()> {
        {
            let mut inner = self.inner.lock().await;
            *inner.reset_calls.entry(table.name).or_default() += 1;

            if inner.faults.get(table.name) == Some(&Fault::FailReset) {
                return Err(etl_error!(
                    ErrorKind::DestinationSchemaError,
                    "Injected table reset failure",
                    format!("Table `{}`", table.name)
                ));
            }
        }

        self.wrapped.reset_table(table).await
    }

    async fn write_table_row(&self, table: &TableSchema, row: TableRow) -> EtlResult<()> {
        {
            let mut inner = self.inner.lock().await;
            let calls = inner.write_calls.entry(table.name).or_default();
            *calls += 1;
            let calls = *calls;

            match inner.faults.get(table.name) {
                Some(Fault::RejectWrites) => {
                    return Err(etl_error!(
                        ErrorKind::DestinationQueryFailed,
                        "Injected row write rejection",
                        format!("Table `{}`", table.name)
                    ));
                }
                Some(Fault::LoseConnectionAfter(successes)) if calls > *successes => {
                    return Err(etl_error!(
                        ErrorKind::DestinationConnectionFailed,
                        "Injected connection loss",
                        format!("Table `{}` after {successes} writes", table.name)
                    ));
                }
                _ => {}
            }
        }

        self.wrapped.write_table_row(table, row).await
    }

    async fn select_rows(&self, statement: &SelectStatement) -> EtlResult<Vec<TableRow>> {
        self.inner.lock().await.select_calls += 1;

        self.wrapped.select_rows(statement).await
    }

    async fn shutdown(&self) -> EtlResult<()> {
        self.inner.lock().await.shutdown_calls += 1;

        self.wrapped.shutdown().await
    }
}
