use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use scylla::frame::response::result::CqlValue;
use scylla::prepared_statement::PreparedStatement;
use scylla::{Session, SessionBuilder};
use secrecy::ExposeSecret;
use tracing::{debug, info};

use etl_config::shared::CassandraConfig;

use crate::bail;
use crate::destination::Destination;
use crate::destination::cassandra::encoding::{cell_to_cql_value, cql_value_to_cell};
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::query::SelectStatement;
use crate::schema::TableSchema;
use crate::schema::cql::{
    build_create_keyspace_cql, build_create_table_cql, build_drop_table_cql, build_insert_cql,
    build_select_cql,
};
use crate::types::TableRow;

/// Prepared statements are cached per table so a reset can discard exactly that table's.
type StatementKey = (&'static str, String);

/// Destination writing the target tables into a Cassandra compatible cluster.
///
/// One session is opened by [`CassandraDestination::connect`] and used until
/// [`Destination::shutdown`], after which every call fails with
/// [`ErrorKind::DestinationConnectionFailed`].
pub struct CassandraDestination {
    session: Mutex<Option<Arc<Session>>>,
    keyspace: String,
    statements: RwLock<HashMap<StatementKey, PreparedStatement>>,
}

impl CassandraDestination {
    /// Connects to the cluster, creates the keyspace if missing and selects it.
    pub async fn connect(config: &CassandraConfig) -> EtlResult<Self> {
        let mut builder = SessionBuilder::new()
            .known_nodes(&config.nodes)
            .connection_timeout(Duration::from_millis(config.connect_timeout_ms));

        if let Some(username) = &config.username {
            let password = config
                .password
                .as_ref()
                .map(|password| password.expose_secret().as_str())
                .unwrap_or_default();
            builder = builder.user(username.as_str(), password);
        }

        info!(nodes = ?config.nodes, keyspace = %config.keyspace, "connecting to cassandra");
        let session = builder.build().await?;

        let create_keyspace =
            build_create_keyspace_cql(&config.keyspace, config.replication_factor);
        session.query_unpaged(create_keyspace, ()).await?;
        session.use_keyspace(&config.keyspace, false).await?;

        info!(keyspace = %config.keyspace, "cassandra session ready");

        Ok(Self {
            session: Mutex::new(Some(Arc::new(session))),
            keyspace: config.keyspace.clone(),
            statements: RwLock::new(HashMap::new()),
        })
    }

    fn session(&self) -> EtlResult<Arc<Session>> {
        match self.session.lock().as_ref() {
            Some(session) => Ok(Arc::clone(session)),
            None => bail!(
                ErrorKind::DestinationConnectionFailed,
                "Cassandra session is closed",
                format!("Keyspace `{}`", self.keyspace)
            ),
        }
    }

    /// Returns the prepared form of `cql`, preparing it on first use.
    async fn prepared(
        &self,
        session: &Session,
        table: &'static str,
        cql: String,
    ) -> EtlResult<PreparedStatement> {
        let key = (table, cql);
        let cached = self.statements.read().get(&key).cloned();
        if let Some(statement) = cached {
            return Ok(statement);
        }

        debug!(table, cql = %key.1, "preparing statement");
        let statement = session.prepare(key.1.as_str()).await?;

        let mut statements = self.statements.write();
        Ok(statements.entry(key).or_insert(statement).clone())
    }

    fn forget_statements(&self, table: &str) {
        self.statements.write().retain(|(name, _), _| *name != table);
    }
}

impl Destination for CassandraDestination {
    fn name() -> &'static str {
        "cassandra"
    }

    async fn reset_table(&self, table: &TableSchema) -> EtlResult<()> {
        let session = self.session()?;
        self.forget_statements(table.name);

        session
            .query_unpaged(build_drop_table_cql(table), ())
            .await?;
        session
            .query_unpaged(build_create_table_cql(table), ())
            .await?;

        info!(table = table.name, keyspace = %self.keyspace, "reset table");

        Ok(())
    }

    async fn write_table_row(&self, table: &TableSchema, row: TableRow) -> EtlResult<()> {
        let session = self.session()?;
        let statement = self
            .prepared(&session, table.name, build_insert_cql(table))
            .await?;

        let values = row
            .into_values()
            .into_iter()
            .map(cell_to_cql_value)
            .collect::<EtlResult<Vec<Option<CqlValue>>>>()?;

        session.execute_unpaged(&statement, values).await?;

        Ok(())
    }

    async fn select_rows(&self, statement: &SelectStatement) -> EtlResult<Vec<TableRow>> {
        let session = self.session()?;
        let prepared = self
            .prepared(&session, statement.table.name, build_select_cql(statement))
            .await?;

        let values = statement
            .filter_values()
            .cloned()
            .map(cell_to_cql_value)
            .collect::<EtlResult<Vec<Option<CqlValue>>>>()?;

        let result = session.execute_unpaged(&prepared, values).await?;

        let mut rows = Vec::new();
        for row in result.rows.unwrap_or_default() {
            if row.columns.len() != statement.columns.len() {
                bail!(
                    ErrorKind::DestinationQueryFailed,
                    "Unexpected column count in result row",
                    format!(
                        "Table `{}` returned {} columns, {} were selected",
                        statement.table.name,
                        row.columns.len(),
                        statement.columns.len()
                    )
                );
            }

            let values = row
                .columns
                .into_iter()
                .map(cql_value_to_cell)
                .collect::<EtlResult<Vec<_>>>()?;
            rows.push(TableRow::new(values));
        }

        Ok(rows)
    }

    async fn shutdown(&self) -> EtlResult<()> {
        let session = self.session.lock().take();
        self.statements.write().clear();

        match session {
            Some(session) => {
                // Connections close once the last clone of the session is dropped.
                drop(session);
                info!(keyspace = %self.keyspace, "cassandra session released");
                Ok(())
            }
            None => Err(etl_error!(
                ErrorKind::DestinationConnectionFailed,
                "Cassandra session is closed",
                format!("Keyspace `{}` was already released", self.keyspace)
            )),
        }
    }
}
