use std::fmt::Display;

use etl::destination::Destination;
use etl::destination::cassandra::CassandraDestination;
use etl::destination::memory::MemoryDestination;
use etl::error::ErrorKind;
use etl::etl_error;
use etl::pipeline::{Pipeline, PipelineReport};
use etl::query::{
    Lookup, PlayedInSessionQuery, SongListenersQuery, UserSessionQuery, run_lookup,
};
use etl_config::shared::{DestinationConfig, LoaderConfig, PipelineConfig};
use tracing::{info, warn};

use crate::cli::{Command, QueryCommand};
use crate::error::LoaderResult;

/// Runs `command` against the configured destination.
pub async fn start_loader(config: LoaderConfig, command: Command) -> LoaderResult<()> {
    info!("starting loader");

    log_config(&config);
    check_command(&config.destination, &command)?;

    let LoaderConfig {
        pipeline,
        destination,
    } = config;

    match destination {
        DestinationConfig::Memory => {
            let destination = MemoryDestination::new();
            execute(command, pipeline, destination).await
        }
        DestinationConfig::Cassandra { config } => {
            let destination = CassandraDestination::connect(&config).await?;
            execute(command, pipeline, destination).await
        }
    }
}

/// Rejects commands the configured destination cannot serve.
///
/// The memory destination starts empty in every process, so it can only be loaded.
fn check_command(destination: &DestinationConfig, command: &Command) -> LoaderResult<()> {
    if let (DestinationConfig::Memory, Command::Query(_)) = (destination, command) {
        return Err(etl_error!(
            ErrorKind::ConfigError,
            "Queries require a persistent destination",
            "`destination: memory` holds no tables outside a `load` run, configure `destination.cassandra`"
        )
        .into());
    }

    Ok(())
}

async fn execute<D>(command: Command, pipeline: PipelineConfig, destination: D) -> LoaderResult<()>
where
    D: Destination,
{
    match command {
        Command::Load => {
            let report = Pipeline::new(pipeline, destination).run().await?;
            log_report(&report);
        }
        Command::Query(query) => {
            let result = execute_query(&destination, query).await;
            let shutdown_result = destination.shutdown().await;
            result?;
            shutdown_result?;
        }
    }

    Ok(())
}

async fn execute_query<D>(destination: &D, query: QueryCommand) -> LoaderResult<()>
where
    D: Destination,
{
    match query {
        QueryCommand::Session {
            session_id,
            item_in_session,
        } => {
            let lookup = PlayedInSessionQuery {
                session_id,
                item_in_session,
            };
            print_lookup(destination, &lookup).await
        }
        QueryCommand::User {
            user_id,
            session_id,
        } => {
            let lookup = UserSessionQuery {
                user_id,
                session_id,
            };
            print_lookup(destination, &lookup).await
        }
        QueryCommand::Song { song } => {
            let lookup = SongListenersQuery { song };
            print_lookup(destination, &lookup).await
        }
    }
}

async fn print_lookup<D, L>(destination: &D, lookup: &L) -> LoaderResult<()>
where
    D: Destination,
    L: Lookup,
    L::Output: Display,
{
    let rows = run_lookup(destination, lookup).await?;
    info!(table = lookup.statement().table.name, rows = rows.len(), "lookup finished");

    for row in rows {
        println!("{row}");
    }

    Ok(())
}

fn log_config(config: &LoaderConfig) {
    info!(
        event_data_dir = %config.pipeline.event_data_dir.display(),
        artifact_path = %config.pipeline.artifact_path.display(),
        "pipeline config"
    );

    match &config.destination {
        DestinationConfig::Memory => {
            info!("using memory destination config");
        }
        DestinationConfig::Cassandra { config } => {
            info!(
                nodes = ?config.nodes,
                keyspace = %config.keyspace,
                replication_factor = config.replication_factor,
                authenticated = config.username.is_some(),
                "using cassandra destination config"
            );
        }
    }
}

fn log_report(report: &PipelineReport) {
    info!(
        raw_files = report.raw_files,
        raw_rows = report.raw_rows,
        kept = report.kept,
        dropped_empty_artist = report.dropped_empty_artist,
        skipped_malformed = report.skipped_malformed,
        "load summary"
    );

    for table in &report.tables {
        if table.is_complete() {
            info!(table = table.table, rows = table.succeeded, "table loaded");
        } else {
            warn!(
                table = table.table,
                attempted = table.attempted,
                succeeded = table.succeeded,
                conversion_failures = table.conversion_failures,
                write_failures = table.write_failures,
                aborted = ?table.aborted.as_ref().map(|err| err.kind()),
                "table partially loaded"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use etl_config::shared::CassandraConfig;

    use super::*;

    fn session_query() -> Command {
        Command::Query(QueryCommand::Session {
            session_id: 338,
            item_in_session: 4,
        })
    }

    #[test]
    fn memory_destination_only_serves_load() {
        assert!(check_command(&DestinationConfig::Memory, &Command::Load).is_ok());

        let err = check_command(&DestinationConfig::Memory, &session_query()).unwrap_err();
        assert_eq!(err.category(), "configuration error");
        assert!(err.to_string().contains("Queries require a persistent destination"));
    }

    #[test]
    fn cassandra_destination_serves_queries() {
        let destination = DestinationConfig::Cassandra {
            config: CassandraConfig {
                nodes: vec!["127.0.0.1:9042".to_owned()],
                keyspace: CassandraConfig::DEFAULT_KEYSPACE.to_owned(),
                replication_factor: CassandraConfig::DEFAULT_REPLICATION_FACTOR,
                username: None,
                password: None,
                connect_timeout_ms: CassandraConfig::DEFAULT_CONNECT_TIMEOUT_MS,
            },
        };

        assert!(check_command(&destination, &session_query()).is_ok());
    }
}
