use std::sync::Arc;

use etl_config::shared::PipelineConfig;
use tracing::{error, info};

use crate::canonical::{RawFieldMap, canonicalize, read_artifact, write_artifact};
use crate::destination::Destination;
use crate::error::{EtlError, EtlResult};
use crate::extract::extract_event_rows;
use crate::projection::{TableLoadReport, project_table};
use crate::schema::TARGET_TABLES;

/// Counts gathered over one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Event files read.
    pub raw_files: usize,
    /// Data rows read from the event files.
    pub raw_rows: usize,
    /// Canonical records loaded from the artifact.
    pub kept: usize,
    /// Rows filtered because their artist was empty.
    pub dropped_empty_artist: usize,
    /// Rows skipped because they were too short.
    pub skipped_malformed: usize,
    /// One report per target table, in load order.
    pub tables: Vec<TableLoadReport>,
}

impl PipelineReport {
    /// Returns the report of `table`, if it was loaded.
    pub fn table(&self, table: &str) -> Option<&TableLoadReport> {
        self.tables.iter().find(|report| report.table == table)
    }

    /// Returns `true` if every table received every canonical record.
    pub fn is_complete(&self) -> bool {
        self.tables.iter().all(TableLoadReport::is_complete)
    }
}

/// Batch load from an event directory into the target tables of a [`Destination`].
///
/// A run extracts the raw rows, persists the canonical artifact, reads it back, resets the
/// three target tables and projects the records into each of them. The destination is
/// shut down at the end of every run, whether it succeeded or not.
#[derive(Debug)]
pub struct Pipeline<D> {
    config: Arc<PipelineConfig>,
    field_map: RawFieldMap,
    destination: D,
}

impl<D> Pipeline<D>
where
    D: Destination,
{
    pub fn new(config: PipelineConfig, destination: D) -> Self {
        Self {
            config: Arc::new(config),
            field_map: RawFieldMap::default(),
            destination,
        }
    }

    /// Replaces the raw field positions used to build canonical records.
    pub fn with_field_map(mut self, field_map: RawFieldMap) -> Self {
        self.field_map = field_map;
        self
    }

    /// Runs the whole load and shuts the destination down.
    ///
    /// Per-record failures only show up in the returned report. Extraction, artifact and
    /// schema setup failures end the run with an error.
    pub async fn run(&self) -> EtlResult<PipelineReport> {
        info!(
            destination = D::name(),
            event_data_dir = %self.config.event_data_dir.display(),
            "starting pipeline"
        );

        let result = self.load().await;
        let shutdown_result = self.destination.shutdown().await;

        match (result, shutdown_result) {
            (Ok(report), Ok(())) => {
                info!(
                    raw_rows = report.raw_rows,
                    kept = report.kept,
                    complete = report.is_complete(),
                    "pipeline finished"
                );
                Ok(report)
            }
            (Ok(report), Err(err)) => {
                error!(error = %err, "destination shutdown failed after a finished load");
                Ok(report)
            }
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(shutdown_err)) => Err(EtlError::from(vec![err, shutdown_err])),
        }
    }

    async fn load(&self) -> EtlResult<PipelineReport> {
        let extracted = extract_event_rows(&self.config.event_data_dir)?;

        let outcome = canonicalize(&extracted.rows, &self.field_map);
        write_artifact(&self.config.artifact_path, &outcome.records)?;

        // Loading always goes through the persisted artifact.
        drop(outcome.records);
        let records = read_artifact(&self.config.artifact_path)?;

        for table in TARGET_TABLES {
            self.destination.reset_table(table).await?;
        }

        let mut tables = Vec::with_capacity(TARGET_TABLES.len());
        for table in TARGET_TABLES {
            tables.push(project_table(&self.destination, table, &records).await);
        }

        Ok(PipelineReport {
            raw_files: extracted.files.len(),
            raw_rows: extracted.rows.len(),
            kept: records.len(),
            dropped_empty_artist: outcome.dropped_empty_artist,
            skipped_malformed: outcome.skipped_malformed,
            tables,
        })
    }
}
