use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Locations of the raw event files and of the canonical artifact.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Directory whose regular files are the raw event logs.
    pub event_data_dir: PathBuf,
    /// Path of the canonical CSV artifact written before loading.
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
}

impl PipelineConfig {
    /// Default file name of the canonical artifact.
    pub const DEFAULT_ARTIFACT_PATH: &'static str = "event_datafile_new.csv";

    /// Validates that both paths are set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.event_data_dir.as_os_str().is_empty() {
            return Err(ValidationError::EmptyPath("pipeline.event_data_dir"));
        }

        if self.artifact_path.as_os_str().is_empty() {
            return Err(ValidationError::EmptyPath("pipeline.artifact_path"));
        }

        Ok(())
    }
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from(PipelineConfig::DEFAULT_ARTIFACT_PATH)
}
