use serde::Deserialize;

use crate::Config;
use crate::shared::{DestinationConfig, PipelineConfig, ValidationError};

/// Complete configuration of the loader binary.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Source and artifact locations.
    pub pipeline: PipelineConfig,
    /// Store the tables are loaded into.
    pub destination: DestinationConfig,
}

impl LoaderConfig {
    /// Validates every configuration section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.pipeline.validate()?;
        self.destination.validate()
    }
}

impl Config for LoaderConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["destination.cassandra.nodes"];
}
