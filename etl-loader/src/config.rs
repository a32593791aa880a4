use etl_config::load_config;
use etl_config::shared::LoaderConfig;

use crate::error::{LoaderError, LoaderResult};

/// Loads the loader configuration and validates it.
pub fn load_loader_config() -> LoaderResult<LoaderConfig> {
    let config = load_config::<LoaderConfig>().map_err(LoaderError::config)?;
    config.validate().map_err(LoaderError::config)?;

    Ok(config)
}
