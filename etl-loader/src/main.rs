use std::process::ExitCode;

use clap::Parser;
use etl_config::shared::LoaderConfig;
use etl_telemetry::tracing::init_tracing;
use tracing::error;

use crate::cli::{Cli, Command};
use crate::config::load_loader_config;
use crate::core::start_loader;
use crate::error::{LoaderError, LoaderResult};

mod cli;
mod config;
mod core;
mod error;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

fn run() -> LoaderResult<()> {
    let command = Cli::parse().into_command();

    let loader_config = load_loader_config()?;

    // Dropping the flusher at the end of `run` flushes pending log lines.
    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME")).map_err(LoaderError::config)?;

    // A single session drives the load sequentially.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(loader_config, command))
}

async fn async_main(loader_config: LoaderConfig, command: Command) -> LoaderResult<()> {
    if let Err(err) = start_loader(loader_config, command).await {
        error!("an error occurred in the loader: {err}");
        return Err(err);
    }

    Ok(())
}
