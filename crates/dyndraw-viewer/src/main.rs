//! dyndraw - spinning point-cube viewer.

mod app;
mod cli;
mod config;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use dyndraw_engine::logging::{init_logging, LoggingConfig};
use dyndraw_engine::window::Runtime;

use crate::app::CubeApp;
use crate::cli::Cli;
use crate::config::ViewerConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("dyndraw: {err}");
            for cause in err.chain().skip(1) {
                eprintln!("  caused by: {cause}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    cli.apply(&mut config);

    init_logging(LoggingConfig {
        env_filter: config.log.clone(),
        ..LoggingConfig::default()
    });

    config.validate()?;

    let app = CubeApp::new(&config)?;
    let reason = Runtime::run(config.runtime(), config.gpu_init()?, app)?;
    log::debug!("viewer stopped: {reason:?}");
    Ok(())
}
