#![doc = include_str!("../README.md")]

mod commands;
mod config;
mod telemetry;

use std::io::{BufWriter, stdout};

use clap::Parser;
use config::{CliArgs, Command, Config};
use telemetry::init_telemetry;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = Config::try_from(args)?;

    init_telemetry(config.log_format)?;
    log_startup_info(&config);

    let mut out = BufWriter::new(stdout().lock());
    match &config.command {
        Command::Generate { count, threads } => {
            commands::generate(config.settings()?, *count, *threads, &mut out)
        }
        Command::Decode { ids, json } => {
            commands::decode(config.decode_settings()?, ids, *json, &mut out)
        }
    }
}

fn log_startup_info(config: &Config) {
    if cfg!(debug_assertions) {
        tracing::debug!("Starting with full config: {:#?}", config);
    } else {
        tracing::debug!(
            epoch = %config.epoch_rfc3339(),
            machine_id = ?config.machine_id,
            "Starting"
        );
    }
}
