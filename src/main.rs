mod analysis;
mod config;
mod engine;
mod environment;
mod intervention;
mod manager;
mod model;
mod network;
mod stats;
mod utils;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Directory holding `config.toml` and the run outputs.
    #[arg(long)]
    sim_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Perform one simulation into the next free run directory.
    Run {
        /// Overrides the configured seed.
        #[arg(long, value_parser = clap::value_parser!(u64).range(..=i64::MAX as u64))]
        seed: Option<u64>,
    },

    /// Aggregate the results of every run.
    Analyze,

    /// Remove every run directory and the analysis.
    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.sim_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Run { seed } => mgr.run_simulation(seed)?,
        Command::Analyze => mgr.run_analysis()?,
        Command::Clean => mgr.clean_sim()?,
    }

    Ok(())
}
