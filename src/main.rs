use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use oceanmon_service::config::{self, MonitorConfig};
use oceanmon_service::dev_mode::DevMode;
use oceanmon_service::display::{ConsoleDashboard, ConsoleMap};
use oceanmon_service::engine::AggregationEngine;
use oceanmon_service::ingest::{OpenMeteoSource, ReadingSource};
use oceanmon_service::ingest::open_meteo::Endpoints;
use oceanmon_service::logging;
use oceanmon_service::orchestrator::Orchestrator;
use oceanmon_service::verify;

/// Ocean stress monitor: polls marine and atmospheric conditions and
/// reduces them into a single stress index with alerts.
#[derive(Parser)]
#[command(name = "oceanmon", version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = config::CONFIG_ENV_VAR, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the live sources until interrupted (default)
    Run,
    /// Run a single fetch cycle against the live sources and exit
    Once,
    /// Run a single cycle from a recorded JSON fixture
    Replay {
        fixture: PathBuf,
    },
    /// Check every sample point against the live APIs
    Verify {
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = MonitorConfig::load(&cli.config)?;

    logging::init_logger(
        &config.logging.level,
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let mut orchestrator = build_orchestrator(&config, live_sources(&config)?);
            orchestrator.start(Utc::now());
            orchestrator.run(&config.monitor);
        }
        Command::Once => {
            let mut orchestrator = build_orchestrator(&config, live_sources(&config)?);
            orchestrator.start(Utc::now());
            let received = orchestrator.run_cycle(config.monitor.cycle_timeout());
            info!(source = "SYS", "{} source(s) reported", received);
            println!("{}", orchestrator.status_line());
        }
        Command::Replay { fixture } => {
            let sources: Vec<Arc<dyn ReadingSource>> = DevMode::new(fixture)
                .load_sources()?
                .into_iter()
                .map(|s| Arc::new(s) as Arc<dyn ReadingSource>)
                .collect();
            let mut orchestrator = build_orchestrator(&config, sources);
            orchestrator.start(Utc::now());
            orchestrator.run_cycle(config.monitor.cycle_timeout());
            println!("{}", orchestrator.status_line());
        }
        Command::Verify { json } => {
            let report = verify::run_full_verification(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                verify::print_summary(&report);
            }
        }
    }

    Ok(())
}

fn live_sources(config: &MonitorConfig) -> Result<Vec<Arc<dyn ReadingSource>>, Box<dyn Error>> {
    let client = config.http.build_client()?;
    let endpoints = Endpoints::from(&config.http);
    Ok(OpenMeteoSource::all(&client, &endpoints)
        .into_iter()
        .map(|s| Arc::new(s) as Arc<dyn ReadingSource>)
        .collect())
}

fn build_orchestrator(
    config: &MonitorConfig,
    sources: Vec<Arc<dyn ReadingSource>>,
) -> Orchestrator<ConsoleMap, ConsoleDashboard> {
    Orchestrator::new(
        AggregationEngine::new(&config.alerts),
        ConsoleMap,
        ConsoleDashboard::new(),
        sources,
    )
}
