//! scholar - tutoring marketplace simulator
//!
//! Runs a scenario of students, tutors and shared services on one in-process
//! bus and prints the monitor's report.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use scholar_sim::{ScenarioConfig, Simulation};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "scholar")]
#[command(about = "Tutoring marketplace simulator")]
#[command(version)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print the report
    Run {
        /// Scenario file (the built-in classroom when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the built-in scenario to a file
    InitConfig {
        /// Path to write the scenario
        #[arg(short, long, default_value = "scholar.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    match cli.command {
        Commands::Run { config, json } => run(config, json).await,
        Commands::InitConfig { output } => init_config(&output),
    }
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("scholar=info".parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
    Ok(())
}

async fn run(config: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let scenario = match config {
        Some(path) => ScenarioConfig::from_file(&path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => ScenarioConfig::default(),
    };
    info!(
        tutors = scenario.tutors.len(),
        students = scenario.students.len(),
        time_unit_ms = scenario.time_unit_ms,
        "starting scenario"
    );

    let outcome = Simulation::new(scenario)?.run().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    } else {
        println!("{}", outcome.report);
    }
    if !outcome.all_finished() {
        info!("some students did not finish before the deadline");
    }
    Ok(())
}

fn init_config(output: &Path) -> anyhow::Result<()> {
    ScenarioConfig::default().write(output)?;
    println!("Scenario written to {}", output.display());
    Ok(())
}
