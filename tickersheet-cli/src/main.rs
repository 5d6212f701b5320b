//! tickersheet CLI — run the daily bar pipeline once, or inspect its configuration.
//!
//! Commands:
//! - `run` — extract, clean, aggregate, and publish to the configured sheet
//! - `run --dry-run` — same stages, but print the sheet grid instead of writing it
//! - `show-config` — print the effective configuration as TOML

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tickersheet_core::data::YahooProvider;
use tickersheet_core::pipeline::ERROR_PREFIX;
use tickersheet_core::publish::{to_sheet_values, Credentials, GoogleSheetsClient};
use tickersheet_core::{Pipeline, PipelineConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tickersheet",
    version,
    about = "Daily equity bars from Yahoo Finance to a Google Sheet"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once.
    Run {
        /// TOML config file. Defaults to the built-in ticker list and sheet.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Trigger payload as JSON. Accepted for parity with the HTTP trigger; ignored.
        #[arg(long)]
        payload: Option<String>,

        /// Print the grid that would be written instead of publishing it.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Print the effective configuration as TOML.
    ShowConfig {
        /// TOML config file to merge over the defaults.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            payload,
            dry_run,
        } => run(config.as_deref(), payload.as_deref(), dry_run),
        Commands::ShowConfig { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn run(config_path: Option<&Path>, payload: Option<&str>, dry_run: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let request: Value = match payload {
        Some(raw) => serde_json::from_str(raw).context("--payload is not valid JSON")?,
        None => Value::Null,
    };

    let provider = YahooProvider::new()?;
    let sheets = GoogleSheetsClient::new(Credentials::ambient())?;
    let pipeline = Pipeline::new(config, Box::new(provider), Box::new(sheets));

    let config = pipeline.config();
    info!(
        tickers = config.tickers.len(),
        lookback_days = config.lookback_days,
        range = %config.target.range(),
        dry_run,
        "configuration loaded"
    );

    if dry_run {
        let gold = pipeline.prepare()?;
        let grid = to_sheet_values(&gold)?;
        println!("{}", serde_json::to_string_pretty(&grid)?);
        return Ok(());
    }

    let status = pipeline.handle(&request);
    println!("{status}");
    if status.starts_with(ERROR_PREFIX) {
        bail!("pipeline did not complete");
    }
    Ok(())
}

