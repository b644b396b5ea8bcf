//! Cascade Atlas Builder
//!
//! Offline asset tooling for planet textures: flattens layered sprite pairs
//! and packs sprites into fixed-grid texture atlases with JSON frame data.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod domain;
mod engine;
mod jobs;

use crate::config::{LoggingSettings, Settings};
use crate::jobs::JobOutcome;

#[derive(Parser, Debug)]
#[command(name = "cascade-atlas", version, about = "Build sprite texture atlases")]
struct Cli {
    /// Directory holding default.toml / local.toml
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flatten `<Category>_<n>-0/1.png` pairs and pack them into an atlas
    Gaseous {
        /// Directory to read sprites from and write outputs to
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Pack the configured sprite list into an atlas
    Jungle {
        /// Directory to read sprites from and write outputs to
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config_dir.as_deref()).context("Failed to load configuration")?;

    init_tracing(&settings.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Cascade Atlas Builder");

    let outcome = match cli.cmd {
        Command::Gaseous { dir } => {
            let dir = dir.unwrap_or_else(|| settings.gaseous.dir.clone());
            jobs::run_pair_job(&settings.gaseous, &dir)?
        }
        Command::Jungle { dir } => {
            let dir = dir.unwrap_or_else(|| settings.jungle.dir.clone());
            jobs::run_list_job(&settings.jungle, &dir)?
        }
    };

    match outcome {
        JobOutcome::Built(output) => info!(
            image = %output.image_path.display(),
            json = %output.json_path.display(),
            placed = output.placed,
            "Done"
        ),
        JobOutcome::NothingToDo => info!("Nothing to do"),
    }

    Ok(())
}

/// Initialize the tracing subscriber; `RUST_LOG` wins over the configured filter
fn init_tracing(logging: &LoggingSettings) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.filter)
            .with_context(|| format!("Invalid log filter {:?}", logging.filter))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}
