//! mapforge CLI
//!
//! Drives the full pipeline for each definition file: renderer
//! invocations, marker generation, remote upload, and webhook push.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod pipeline;
mod renderer;
mod settings;

use mapforge_core::Definition;
use settings::RunSettings;

/// mapforge - declarative map rendering and distribution
#[derive(Debug, Parser)]
#[command(name = "mapforge")]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// YAML definition file (repeatable)
    #[arg(short = 'f', long = "definition", required = true, value_name = "PATH")]
    pub(crate) definition: Vec<PathBuf>,

    /// Path to the renderer binary
    #[arg(short = 'p', long, value_name = "PATH")]
    pub(crate) renderer: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub(crate) verbose: u8,

    /// Only print errors
    #[arg(short, long)]
    pub(crate) quiet: bool,

    /// Print planned work, execute nothing external
    #[arg(long)]
    pub(crate) dry_run: bool,

    /// Regenerate and upload only the player markers
    #[arg(long)]
    pub(crate) sheet_only: bool,

    /// Skip map generation
    #[arg(long)]
    pub(crate) skip_map: bool,

    /// Skip player marker generation
    #[arg(long)]
    pub(crate) skip_sheet: bool,

    /// Skip remote upload
    #[arg(long)]
    pub(crate) skip_remote: bool,

    /// Skip webhook push
    #[arg(long)]
    pub(crate) skip_webhook: bool,
}

fn log_filter(cli: &Cli) -> EnvFilter {
    if cli.quiet {
        EnvFilter::new("error")
    } else if cli.verbose >= 2 {
        EnvFilter::new("trace")
    } else if cli.verbose == 1 || cli.dry_run {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(log_filter(&cli))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = RunSettings::resolve(&cli)?;
    let registry = mapforge_backends::default_registry();

    // Parse and resolve everything up front: configuration errors must
    // surface before the first external process starts.
    let mut definitions = Vec::with_capacity(cli.definition.len());
    for path in &cli.definition {
        let defi = Definition::from_path(path)
            .with_context(|| format!("failed to load definition {}", path.display()))?;
        defi.resolve(&registry)
            .with_context(|| format!("failed to resolve definition {}", path.display()))?;
        defi.commands()
            .with_context(|| format!("invalid task options in {}", path.display()))?;
        definitions.push((path.clone(), defi));
    }

    if definitions.len() == 1 {
        tracing::debug!("Loaded 1 definition");
    } else {
        tracing::debug!("Loaded {} definitions", definitions.len());
    }

    for (path, defi) in &definitions {
        pipeline::process(path, defi, &settings).await?;
    }

    Ok(())
}
