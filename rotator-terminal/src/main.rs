/// Rotator terminal demo
///
/// Spins a model from the catalog in the terminal.
/// Controls:
///   - Mouse drag / WASD / Arrow Keys: Spin the model
///   - Space: Stop, R: Reset, M: Pick a model, H: Hide
///   - Q/ESC: Quit
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::terminal;
use rotator_core::{ModelCatalog, RotatorConfig};
use rotator_terminal::TerminalApp;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rotator-terminal")]
#[command(about = "Spin a 3D model in the terminal", long_about = None)]
struct Args {
    /// Model to open; unknown names open the first catalog entry
    #[arg(default_value = "123")]
    model: String,

    /// TOML catalog of models (defaults to the builtin shapes)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// TOML file with rotator settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target frame rate, overrides the config file
    #[arg(long)]
    fps: Option<u32>,

    /// Write logs to this file. The terminal is busy drawing, so without it
    /// nothing is logged.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }

    tracing::info!("Rotator terminal v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => RotatorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RotatorConfig::default(),
    };
    if let Some(fps) = args.fps {
        config.target_fps = fps;
        config.validate()?;
    }

    let catalog = match &args.catalog {
        Some(path) => ModelCatalog::load(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => ModelCatalog::builtin(),
    };
    tracing::info!(models = catalog.len(), "catalog ready");

    let (columns, rows) = terminal::size().context("failed to query terminal size")?;
    let mut app = TerminalApp::new(&config, catalog, &args.model, columns, rows)?;
    app.run()?;

    tracing::info!("bye");
    Ok(())
}
