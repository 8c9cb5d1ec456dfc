//! Binary entrypoint for the zoom screensaver.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

/// Simple CLI
#[derive(Debug, Parser)]
#[command(name = "zoom-screensaver", about = "Fullscreen pan/zoom/fade photo screensaver")]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override per-image display time (ms)
    #[arg(long, value_name = "MILLIS")]
    dwell_ms: Option<u64>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("zoom_screensaver={}", level).parse()?)
        .add_directive("wgpu=warn".parse()?)
        .add_directive("winit=warn".parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut cfg = zoom_screensaver::config::Configuration::from_yaml_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?
        .validated()
        .context("validating configuration")?;
    if let Some(ms) = cli.dwell_ms {
        cfg.animation.dwell_ms = ms.max(1);
    }

    let photos = zoom_screensaver::scan::scan_images(&cfg.photo_library_path)?;
    info!(count = photos.len(), "scanned images");

    let playlist =
        zoom_screensaver::playlist::Playlist::shuffled(photos, cfg.startup_shuffle_seed)?;
    zoom_screensaver::render::viewer::run_screensaver(playlist, cfg.animation)?;
    Ok(())
}
