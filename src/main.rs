mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use app::WildfireApp;
use clap::Parser;
use eframe::egui;
use wildfire_aq::data::fetch::ensure_dataset;
use wildfire_aq::AnalysisConfig;

/// Wildfire detections vs. ground-level air quality.
#[derive(Debug, Parser)]
#[command(name = "wildfire-aq", version)]
struct Cli {
    /// TOML configuration file (defaults are used when omitted).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Fetch and unpack the configured archive if the data directory is missing.
    #[arg(long)]
    fetch: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    if cli.fetch {
        match &config.archive {
            // a failed fetch leaves every source unavailable; the viewer
            // still starts and reports them
            Some(source) => {
                if let Err(e) = ensure_dataset(source, &config.data_dir) {
                    log::error!("Fetching data set failed: {e}");
                }
            }
            None => log::warn!("--fetch given but no [archive] is configured"),
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Wildfire & Air Quality",
        options,
        Box::new(move |_cc| Ok(Box::new(WildfireApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("running viewer: {e}"))
}
