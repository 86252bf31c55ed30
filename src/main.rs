//! Enrollment Viewer - School Enrollment Utilization Dashboard
//!
//! Loads per-school enrollment and capacity figures and shows utilization
//! for a fiscal year as a table, a multi-year chart and a district map.

mod charts;
mod config;
mod data;
mod export;
mod gui;
mod stats;

use anyhow::Context;
use clap::Parser;
use config::{AppConfig, Cli};
use eframe::egui;
use gui::EnrollmentApp;

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();
    let config = AppConfig::resolve(&cli).context("Invalid configuration")?;
    log::info!("Using data source {}", config.data_source);

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([960.0, 600.0])
            .with_title(config.window.title.clone()),
        ..Default::default()
    };

    // Run the application
    let title = config.window.title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(|cc| Ok(Box::new(EnrollmentApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))
}
