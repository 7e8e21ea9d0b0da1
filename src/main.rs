//! Emendas Dashboard - Parliamentary Earmarks Interactive Dashboard
//!
//! Fetches the public earmark dataset, reshapes it and renders appropriation
//! charts plus the current year's execution table.

mod charts;
mod config;
mod data;
mod export;
mod gui;

use anyhow::{anyhow, Context};
use config::DashboardConfig;
use eframe::egui;
use gui::EmendasApp;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Configure logging
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let config = DashboardConfig::load().context("loading configuration")?;
    info!(
        endpoint = %config.endpoint,
        execution_year = config.execution_year,
        "starting dashboard"
    );

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("Emendas Parlamentares em grandes números"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Emendas Parlamentares",
        options,
        Box::new(move |cc| Ok(Box::new(EmendasApp::new(cc, config)))),
    )
    .map_err(|e| anyhow!("window error: {e}"))
}
