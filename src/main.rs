mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::Path;

use app::SalesExplorerApp;
use config::{ExplorerConfig, CONFIG_FILE};
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = ExplorerConfig::load_or_default(Path::new(CONFIG_FILE));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Explorer – Superstore Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(SalesExplorerApp::new(config)))),
    )
}
