//! Sting - spinning sword viewer
//!
//! Reads `viewer.json` from the working directory when present and opens a
//! wgpu-backed window showing the configured OBJ asset.

use eframe::egui;
use log::error;
use sting_viewer::{constants, gpu, ViewerApp, ViewerConfig};

/// Application entry point
fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ViewerConfig::load_or_default("viewer.json").unwrap_or_else(|e| {
        error!("Invalid viewer.json, using defaults: {}", e);
        ViewerConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_title(constants::window::TITLE),
        renderer: eframe::Renderer::Wgpu,
        depth_buffer: gpu::DEPTH_BUFFER_BITS,
        ..Default::default()
    };

    eframe::run_native(
        constants::window::TITLE,
        options,
        Box::new(|cc| Ok(Box::new(ViewerApp::new(cc, config)?))),
    )
}
