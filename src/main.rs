mod app;
mod config;
mod upload;
mod utils;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use app::SheetUploader;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::load_config().context("loading uploader configuration")?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([520.0, 560.0])
            .with_min_inner_size([400.0, 460.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sheet Uploader",
        options,
        Box::new(move |cc| Box::new(SheetUploader::new(cc, config))),
    )
    .map_err(|e| anyhow::anyhow!("window failed: {e}"))
}
