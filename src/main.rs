mod app;
mod color;
mod state;
mod ui;

use app::PortfolioPanelApp;
use eframe::egui;
use portfolio_panel::DashboardConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load().unwrap_or_else(|e| {
        log::error!("invalid configuration, using defaults: {e:#}");
        DashboardConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Painel de Carteiras",
        options,
        Box::new(|cc| {
            // Install image loaders so egui can render the png logo.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(PortfolioPanelApp::new(config)))
        }),
    )
}
