use eframe::egui;
use portfolio_panel::DashboardConfig;

use crate::state::AppState;
use crate::ui::{dashboard, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct PortfolioPanelApp {
    pub state: AppState,
}

impl PortfolioPanelApp {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for PortfolioPanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Same pipeline every frame; unchanged inputs hit the memo.
        self.state.refresh();

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters and upload ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: KPIs, charts, tables ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard::central_panel(ui, &self.state);
        });

        // Pick up a replaced file without user input.
        let rescan = self.state.pipeline.config().rescan_secs.max(1);
        ctx.request_repaint_after(std::time::Duration::from_secs(rescan));
    }
}
