use std::time::SystemTime;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use portfolio_panel::data::filter::ColumnFilter;
use portfolio_panel::data::source::Freshness;
use portfolio_panel::format::format_count;
use portfolio_panel::labels;

use crate::color;
use crate::state::AppState;

const APP_VERSION: &str = concat!("💼 Painel de Carteiras v", env!("CARGO_PKG_VERSION"));

/// Sidebar captions for well-known columns.
fn filter_label(column: &str) -> String {
    match column {
        "Carteira" => "📂 Carteira".to_string(),
        "Status" => "🔔 Status".to_string(),
        "Cód. Assessor Cliente" => "👤 Assessor".to_string(),
        "Entrada" => "📅 Período de Entrada".to_string(),
        "Última execução" => "🔄 Última Execução".to_string(),
        "Próximo execução" => "⏭️ Próxima Execução".to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    logo(ui, state);

    ui.heading("🔍 Filtros");
    ui.label(RichText::new("Ajuste os filtros para explorar os dados").small());
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            filters(ui, state);
            ui.separator();
            update_section(ui, state);
            ui.add_space(8.0);
            ui.label(RichText::new(APP_VERSION).small().weak());
        });
}

/// Theme-dependent logo from `<data_dir>/img`, if present.
fn logo(ui: &mut Ui, state: &AppState) {
    let variant = if ui.visuals().dark_mode {
        "logo-dark.png"
    } else {
        "logo-light.png"
    };
    let path = state.pipeline.config().data_dir.join("img").join(variant);
    if !path.is_file() {
        return;
    }
    let Ok(path) = path.canonicalize() else {
        return;
    };
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add(
            egui::Image::new(format!("file://{}", path.display()))
                .max_width(180.0_f32.min(ui.available_width()))
                .max_height(120.0),
        );
    });
    ui.add_space(4.0);
}

fn filters(ui: &mut Ui, state: &mut AppState) {
    let Some(snapshot) = state.snapshot.clone() else {
        ui.label("Nenhum dado carregado.");
        return;
    };
    let dataset = &snapshot.dataset;
    let category = state.pipeline.config().fields.category.clone();

    for col in &dataset.column_names {
        let Some(filter) = state.selection.get(col).cloned() else {
            continue;
        };

        match filter {
            // ---- Categorical: collapsible checkbox list ----
            ColumnFilter::Values(selected) => {
                let Some(all_values) = dataset.unique_values.get(col) else {
                    continue;
                };
                let header_text = format!(
                    "{}  ({}/{})",
                    filter_label(col),
                    selected.len(),
                    all_values.len()
                );

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("Todos").clicked() {
                                state.select_all(col);
                            }
                            if ui.small_button("Nenhum").clicked() {
                                state.select_none(col);
                            }
                        });

                        for val in all_values {
                            let mut checked = selected.contains(val);
                            let text = if *col == category {
                                RichText::new(labels::decorate(&val.to_string()))
                                    .color(state.color_map.color_for(val))
                            } else {
                                RichText::new(val.to_string())
                            };
                            if ui.checkbox(&mut checked, text).changed() {
                                state.toggle_filter_value(col, val);
                            }
                        }
                    });
            }

            // ---- Temporal: start / end date pickers ----
            ColumnFilter::DateRange {
                mut start,
                mut end,
                mut include_missing,
            } => {
                let Some((min, max)) = dataset.date_bounds(col) else {
                    continue;
                };
                ui.strong(filter_label(col));
                let start_id = format!("date_start_{col}");
                let end_id = format!("date_end_{col}");
                let mut changed = false;
                ui.horizontal(|ui: &mut Ui| {
                    changed |= ui
                        .add(egui_extras::DatePickerButton::new(&mut start).id_salt(&start_id))
                        .changed();
                    ui.label("até");
                    changed |= ui
                        .add(egui_extras::DatePickerButton::new(&mut end).id_salt(&end_id))
                        .changed();
                });
                if changed {
                    state.set_date_range(col, start.clamp(min, max), end.clamp(min, max));
                }
                if dataset.has_missing(col)
                    && ui.checkbox(&mut include_missing, "Incluir sem data").changed()
                {
                    state.set_include_missing_dates(col, include_missing);
                }
                ui.add_space(4.0);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Source file freshness and replacement
// ---------------------------------------------------------------------------

fn update_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🔄 Atualizar Dados");

    if let Some(snapshot) = &state.snapshot {
        let (text, colour) = match snapshot.source.freshness(SystemTime::now()) {
            Freshness::Today => ("📗 Atualizado hoje".to_string(), color::POSITIVE),
            Freshness::Yesterday => ("📙 Atualizado ontem".to_string(), color::WARNING),
            Freshness::DaysAgo(n) => (format!("📕 {n} dias atrás"), color::NEGATIVE),
        };
        ui.label(RichText::new(text).color(colour));
        ui.label(RichText::new(format!("📁 {}", snapshot.source.file_name())).small());
    }

    if ui.button("📤 Enviar novo arquivo do dia…").clicked() {
        open_file_dialog(state);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Arquivo", |ui: &mut Ui| {
            if ui.button("Substituir planilha…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Recarregar").clicked() {
                state.pipeline.invalidate();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(snapshot) = &state.snapshot {
            ui.label(format!(
                "{} de {} registros",
                format_count(snapshot.indices.len()),
                format_count(snapshot.dataset.len())
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

fn open_file_dialog(state: &mut AppState) {
    let extensions = state.pipeline.config().extensions.clone();
    let file = rfd::FileDialog::new()
        .set_title("Enviar nova planilha")
        .add_filter("Planilhas", extensions.as_slice())
        .pick_file();

    if let Some(path) = file {
        log::info!("uploading {}", path.display());
        state.upload(&path);
    }
}
