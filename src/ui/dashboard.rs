use chrono::{DateTime, Local};
use eframe::egui::{self, Align, Color32, Frame, Layout, RichText, ScrollArea, Ui};

use portfolio_panel::format::{format_count, format_currency, format_signed_percent};
use portfolio_panel::DashboardSnapshot;

use crate::color;
use crate::state::AppState;
use crate::ui::{plot, table};

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

pub fn central_panel(ui: &mut Ui, state: &AppState) {
    if let Some(msg) = &state.fatal_message {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.add_space(80.0);
            ui.heading(RichText::new("❌ Nenhuma planilha encontrada").color(color::NEGATIVE));
            ui.label(msg);
            ui.label("Use \"📤 Enviar novo arquivo do dia…\" na barra lateral para carregar uma.");
        });
        return;
    }

    let Some(snapshot) = state.snapshot.as_deref() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.spinner();
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            header(ui, snapshot);
            ui.add_space(8.0);
            kpi_row(ui, snapshot);
            ui.separator();

            if snapshot.indices.is_empty() {
                ui.label(
                    RichText::new("⚠️ Nenhum registro corresponde aos filtros selecionados.")
                        .color(color::WARNING),
                );
            }

            ui.columns(2, |cols| {
                section(&mut cols[0], "📅 Aportes por Mês de Entrada", |ui| {
                    match &snapshot.monthly {
                        Some(series) => plot::monthly_chart(ui, series),
                        None => missing_columns(ui, "Entrada e Valor aportado"),
                    }
                });
                section(&mut cols[1], "💼 Posição por Carteira", |ui| {
                    match &snapshot.breakdown {
                        Some(rows) => plot::breakdown_chart(ui, rows),
                        None => missing_columns(ui, "Carteira e Posição"),
                    }
                });
            });

            ui.add_space(8.0);
            ui.columns(2, |cols| {
                section(&mut cols[0], "🥧 Composição da Carteira", |ui| {
                    match &snapshot.composition {
                        Some(slices) => plot::composition_chart(ui, slices, &state.color_map),
                        None => missing_columns(ui, "Carteira e Posição"),
                    }
                });
                section(&mut cols[1], "📊 Distribuição de Rentabilidade", |ui| {
                    match &snapshot.returns {
                        Some(dist) => plot::returns_chart(ui, dist),
                        None => missing_columns(ui, "Rentabilidade"),
                    }
                });
            });

            ui.separator();
            section(ui, "🏆 Ranking de Rentabilidade por Carteira", |ui| {
                match &snapshot.ranking {
                    Some(rows) => {
                        plot::ranking_chart(ui, rows);
                        ui.add_space(6.0);
                        table::ranking_table(ui, rows);
                    }
                    None => missing_columns(ui, "Carteira e Rentabilidade"),
                }
            });

            ui.separator();
            raw_data(ui, state, snapshot);
        });
}

fn header(ui: &mut Ui, snapshot: &DashboardSnapshot) {
    ui.heading(RichText::new("💼 Painel de Carteiras — Renda Variável").strong());
    let modified: DateTime<Local> = snapshot.source.modified.into();
    ui.label(
        RichText::new(format!(
            "📄 Fonte: {} · 🕐 Atualizado em {}",
            snapshot.source.file_name(),
            modified.format("%d/%m/%Y às %H:%M"),
        ))
        .weak(),
    );
}

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

fn kpi_row(ui: &mut Ui, snapshot: &DashboardSnapshot) {
    let k = &snapshot.kpis;
    ui.columns(4, |cols| {
        kpi_card(&mut cols[0], "📊 Total de Posições", format_count(k.rows), None);
        kpi_card(
            &mut cols[1],
            "💰 Patrimônio Atual",
            format_currency(k.total_position),
            None,
        );
        kpi_card(
            &mut cols[2],
            "📥 Total Aportado",
            format_currency(k.total_contributed),
            None,
        );
        kpi_card(
            &mut cols[3],
            "📈 Rentabilidade Média",
            format_signed_percent(k.mean_return, 2),
            Some((
                format!("Resultado: {}", format_currency(k.result)),
                color::signed(k.result),
            )),
        );
    });
}

fn kpi_card(ui: &mut Ui, title: &str, value: String, delta: Option<(String, Color32)>) {
    Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_width(ui.available_width());
        ui.with_layout(Layout::top_down(Align::Min), |ui: &mut Ui| {
            ui.label(RichText::new(title).small());
            ui.label(RichText::new(value).size(22.0).strong());
            if let Some((text, colour)) = delta {
                ui.label(RichText::new(text).small().color(colour));
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn section(ui: &mut Ui, title: &str, body: impl FnOnce(&mut Ui)) {
    ui.label(RichText::new(title).strong().size(16.0));
    body(ui);
}

fn missing_columns(ui: &mut Ui, needed: &str) {
    ui.label(
        RichText::new(format!("ℹ️ Colunas necessárias não encontradas: {needed}."))
            .color(color::WARNING),
    );
}

fn raw_data(ui: &mut Ui, state: &AppState, snapshot: &DashboardSnapshot) {
    egui::CollapsingHeader::new(RichText::new("📋 Ver Dados Completos").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let fields = &state.pipeline.config().fields;
            table::raw_data_table(ui, &snapshot.dataset, &snapshot.indices, fields);

            let mut caption = format!(
                "Exibindo {} de {} registros após filtros",
                format_count(snapshot.indices.len()),
                format_count(snapshot.dataset.len()),
            );
            if let Some(clients) = snapshot.clients {
                caption.push_str(&format!(" · {} clientes únicos", format_count(clients)));
            }
            ui.label(RichText::new(caption).small().weak());
        });
}
