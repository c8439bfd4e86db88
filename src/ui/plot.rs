use std::ops::RangeInclusive;

use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Bar, BarChart, GridMark, HLine, Legend, Line, Plot, PlotPoints, VLine};

use portfolio_panel::data::aggregate::{
    CategoryBreakdown, CompositionSlice, HistogramBin, MonthlyTotals, RankingEntry,
    ReturnDistribution,
};
use portfolio_panel::format::{
    format_count, format_currency, format_number, format_signed_percent,
};
use portfolio_panel::labels;

use crate::color::{self, ColorMap};

const CHART_HEIGHT: f32 = 320.0;

/// Axis labels for charts whose argument axis is a category index.
fn index_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let rounded = mark.value.round();
        if (mark.value - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        labels.get(rounded as usize).cloned().unwrap_or_default()
    }
}

fn faded(c: Color32) -> Color32 {
    c.gamma_multiply(0.55)
}

// ---------------------------------------------------------------------------
// Monthly contributions
// ---------------------------------------------------------------------------

/// Contributed and position totals per month, as two lines.
pub fn monthly_chart(ui: &mut Ui, series: &[MonthlyTotals]) {
    let months: Vec<String> = series
        .iter()
        .map(|m| m.month.format("%m/%Y").to_string())
        .collect();

    let contributed: PlotPoints = series
        .iter()
        .enumerate()
        .map(|(i, m)| [i as f64, m.contributed])
        .collect();
    let position: PlotPoints = series
        .iter()
        .enumerate()
        .map(|(i, m)| [i as f64, m.position])
        .collect();

    Plot::new("monthly_chart")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .y_axis_label("Valor (R$)")
        .x_axis_formatter(index_formatter(months))
        .y_axis_formatter(|mark, _range| format_currency(mark.value))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(contributed)
                    .name("💰 Aportado")
                    .color(color::PRIMARY)
                    .width(2.0),
            );
            plot_ui.line(
                Line::new(position)
                    .name("📈 Posição")
                    .color(color::SECONDARY)
                    .width(2.0),
            );
        });
}

// ---------------------------------------------------------------------------
// Position per portfolio
// ---------------------------------------------------------------------------

/// Horizontal bars of position per category, largest on top.
pub fn breakdown_chart(ui: &mut Ui, rows: &[CategoryBreakdown]) {
    let names: Vec<String> = rows
        .iter()
        .map(|r| labels::decorate(&r.category.to_string()))
        .collect();

    let bars: Vec<Bar> = rows
        .iter()
        .zip(&names)
        .enumerate()
        .map(|(i, (r, name))| {
            Bar::new(i as f64, r.position)
                .name(format!(
                    "{name}\n📥 Aportado: {}\n👥 Nº de posições: {}\n📊 Rentab. média: {}\n💵 Resultado: {}",
                    format_currency(r.contributed),
                    format_count(r.count),
                    format_signed_percent(r.mean_return, 2),
                    format_currency(r.result),
                ))
                .fill(faded(color::PRIMARY))
                .stroke(Stroke::new(1.0, color::PRIMARY))
        })
        .collect();

    let chart = BarChart::new(bars)
        .horizontal()
        .element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| {
            format!("{}\n📈 Posição: {}", bar.name, format_currency(bar.value))
        }));

    Plot::new("breakdown_chart")
        .height(CHART_HEIGHT)
        .x_axis_label("Posição (R$)")
        .x_axis_formatter(|mark, _range| format_currency(mark.value))
        .y_axis_formatter(index_formatter(names))
        .allow_scroll(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Share of total position per category, largest first.
pub fn composition_chart(ui: &mut Ui, slices: &[CompositionSlice], colors: &ColorMap) {
    let names: Vec<String> = slices
        .iter()
        .map(|s| labels::decorate(&s.category.to_string()))
        .collect();

    let bars: Vec<Bar> = slices
        .iter()
        .zip(&names)
        .enumerate()
        .map(|(i, (s, name))| {
            Bar::new(i as f64, s.share_pct)
                .name(format!("{name}\n💰 Valor: {}", format_currency(s.position)))
                .fill(colors.color_for(&s.category))
        })
        .collect();

    let chart = BarChart::new(bars).element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| {
        format!("{}\n📊 Participação: {}%", bar.name, format_number(bar.value, 1))
    }));

    Plot::new("composition_chart")
        .height(CHART_HEIGHT)
        .y_axis_label("Participação (%)")
        .x_axis_formatter(index_formatter(names))
        .allow_scroll(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

// ---------------------------------------------------------------------------
// Return distribution
// ---------------------------------------------------------------------------

fn histogram_bars(bins: &[HistogramBin], colour: Color32) -> Vec<Bar> {
    bins.iter()
        .map(|b| {
            let width = (b.end - b.start).max(0.1);
            Bar::new((b.start + b.end) / 2.0, b.count as f64)
                .width(width)
                .name(format!(
                    "Faixa: {}% a {}%",
                    format_number(b.start, 1),
                    format_number(b.end, 1)
                ))
                .fill(faded(colour))
                .stroke(Stroke::new(1.0, colour))
        })
        .collect()
}

/// Histogram of returns, negative and non-negative in separate colours,
/// with a marker at the mean.
pub fn returns_chart(ui: &mut Ui, dist: &ReturnDistribution) {
    let negative = BarChart::new(histogram_bars(&dist.negative, color::NEGATIVE)).name("📉 Negativa");
    let positive =
        BarChart::new(histogram_bars(&dist.non_negative, color::POSITIVE)).name("📈 Positiva");
    let mean = VLine::new(dist.mean)
        .name(format!("Média: {}", format_signed_percent(dist.mean, 1)))
        .color(color::PRIMARY);

    Plot::new("returns_chart")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("Rentabilidade (%)")
        .y_axis_label("Nº de Posições")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(negative);
            plot_ui.bar_chart(positive);
            plot_ui.vline(mean);
        });
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Mean return per category, best first, green above zero and red below.
pub fn ranking_chart(ui: &mut Ui, rows: &[RankingEntry]) {
    let names: Vec<String> = rows
        .iter()
        .map(|r| labels::decorate(&r.category.to_string()))
        .collect();

    let bars: Vec<Bar> = rows
        .iter()
        .zip(&names)
        .enumerate()
        .map(|(i, (r, name))| {
            let c = color::signed(r.mean_return);
            Bar::new(i as f64, r.mean_return)
                .name(format!(
                    "{name}\n📈 Posição total: {}\n📥 Aportado total: {}\n👥 Clientes únicos: {}",
                    format_currency(r.position),
                    format_currency(r.contributed),
                    format_count(r.clients),
                ))
                .fill(faded(c))
                .stroke(Stroke::new(1.0, c))
        })
        .collect();

    let chart = BarChart::new(bars).element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| {
        format!("{}\n📊 Rentab. média: {}", bar.name, format_signed_percent(bar.value, 2))
    }));

    Plot::new("ranking_chart")
        .height(CHART_HEIGHT)
        .y_axis_label("Rentabilidade Média (%)")
        .x_axis_formatter(index_formatter(names))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(chart);
            plot_ui.hline(HLine::new(0.0).color(Color32::from_gray(128)).width(1.0));
        });
}
