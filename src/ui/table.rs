use eframe::egui::{RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use portfolio_panel::data::aggregate::{FieldNames, RankingEntry};
use portfolio_panel::data::model::{CellValue, Dataset};
use portfolio_panel::format::{
    format_count, format_currency, format_percent, format_plain_currency, format_signed_percent,
};
use portfolio_panel::labels;

use crate::color;

const ROW_HEIGHT: f32 = 18.0;
const HEADER_HEIGHT: f32 = 22.0;

/// Per-category summary under the ranking chart.
pub fn ranking_table(ui: &mut Ui, rows: &[RankingEntry]) {
    ui.push_id("ranking_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .column(Column::auto().at_least(32.0))
            .column(Column::remainder().at_least(160.0))
            .columns(Column::auto().at_least(110.0), 4)
            .header(HEADER_HEIGHT, |mut header| {
                for title in [
                    "#",
                    "Carteira",
                    "Rentab. Média",
                    "Posição Total",
                    "Aportado Total",
                    "Clientes",
                ] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for (i, entry) in rows.iter().enumerate() {
                    body.row(ROW_HEIGHT, |mut row| {
                        row.col(|ui: &mut Ui| {
                            ui.label(format!("{}", i + 1));
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(labels::decorate(&entry.category.to_string()));
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(
                                RichText::new(format_signed_percent(entry.mean_return, 2))
                                    .color(color::signed(entry.mean_return)),
                            );
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(format_currency(entry.position));
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(format_currency(entry.contributed));
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(format_count(entry.clients));
                        });
                    });
                }
            });
    });
}

/// Cell text for the raw data grid; money and return columns get their
/// display format, missing cells render empty.
fn cell_text(column: &str, value: Option<&CellValue>, fields: &FieldNames) -> String {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return String::new();
    };
    match value.as_f64() {
        Some(v) if column == fields.position || column == fields.contributed => {
            format_plain_currency(v)
        }
        Some(v) if column == fields.return_pct => format_percent(v, 2),
        _ => value.to_string(),
    }
}

/// Every column of the filtered rows, virtualised.
pub fn raw_data_table(ui: &mut Ui, dataset: &Dataset, indices: &[usize], fields: &FieldNames) {
    let columns = &dataset.column_names;
    if columns.is_empty() {
        return;
    }

    ui.push_id("raw_data_table", |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(400.0)
                .columns(Column::auto().at_least(90.0).clip(true), columns.len())
                .header(HEADER_HEIGHT, |mut header| {
                    for name in columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, indices.len(), |mut row| {
                        let Some(record) = indices
                            .get(row.index())
                            .and_then(|&i| dataset.records.get(i))
                        else {
                            return;
                        };
                        for name in columns {
                            row.col(|ui: &mut Ui| {
                                ui.label(cell_text(name, record.get(name), fields));
                            });
                        }
                    });
                });
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_and_return_columns_are_formatted() {
        let fields = FieldNames::default();
        assert_eq!(
            cell_text(&fields.position, Some(&CellValue::Float(1234.5)), &fields),
            "R$ 1.234,50"
        );
        assert_eq!(
            cell_text(&fields.return_pct, Some(&CellValue::Float(-3.456)), &fields),
            "-3,46%"
        );
        assert_eq!(
            cell_text("Carteira", Some(&CellValue::String("Dividendos".into())), &fields),
            "Dividendos"
        );
    }

    #[test]
    fn test_missing_cells_render_empty() {
        let fields = FieldNames::default();
        assert_eq!(cell_text(&fields.position, Some(&CellValue::Null), &fields), "");
        assert_eq!(cell_text("Carteira", None, &fields), "");
    }
}
