use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::filter::FilteredView;
use super::model::{CellValue, ColumnKind, Dataset, Record};

// ---------------------------------------------------------------------------
// Designated columns
// ---------------------------------------------------------------------------

/// Names of the columns the dashboard aggregates over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    /// Current position value.
    pub position: String,
    /// Amount contributed by the client.
    pub contributed: String,
    /// Return in percent.
    pub return_pct: String,
    /// Portfolio name used for breakdowns and ranking.
    pub category: String,
    /// Client identifier, counted distinctly in the ranking.
    pub client: String,
    /// Preferred date column for the monthly series.
    pub date: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            position: "Posição".to_string(),
            contributed: "Valor aportado".to_string(),
            return_pct: "Rentabilidade".to_string(),
            category: "Carteira".to_string(),
            client: "Cliente".to_string(),
            date: "Entrada".to_string(),
        }
    }
}

/// The designated columns that actually exist with the expected kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFields<'a> {
    pub position: Option<&'a str>,
    pub contributed: Option<&'a str>,
    pub return_pct: Option<&'a str>,
    pub category: Option<&'a str>,
    pub client: Option<&'a str>,
    pub date: Option<&'a str>,
}

impl<'a> ResolvedFields<'a> {
    pub fn resolve(dataset: &'a Dataset, fields: &'a FieldNames) -> Self {
        let numeric = |name: &'a String| {
            dataset
                .has(name, ColumnKind::Numeric)
                .then_some(name.as_str())
        };
        let date = if dataset.has(&fields.date, ColumnKind::Temporal) {
            Some(fields.date.as_str())
        } else {
            dataset.columns_of(ColumnKind::Temporal).into_iter().next()
        };
        Self {
            position: numeric(&fields.position),
            contributed: numeric(&fields.contributed),
            return_pct: numeric(&fields.return_pct),
            category: dataset
                .has(&fields.category, ColumnKind::Categorical)
                .then_some(fields.category.as_str()),
            client: dataset
                .column_kinds
                .contains_key(&fields.client)
                .then_some(fields.client.as_str()),
            date,
        }
    }
}

fn number(record: &Record, column: Option<&str>) -> Option<f64> {
    column.and_then(|c| record.number(c))
}

// ---------------------------------------------------------------------------
// Accumulators
// ---------------------------------------------------------------------------

/// Running mean; an empty mean is reported as zero.
#[derive(Debug, Clone, Copy, Default)]
struct MeanAcc {
    sum: f64,
    n: usize,
}

impl MeanAcc {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.n += 1;
        }
    }

    fn mean(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.sum / self.n as f64
        }
    }
}

#[derive(Debug, Clone, Default)]
struct GroupAcc {
    position: f64,
    contributed: f64,
    count: usize,
    returns: MeanAcc,
    clients: BTreeSet<CellValue>,
}

impl GroupAcc {
    fn push(&mut self, record: &Record, fields: &ResolvedFields<'_>) {
        self.position += number(record, fields.position).unwrap_or(0.0);
        self.contributed += number(record, fields.contributed).unwrap_or(0.0);
        self.count += 1;
        self.returns.push(number(record, fields.return_pct));
        if let Some(val) = fields.client.and_then(|c| record.get(c)) {
            if !val.is_null() {
                self.clients.insert(val.clone());
            }
        }
    }
}

/// Group the view by category. Missing categories form their own group.
fn group_by_category(
    view: &FilteredView<'_>,
    category: &str,
    fields: &ResolvedFields<'_>,
) -> BTreeMap<CellValue, GroupAcc> {
    let mut groups: BTreeMap<CellValue, GroupAcc> = BTreeMap::new();
    for record in view.records() {
        let key = record.get(category).cloned().unwrap_or(CellValue::Null);
        groups.entry(key).or_default().push(record, fields);
    }
    groups
}

// ---------------------------------------------------------------------------
// Scalar KPIs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kpis {
    pub rows: usize,
    pub total_position: f64,
    pub total_contributed: f64,
    pub mean_return: f64,
    /// `total_position - total_contributed`.
    pub result: f64,
}

/// Headline numbers. Absent columns contribute zero.
pub fn kpis(view: &FilteredView<'_>, fields: &FieldNames) -> Kpis {
    let resolved = ResolvedFields::resolve(view.dataset(), fields);
    let mut acc = GroupAcc::default();
    for record in view.records() {
        acc.push(record, &resolved);
    }
    Kpis {
        rows: acc.count,
        total_position: acc.position,
        total_contributed: acc.contributed,
        mean_return: acc.returns.mean(),
        result: acc.position - acc.contributed,
    }
}

// ---------------------------------------------------------------------------
// Monthly series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyTotals {
    /// First day of the month.
    pub month: NaiveDate,
    pub contributed: f64,
    pub position: f64,
    pub count: usize,
}

/// Totals per calendar month of the date column, oldest first.
/// Needs a date column and the contributed column; rows without a date are skipped.
pub fn monthly_series(view: &FilteredView<'_>, fields: &FieldNames) -> Option<Vec<MonthlyTotals>> {
    let resolved = ResolvedFields::resolve(view.dataset(), fields);
    let date_col = resolved.date?;
    resolved.contributed?;

    let mut months: BTreeMap<NaiveDate, GroupAcc> = BTreeMap::new();
    for record in view.records() {
        let Some(month) = record
            .get(date_col)
            .and_then(CellValue::as_date)
            .and_then(|d| d.with_day(1))
        else {
            continue;
        };
        months.entry(month).or_default().push(record, &resolved);
    }

    Some(
        months
            .into_iter()
            .map(|(month, acc)| MonthlyTotals {
                month,
                contributed: acc.contributed,
                position: acc.position,
                count: acc.count,
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Category breakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBreakdown {
    pub category: CellValue,
    pub position: f64,
    pub contributed: f64,
    pub count: usize,
    pub mean_return: f64,
    /// `position - contributed`.
    pub result: f64,
}

/// Per-category totals, smallest position first.
/// Needs the category and position columns.
pub fn category_breakdown(
    view: &FilteredView<'_>,
    fields: &FieldNames,
) -> Option<Vec<CategoryBreakdown>> {
    let resolved = ResolvedFields::resolve(view.dataset(), fields);
    let category = resolved.category?;
    resolved.position?;

    let mut rows: Vec<CategoryBreakdown> = group_by_category(view, category, &resolved)
        .into_iter()
        .map(|(category, acc)| CategoryBreakdown {
            category,
            position: acc.position,
            contributed: acc.contributed,
            count: acc.count,
            mean_return: acc.returns.mean(),
            result: acc.position - acc.contributed,
        })
        .collect();
    rows.sort_by(|a, b| a.position.total_cmp(&b.position));
    Some(rows)
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CompositionSlice {
    pub category: CellValue,
    pub position: f64,
    /// Share of the total position, in percent.
    pub share_pct: f64,
}

/// Each category's share of the total position, largest first.
pub fn composition(view: &FilteredView<'_>, fields: &FieldNames) -> Option<Vec<CompositionSlice>> {
    let resolved = ResolvedFields::resolve(view.dataset(), fields);
    let category = resolved.category?;
    resolved.position?;

    let groups = group_by_category(view, category, &resolved);
    let total: f64 = groups.values().map(|g| g.position).sum();

    let mut slices: Vec<CompositionSlice> = groups
        .into_iter()
        .map(|(category, acc)| CompositionSlice {
            category,
            position: acc.position,
            share_pct: if total == 0.0 {
                0.0
            } else {
                acc.position / total * 100.0
            },
        })
        .collect();
    slices.sort_by(|a, b| b.position.total_cmp(&a.position));
    Some(slices)
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RankingEntry {
    pub category: CellValue,
    pub mean_return: f64,
    pub position: f64,
    pub contributed: f64,
    /// Distinct client identifiers in the group.
    pub clients: usize,
}

/// Categories ordered by mean return, best first.
/// Needs the category and return columns.
pub fn ranking(view: &FilteredView<'_>, fields: &FieldNames) -> Option<Vec<RankingEntry>> {
    let resolved = ResolvedFields::resolve(view.dataset(), fields);
    let category = resolved.category?;
    resolved.return_pct?;

    let mut rows: Vec<RankingEntry> = group_by_category(view, category, &resolved)
        .into_iter()
        .map(|(category, acc)| RankingEntry {
            category,
            mean_return: acc.returns.mean(),
            position: acc.position,
            contributed: acc.contributed,
            clients: acc.clients.len(),
        })
        .collect();
    rows.sort_by(|a, b| b.mean_return.total_cmp(&a.mean_return));
    Some(rows)
}

// ---------------------------------------------------------------------------
// Return distribution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnDistribution {
    pub negative: Vec<HistogramBin>,
    pub non_negative: Vec<HistogramBin>,
    pub mean: f64,
}

/// Histograms of negative and non-negative returns plus their overall mean.
pub fn return_distribution(
    view: &FilteredView<'_>,
    fields: &FieldNames,
    negative_bins: usize,
    non_negative_bins: usize,
) -> Option<ReturnDistribution> {
    let resolved = ResolvedFields::resolve(view.dataset(), fields);
    let column = resolved.return_pct?;

    let mut mean = MeanAcc::default();
    let (negative, non_negative): (Vec<f64>, Vec<f64>) = view
        .records()
        .filter_map(|r| r.number(column))
        .inspect(|&v| mean.push(Some(v)))
        .partition(|&v| v < 0.0);

    Some(ReturnDistribution {
        negative: histogram(&negative, negative_bins),
        non_negative: histogram(&non_negative, non_negative_bins),
        mean: mean.mean(),
    })
}

/// Equal-width histogram over the span of `values`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    let (min, max) = values
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if max <= min {
        return vec![HistogramBin {
            start: min,
            end: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        if let Some(bin) = out.get_mut(idx) {
            bin.count += 1;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

/// Distinct non-missing client identifiers in the view.
pub fn distinct_clients(view: &FilteredView<'_>, fields: &FieldNames) -> Option<usize> {
    let resolved = ResolvedFields::resolve(view.dataset(), fields);
    let column = resolved.client?;
    let clients: BTreeSet<&CellValue> = view
        .records()
        .filter_map(|r| r.get(column))
        .filter(|v| !v.is_null())
        .collect();
    Some(clients.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{FilterSelection, select_none};

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn f(v: f64) -> CellValue {
        CellValue::Float(v)
    }

    fn day(y: i32, m: u32, d: u32) -> CellValue {
        CellValue::Date(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    fn columns() -> Vec<String> {
        ["Carteira", "Posição", "Valor aportado", "Rentabilidade", "Cliente", "Entrada"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    fn portfolio() -> Dataset {
        Dataset::from_rows(
            columns(),
            vec![
                vec![s("A"), f(100.0), f(80.0), f(25.0), CellValue::Integer(1), day(2024, 3, 5)],
                vec![s("A"), f(200.0), f(250.0), f(-20.0), CellValue::Integer(2), day(2024, 1, 20)],
                vec![s("B"), f(300.0), f(200.0), f(50.0), CellValue::Integer(1), day(2024, 3, 28)],
            ],
        )
    }

    #[test]
    fn test_breakdown_scenario() {
        let ds = portfolio();
        let view = FilteredView::all(&ds);
        let rows = category_breakdown(&view, &FieldNames::default()).unwrap();
        let a = rows.iter().find(|r| r.category == s("A")).unwrap();
        let b = rows.iter().find(|r| r.category == s("B")).unwrap();
        assert_eq!((a.position, a.count), (300.0, 2));
        assert_eq!((b.position, b.count), (300.0, 1));
        assert_eq!(a.result, 300.0 - 330.0);
        assert_eq!(a.mean_return, 2.5);
    }

    #[test]
    fn test_breakdown_sums_to_kpi_total() {
        let mut rows = vec![
            vec![s("A"), f(10.5), f(1.0), f(1.0), s("x"), day(2024, 1, 1)],
            vec![CellValue::Null, f(4.25), f(1.0), f(1.0), s("y"), day(2024, 1, 2)],
            vec![s("C"), f(7.0), f(1.0), f(1.0), s("z"), day(2024, 1, 3)],
        ];
        rows.push(vec![s("C"), CellValue::Null, f(2.0), f(3.0), s("z"), day(2024, 2, 1)]);
        let ds = Dataset::from_rows(columns(), rows);
        let view = FilteredView::all(&ds);
        let fields = FieldNames::default();

        let total: f64 = category_breakdown(&view, &fields)
            .unwrap()
            .iter()
            .map(|r| r.position)
            .sum();
        assert_eq!(total, kpis(&view, &fields).total_position);
    }

    #[test]
    fn test_kpis() {
        let ds = portfolio();
        let k = kpis(&FilteredView::all(&ds), &FieldNames::default());
        assert_eq!(k.rows, 3);
        assert_eq!(k.total_position, 600.0);
        assert_eq!(k.total_contributed, 530.0);
        assert_eq!(k.result, 70.0);
        assert!((k.mean_return - 55.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_view_is_all_zeros() {
        let ds = portfolio();
        let mut sel = FilterSelection::new();
        select_none(&mut sel, "Carteira");
        let view = FilteredView::new(&ds, &sel);
        let fields = FieldNames::default();

        assert_eq!(kpis(&view, &fields), Kpis::default());
        assert!(category_breakdown(&view, &fields).unwrap().is_empty());
        assert!(ranking(&view, &fields).unwrap().is_empty());
        assert!(monthly_series(&view, &fields).unwrap().is_empty());
        assert!(composition(&view, &fields).unwrap().is_empty());
        let dist = return_distribution(&view, &fields, 20, 30).unwrap();
        assert!(dist.negative.is_empty() && dist.non_negative.is_empty());
        assert_eq!(dist.mean, 0.0);
        assert_eq!(distinct_clients(&view, &fields), Some(0));
    }

    #[test]
    fn test_monthly_series_sorted_by_month() {
        let ds = portfolio();
        let series = monthly_series(&FilteredView::all(&ds), &FieldNames::default()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].month, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(series[0].contributed, 250.0);
        assert_eq!(series[1].month, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(series[1].count, 2);
        assert_eq!(series[1].position, 400.0);
    }

    #[test]
    fn test_monthly_series_falls_back_to_first_date_column() {
        let ds = portfolio();
        let fields = FieldNames {
            date: "Próximo execução".to_string(),
            ..FieldNames::default()
        };
        assert_eq!(
            monthly_series(&FilteredView::all(&ds), &fields).map(|s| s.len()),
            Some(2)
        );
    }

    #[test]
    fn test_ranking_descending_with_distinct_clients() {
        let ds = portfolio();
        let rows = ranking(&FilteredView::all(&ds), &FieldNames::default()).unwrap();
        assert_eq!(rows[0].category, s("B"));
        assert_eq!(rows[0].clients, 1);
        assert_eq!(rows[1].category, s("A"));
        assert_eq!(rows[1].clients, 2);
        assert_eq!(rows[1].contributed, 330.0);
    }

    #[test]
    fn test_composition_shares() {
        let ds = portfolio();
        let slices = composition(&FilteredView::all(&ds), &FieldNames::default()).unwrap();
        let total: f64 = slices.iter().map(|s| s.share_pct).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(slices[0].share_pct, 50.0);
    }

    #[test]
    fn test_missing_columns_skip_aggregations() {
        let ds = Dataset::from_rows(
            vec!["Carteira".into(), "Posição".into()],
            vec![vec![s("A"), f(1.0)], vec![s("B"), f(2.0)]],
        );
        let view = FilteredView::all(&ds);
        let fields = FieldNames::default();

        assert!(monthly_series(&view, &fields).is_none());
        assert!(ranking(&view, &fields).is_none());
        assert!(return_distribution(&view, &fields, 20, 30).is_none());
        assert!(distinct_clients(&view, &fields).is_none());
        assert_eq!(category_breakdown(&view, &fields).map(|r| r.len()), Some(2));

        let k = kpis(&view, &fields);
        assert_eq!(k.total_position, 3.0);
        assert_eq!(k.total_contributed, 0.0);
        assert_eq!(k.mean_return, 0.0);
    }

    #[test]
    fn test_text_position_column_is_not_summed() {
        let ds = Dataset::from_rows(
            vec!["Carteira".into(), "Posição".into()],
            vec![vec![s("A"), s("muito")], vec![s("B"), s("pouco")]],
        );
        let view = FilteredView::all(&ds);
        assert!(category_breakdown(&view, &FieldNames::default()).is_none());
        assert_eq!(kpis(&view, &FieldNames::default()).total_position, 0.0);
    }

    #[test]
    fn test_histogram_bins() {
        let bins = histogram(&[0.0, 1.0, 2.0, 10.0], 5);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[4].count, 1);

        let flat = histogram(&[3.0, 3.0], 10);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].count, 2);

        assert!(histogram(&[], 10).is_empty());
    }

    #[test]
    fn test_return_distribution_split() {
        let ds = portfolio();
        let dist = return_distribution(&FilteredView::all(&ds), &FieldNames::default(), 4, 4).unwrap();
        assert_eq!(dist.negative.iter().map(|b| b.count).sum::<usize>(), 1);
        assert_eq!(dist.non_negative.iter().map(|b| b.count).sum::<usize>(), 2);
        assert!((dist.mean - 55.0 / 3.0).abs() < 1e-9);
    }
}
