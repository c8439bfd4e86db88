use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use chrono::NaiveDate;

use super::model::{CellValue, ColumnKind, Dataset, Record};

// ---------------------------------------------------------------------------
// Filter selection: which values / dates are accepted per column
// ---------------------------------------------------------------------------

/// Constraint on a single column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnFilter {
    /// Row passes when its value is one of these. Empty set → nothing passes.
    Values(BTreeSet<CellValue>),
    /// Row passes when its date (time of day dropped) lies in `[start, end]`.
    /// Rows without a date pass only with `include_missing`.
    DateRange {
        start: NaiveDate,
        end: NaiveDate,
        include_missing: bool,
    },
}

impl ColumnFilter {
    pub fn date_range(range: RangeInclusive<NaiveDate>) -> Self {
        let (start, end) = range.into_inner();
        ColumnFilter::DateRange {
            start,
            end,
            include_missing: false,
        }
    }

    /// Whether a single cell satisfies this constraint.
    pub fn accepts(&self, value: &CellValue) -> bool {
        match self {
            ColumnFilter::Values(allowed) => allowed.contains(value),
            ColumnFilter::DateRange {
                start,
                end,
                include_missing,
            } => match value.as_date() {
                Some(d) => *start <= d && d <= *end,
                None => *include_missing,
            },
        }
    }
}

/// Per-column selection state: maps column_name → constraint.
/// A column absent from the map is unconstrained.
pub type FilterSelection = BTreeMap<String, ColumnFilter>;

/// Bounds on how many distinct values a categorical column may have to be
/// offered as a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterLimits {
    pub min_distinct: usize,
    pub max_distinct: usize,
}

impl Default for FilterLimits {
    fn default() -> Self {
        Self {
            min_distinct: 2,
            max_distinct: 60,
        }
    }
}

/// Initialise a [`FilterSelection`] that accepts every row.
///
/// Categorical columns with a filterable number of distinct values get their
/// full value set, temporal columns their full date span. Missing cells pass
/// both.
pub fn init_filter_state(dataset: &Dataset, limits: FilterLimits) -> FilterSelection {
    let mut selection = FilterSelection::new();

    for col in dataset.columns_of(ColumnKind::Categorical) {
        let distinct = dataset.distinct_values(col).len();
        if distinct < limits.min_distinct || distinct > limits.max_distinct {
            continue;
        }
        if let Some(all_vals) = dataset.unique_values.get(col) {
            selection.insert(col.to_string(), ColumnFilter::Values(all_vals.clone()));
        }
    }

    for col in dataset.columns_of(ColumnKind::Temporal) {
        if let Some((start, end)) = dataset.date_bounds(col) {
            selection.insert(
                col.to_string(),
                ColumnFilter::DateRange {
                    start,
                    end,
                    include_missing: true,
                },
            );
        }
    }

    selection
}

/// Whether a record satisfies every entry of the selection.
pub fn record_passes(record: &Record, selection: &FilterSelection) -> bool {
    selection.iter().all(|(col, filter)| {
        // A column the record lacks reads as a missing cell.
        let value = record.get(col).unwrap_or(&CellValue::Null);
        filter.accepts(value)
    })
}

/// Return indices of records that pass all active filters.
///
/// A record passes a column filter when:
/// * The column is not present in `selection` → passes (no constraint)
/// * The value set for that column is empty → nothing selected → fails
/// * The record's value is in the set / its date is within the range → passes
pub fn filtered_indices(dataset: &Dataset, selection: &FilterSelection) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| record_passes(rec, selection))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// FilteredView – the rows of a dataset that survived filtering
// ---------------------------------------------------------------------------

/// Read-only view over the records of a dataset that passed a selection.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// Apply `selection` to `dataset`.
    pub fn new(dataset: &'a Dataset, selection: &FilterSelection) -> Self {
        Self {
            dataset,
            indices: filtered_indices(dataset, selection),
        }
    }

    /// View over every record.
    pub fn all(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    /// Rebuild a view from indices computed earlier for the same dataset.
    /// Out-of-range indices are dropped.
    pub fn from_indices(dataset: &'a Dataset, indices: &[usize]) -> Self {
        Self {
            dataset,
            indices: indices
                .iter()
                .copied()
                .filter(|&i| i < dataset.len())
                .collect(),
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Records of the view, in dataset order.
    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = &self.dataset.records;
        self.indices.iter().filter_map(move |&i| records.get(i))
    }

    /// Narrow the view further with another selection.
    pub fn refine(&self, selection: &FilterSelection) -> Self {
        let records = &self.dataset.records;
        Self {
            dataset: self.dataset,
            indices: self
                .indices
                .iter()
                .copied()
                .filter(|&i| records.get(i).is_some_and(|r| record_passes(r, selection)))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Selection editing helpers used by the sidebar
// ---------------------------------------------------------------------------

/// Toggle a single value in a column's value set (creating the set if needed).
pub fn toggle_value(selection: &mut FilterSelection, column: &str, value: &CellValue) {
    let entry = selection
        .entry(column.to_string())
        .or_insert_with(|| ColumnFilter::Values(BTreeSet::new()));
    if let ColumnFilter::Values(selected) = entry {
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
    }
}

/// Select every value of a column.
pub fn select_all(selection: &mut FilterSelection, dataset: &Dataset, column: &str) {
    if let Some(all_vals) = dataset.unique_values.get(column) {
        selection.insert(column.to_string(), ColumnFilter::Values(all_vals.clone()));
    }
}

/// Deselect every value of a column.
pub fn select_none(selection: &mut FilterSelection, column: &str) {
    selection.insert(column.to_string(), ColumnFilter::Values(BTreeSet::new()));
}

/// Replace the date range of a column. Reversed bounds are swapped; rows
/// without a date no longer pass.
pub fn set_date_range(
    selection: &mut FilterSelection,
    column: &str,
    start: NaiveDate,
    end: NaiveDate,
) {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    selection.insert(
        column.to_string(),
        ColumnFilter::DateRange {
            start,
            end,
            include_missing: false,
        },
    );
}

/// Let rows without a date through a column's date range, or stop them.
pub fn set_include_missing_dates(selection: &mut FilterSelection, column: &str, include: bool) {
    if let Some(ColumnFilter::DateRange {
        include_missing, ..
    }) = selection.get_mut(column)
    {
        *include_missing = include;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dt(y: i32, m: u32, d: u32, h: u32) -> CellValue {
        CellValue::Date(date(y, m, d).and_hms_opt(h, 30, 0).unwrap())
    }

    fn sample() -> Dataset {
        Dataset::from_rows(
            vec!["Carteira".into(), "Status".into(), "Entrada".into()],
            vec![
                vec![s("A"), s("Ativo"), dt(2024, 1, 10, 9)],
                vec![s("A"), s("Inativo"), dt(2024, 2, 10, 23)],
                vec![s("B"), s("Ativo"), dt(2024, 3, 10, 0)],
                vec![s("C"), CellValue::Null, CellValue::Null],
            ],
        )
    }

    fn values(vals: &[CellValue]) -> ColumnFilter {
        ColumnFilter::Values(vals.iter().cloned().collect())
    }

    #[test]
    fn test_default_selection_keeps_everything() {
        let ds = sample();
        let sel = init_filter_state(&ds, FilterLimits::default());
        assert!(sel.contains_key("Carteira"));
        assert!(sel.contains_key("Entrada"));
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_edited_date_range_drops_missing_dates() {
        let ds = sample();
        let mut sel = init_filter_state(&ds, FilterLimits::default());
        set_date_range(&mut sel, "Entrada", date(2024, 1, 1), date(2024, 12, 31));
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 1, 2]);

        set_include_missing_dates(&mut sel, "Entrada", true);
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_default_selection_keeps_sparse_date_column() {
        let ds = Dataset::from_rows(
            vec!["Carteira".into(), "Próximo execução".into()],
            vec![
                vec![s("A"), dt(2024, 5, 1, 8)],
                vec![s("B"), CellValue::Null],
                vec![s("A"), CellValue::Null],
            ],
        );
        let sel = init_filter_state(&ds, FilterLimits::default());
        assert!(sel.contains_key("Próximo execução"));
        assert_eq!(filtered_indices(&ds, &sel).len(), ds.len());
    }

    #[test]
    fn test_empty_selection_is_unconstrained() {
        let ds = sample();
        assert_eq!(filtered_indices(&ds, &FilterSelection::new()).len(), ds.len());
    }

    #[test]
    fn test_empty_value_set_hides_everything() {
        let ds = sample();
        let mut sel = FilterSelection::new();
        select_none(&mut sel, "Carteira");
        assert!(filtered_indices(&ds, &sel).is_empty());
    }

    #[test]
    fn test_value_set_is_or_within_column() {
        let ds = sample();
        let mut sel = FilterSelection::new();
        sel.insert("Carteira".into(), values(&[s("A"), s("C")]));
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 1, 3]);
    }

    #[test]
    fn test_date_range_is_inclusive_on_calendar_dates() {
        let ds = sample();
        let mut sel = FilterSelection::new();
        set_date_range(&mut sel, "Entrada", date(2024, 2, 10), date(2024, 1, 10));
        // 23:30 on the end date is still inside the range.
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 1]);
    }

    #[test]
    fn test_disjoint_columns_combine_as_intersection() {
        let ds = sample();
        let mut by_cat = FilterSelection::new();
        by_cat.insert("Carteira".into(), values(&[s("A"), s("B")]));
        let mut by_status = FilterSelection::new();
        by_status.insert("Status".into(), values(&[s("Ativo")]));

        let mut both = by_cat.clone();
        both.extend(by_status.clone());

        let a: BTreeSet<usize> = filtered_indices(&ds, &by_cat).into_iter().collect();
        let b: BTreeSet<usize> = filtered_indices(&ds, &by_status).into_iter().collect();
        let combined: BTreeSet<usize> = filtered_indices(&ds, &both).into_iter().collect();
        assert_eq!(combined, a.intersection(&b).copied().collect());
        assert_eq!(combined, BTreeSet::from([0, 2]));
    }

    #[test]
    fn test_toggle_and_select_all() {
        let ds = sample();
        let mut sel = init_filter_state(&ds, FilterLimits::default());
        toggle_value(&mut sel, "Carteira", &s("A"));
        assert_eq!(filtered_indices(&ds, &sel), vec![2, 3]);

        toggle_value(&mut sel, "Carteira", &s("A"));
        assert_eq!(filtered_indices(&ds, &sel).len(), 4);

        select_none(&mut sel, "Status");
        select_all(&mut sel, &ds, "Status");
        assert_eq!(filtered_indices(&ds, &sel).len(), 4);
    }

    #[test]
    fn test_cardinality_limits_skip_columns() {
        let ds = sample();
        let limits = FilterLimits {
            min_distinct: 3,
            max_distinct: 60,
        };
        let sel = init_filter_state(&ds, limits);
        // Carteira has 3 distinct values, Status only 2.
        assert!(sel.contains_key("Carteira"));
        assert!(!sel.contains_key("Status"));
    }

    #[test]
    fn test_view_is_subset_and_refines() {
        let ds = sample();
        let view = FilteredView::all(&ds);
        assert_eq!(view.len(), ds.len());

        let mut sel = FilterSelection::new();
        sel.insert("Status".into(), values(&[s("Ativo")]));
        let narrowed = view.refine(&sel);
        assert_eq!(narrowed.indices(), &[0, 2]);
        assert!(narrowed.records().all(|r| ds.records.contains(r)));
    }
}
