use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use super::infer;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the spreadsheet
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring what a spreadsheet can store.
/// Used as a key in `BTreeMap` / `BTreeSet` downstream, so it must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDateTime),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%d/%m/%Y")),
            CellValue::Null => write!(f, "(vazio)"),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell, `None` for anything that is not a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if !v.is_nan() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Calendar date of a date cell (time of day dropped).
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(d.date()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }
}

// ---------------------------------------------------------------------------
// ColumnKind – the derived classification of a column
// ---------------------------------------------------------------------------

/// How a column is treated by filters and aggregations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Categorical,
    Numeric,
    Temporal,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Categorical => write!(f, "categorical"),
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Temporal => write!(f, "temporal"),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the sheet
// ---------------------------------------------------------------------------

/// A single row: column_name → value. Every dataset column is present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub cells: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Numeric value of `column`, skipping missing and non-numeric cells.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.cells.get(column).and_then(CellValue::as_f64)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded sheet
// ---------------------------------------------------------------------------

/// The full parsed dataset with column classification and value indices.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All records (rows).
    pub records: Vec<Record>,
    /// Column names in header order.
    pub column_names: Vec<String>,
    /// Classification of each column, computed once at construction.
    pub column_kinds: BTreeMap<String, ColumnKind>,
    /// For each column the sorted set of unique values (missing included).
    pub unique_values: BTreeMap<String, BTreeSet<CellValue>>,
}

impl Dataset {
    /// Build a dataset from raw rows in header order.
    ///
    /// Rows shorter than the header are padded with `Null`; fully blank rows
    /// are dropped. Column types are inferred here and never change afterwards.
    pub fn from_rows(column_names: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut records: Vec<Record> = rows
            .into_iter()
            .filter(|row| !row.iter().all(CellValue::is_null))
            .map(|row| {
                let mut values = row.into_iter();
                let cells = column_names
                    .iter()
                    .map(|col| (col.clone(), values.next().unwrap_or(CellValue::Null)))
                    .collect();
                Record { cells }
            })
            .collect();

        let column_kinds = infer::classify_columns(&column_names, &mut records);

        let mut unique_values: BTreeMap<String, BTreeSet<CellValue>> = column_names
            .iter()
            .map(|col| (col.clone(), BTreeSet::new()))
            .collect();
        for record in &records {
            for (col, val) in &record.cells {
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }

        Dataset {
            records,
            column_names,
            column_kinds,
            unique_values,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn kind(&self, column: &str) -> Option<ColumnKind> {
        self.column_kinds.get(column).copied()
    }

    /// `true` when `column` exists and is classified as `kind`.
    pub fn has(&self, column: &str, kind: ColumnKind) -> bool {
        self.kind(column) == Some(kind)
    }

    /// Columns of a given kind, in header order.
    pub fn columns_of(&self, kind: ColumnKind) -> Vec<&str> {
        self.column_names
            .iter()
            .filter(|c| self.kind(c) == Some(kind))
            .map(String::as_str)
            .collect()
    }

    /// Distinct non-missing values of a column.
    pub fn distinct_values(&self, column: &str) -> BTreeSet<CellValue> {
        self.unique_values
            .get(column)
            .map(|vals| vals.iter().filter(|v| !v.is_null()).cloned().collect())
            .unwrap_or_default()
    }

    /// Whether any record lacks a value in `column`.
    pub fn has_missing(&self, column: &str) -> bool {
        self.unique_values
            .get(column)
            .is_some_and(|vals| vals.iter().any(CellValue::is_null))
    }

    /// Earliest and latest calendar date of a temporal column.
    pub fn date_bounds(&self, column: &str) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self
            .unique_values
            .get(column)?
            .iter()
            .filter_map(CellValue::as_date);
        let first = dates.next()?;
        let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    #[test]
    fn test_blank_rows_are_dropped_and_short_rows_padded() {
        let ds = Dataset::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                vec![s("x"), CellValue::Integer(1)],
                vec![CellValue::Null, CellValue::Null],
                vec![s("y")],
            ],
        );
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[1].get("b"), Some(&CellValue::Null));
    }

    #[test]
    fn test_ordering_groups_by_variant() {
        let mut vals = vec![s("b"), CellValue::Integer(3), CellValue::Null, s("a")];
        vals.sort();
        assert_eq!(
            vals,
            vec![CellValue::Null, CellValue::Integer(3), s("a"), s("b")]
        );
    }

    #[test]
    fn test_nan_counts_as_missing() {
        assert!(CellValue::Float(f64::NAN).is_null());
        assert_eq!(CellValue::Float(f64::NAN).as_f64(), None);
        assert_eq!(CellValue::Integer(4).as_f64(), Some(4.0));
    }

    #[test]
    fn test_date_bounds_and_distinct_values() {
        let d = |y, m, day| {
            CellValue::Date(
                NaiveDate::from_ymd_opt(y, m, day)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            )
        };
        let ds = Dataset::from_rows(
            vec!["when".into(), "cat".into()],
            vec![
                vec![d(2024, 3, 1), s("A")],
                vec![d(2023, 1, 15), CellValue::Null],
                vec![d(2024, 12, 31), s("B")],
            ],
        );
        assert_eq!(ds.kind("when"), Some(ColumnKind::Temporal));
        assert_eq!(
            ds.date_bounds("when"),
            Some((
                NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
            ))
        );
        assert_eq!(ds.distinct_values("cat").len(), 2);
        assert_eq!(ds.unique_values["cat"].len(), 3);
    }

    #[test]
    fn test_has_missing() {
        let ds = Dataset::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![s("x"), s("y")], vec![s("z"), CellValue::Null]],
        );
        assert!(!ds.has_missing("a"));
        assert!(ds.has_missing("b"));
        assert!(!ds.has_missing("absent"));
    }
}
