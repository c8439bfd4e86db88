use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use super::model::{CellValue, ColumnKind, Record};

// ---------------------------------------------------------------------------
// Column classification
// ---------------------------------------------------------------------------

/// What the raw cells of a column look like before any date heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    Numeric,
    Date,
    Text,
}

/// Classify every column and convert date-like text columns in place.
///
/// Numeric and native-date columns keep their storage type. Text columns are
/// re-parsed as day-first dates and become temporal when strictly more than
/// half of their non-missing cells parse; the cells that do not parse turn
/// into `Null`. At exactly half they stay categorical and are left untouched.
pub fn classify_columns(
    column_names: &[String],
    records: &mut [Record],
) -> BTreeMap<String, ColumnKind> {
    column_names
        .iter()
        .map(|col| {
            let kind = match storage_of(col, records) {
                Storage::Numeric => ColumnKind::Numeric,
                Storage::Date => ColumnKind::Temporal,
                Storage::Text => {
                    if promote_to_dates(col, records) {
                        ColumnKind::Temporal
                    } else {
                        ColumnKind::Categorical
                    }
                }
            };
            log::debug!("column {col:?} classified as {kind}");
            (col.clone(), kind)
        })
        .collect()
}

fn storage_of(column: &str, records: &[Record]) -> Storage {
    let mut all_numeric = true;
    let mut all_dates = true;
    for val in records
        .iter()
        .filter_map(|r| r.get(column))
        .filter(|v| !v.is_null())
    {
        all_numeric &= val.is_numeric();
        all_dates &= matches!(val, CellValue::Date(_));
        if !all_numeric && !all_dates {
            return Storage::Text;
        }
    }
    // A column with no values at all reads as empty floats.
    if all_numeric {
        Storage::Numeric
    } else {
        Storage::Date
    }
}

/// Try to turn a text column into dates. Returns whether it was converted.
fn promote_to_dates(column: &str, records: &mut [Record]) -> bool {
    let parsed: Vec<Option<NaiveDateTime>> = records
        .iter()
        .map(|r| match r.get(column) {
            Some(CellValue::Date(d)) => Some(*d),
            Some(CellValue::String(s)) => parse_date_dayfirst(s),
            _ => None,
        })
        .collect();

    let non_missing = records
        .iter()
        .filter(|r| r.get(column).is_some_and(|v| !v.is_null()))
        .count();
    let hits = parsed.iter().filter(|p| p.is_some()).count();

    if hits * 2 <= non_missing {
        return false;
    }

    for (record, date) in records.iter_mut().zip(parsed) {
        let value = date.map_or(CellValue::Null, CellValue::Date);
        record.cells.insert(column.to_string(), value);
    }
    true
}

// ---------------------------------------------------------------------------
// Day-first date parsing
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d"];

const SHORT_YEAR_FORMATS: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];

const SHORT_YEAR_DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%y %H:%M",
    "%d-%m-%y %H:%M:%S",
    "%d-%m-%y %H:%M",
    "%d.%m.%y %H:%M:%S",
    "%d.%m.%y %H:%M",
];

/// Parse a date written day-first (`31/12/2024`, `31-12-24 10:30`, ...).
/// ISO `yyyy-mm-dd` is accepted as well since it cannot be ambiguous.
pub fn parse_date_dayfirst(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // `%Y` happily reads "24" as year 24, so two-digit years are told apart
    // by the length of the last component of the date part.
    let date_part = text.split([' ', 'T']).next().unwrap_or(text);
    let short_year = date_part
        .rsplit(['/', '-', '.'])
        .next()
        .is_some_and(|tail| tail.len() == 2);
    let (short_datetime, short_date): (&[&str], &[&str]) = if short_year {
        (SHORT_YEAR_DATETIME_FORMATS, SHORT_YEAR_FORMATS)
    } else {
        (&[], &[])
    };

    if let Some(dt) = short_datetime
        .iter()
        .chain(DATETIME_FORMATS)
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt);
    }

    short_date
        .iter()
        .chain(DATE_FORMATS)
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
