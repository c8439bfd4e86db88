use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array,
    Int32Array, Int64Array, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use calamine::{Data, Reader, open_workbook_auto};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::infer::parse_date_dayfirst;
use super::model::{CellValue, Dataset};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.xlsb` / `.ods` – first sheet, first row = headers
/// * `.csv`     – header row, one record per line
/// * `.json`    – `[{ "Carteira": "...", "Posição": 1.5, ... }, ...]`
/// * `.parquet` – flat columns (strings, numbers, booleans, dates)
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => load_workbook(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} records from {} with columns {:?}",
        dataset.len(),
        path.display(),
        dataset.column_kinds
    );
    Ok(dataset)
}

/// Header names with blanks replaced by `Unnamed: <index>` and repeats
/// suffixed `.1`, `.2`, ... so every column keeps its own cells.
fn normalise_headers(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    raw.into_iter()
        .enumerate()
        .map(|(i, h)| {
            let base = match h.trim() {
                "" => format!("Unnamed: {i}"),
                trimmed => trimmed.to_string(),
            };
            let mut name = base.clone();
            let mut n = 0;
            while seen.contains(&name) {
                n += 1;
                name = format!("{base}.{n}");
            }
            seen.insert(name.clone());
            name
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Read the first sheet of a workbook (calamine auto-detects the format).
fn load_workbook(path: &Path) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no sheets")?
        .context("reading first sheet")?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Dataset::from_rows(Vec::new(), Vec::new()));
    };
    let headers = normalise_headers(header_row.iter().map(|cell| match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }));

    let records: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(workbook_cell).collect())
        .collect();

    Ok(Dataset::from_rows(headers, records))
}

fn workbook_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => text_cell(s),
        Data::DateTime(dt) => dt.as_datetime().map_or(CellValue::Null, CellValue::Date),
        Data::DateTimeIso(s) => parse_date_dayfirst(s).map_or(CellValue::Null, CellValue::Date),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

fn text_cell(s: &str) -> CellValue {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        CellValue::Null
    } else {
        CellValue::String(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Carteira": "FII Renda", "Posição": 1500.0, "Entrada": "05/03/2024" },
///   ...
/// ]
/// ```
///
/// Column order is the order in which keys are first seen.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows: Vec<Vec<CellValue>> = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map_or(CellValue::Null, json_to_cell))
                .collect()
        })
        .collect();

    Ok(Dataset::from_rows(headers, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => text_cell(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Cells are typed by content; date-like text is left to type inference.
/// Fields that are not valid UTF-8 are read as Latin-1 (Excel's
/// "CSV (separado por vírgulas)" export on Windows).
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers = normalise_headers(
        reader
            .byte_headers()
            .context("reading CSV headers")?
            .iter()
            .map(decode_field),
    );

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for (row_no, result) in reader.byte_records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(
            record
                .iter()
                .map(|field| guess_cell_type(&decode_field(field)))
                .collect(),
        );
    }

    Ok(Dataset::from_rows(headers, rows))
}

fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`), and by the `generate_sample` binary.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers = normalise_headers(builder.schema().fields().iter().map(|f| f.name().clone()));
    let reader = builder.build().context("building parquet reader")?;

    let mut rows: Vec<Vec<CellValue>> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch.columns();
        for row in 0..batch.num_rows() {
            rows.push(columns.iter().map(|col| arrow_cell(col, row)).collect());
        }
    }

    Ok(Dataset::from_rows(headers, rows))
}

// -- Parquet / Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    let cell = match col.data_type() {
        DataType::Utf8 => Some(text_cell(col.as_string::<i32>().value(row))),
        DataType::LargeUtf8 => Some(text_cell(col.as_string::<i64>().value(row))),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(i64::from(a.value(row)))),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(f64::from(a.value(row)))),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row))),
        DataType::Date32 => any
            .downcast_ref::<Date32Array>()
            .and_then(|a| a.value_as_datetime(row))
            .map(CellValue::Date),
        DataType::Date64 => any
            .downcast_ref::<Date64Array>()
            .and_then(|a| a.value_as_datetime(row))
            .map(CellValue::Date),
        DataType::Timestamp(unit, _) => timestamp_cell(any, unit, row),
        other => Some(CellValue::String(format!("{other:?}"))),
    };
    cell.unwrap_or(CellValue::Null)
}

fn timestamp_cell(any: &dyn std::any::Any, unit: &TimeUnit, row: usize) -> Option<CellValue> {
    let dt = match unit {
        TimeUnit::Second => any
            .downcast_ref::<TimestampSecondArray>()?
            .value_as_datetime(row),
        TimeUnit::Millisecond => any
            .downcast_ref::<TimestampMillisecondArray>()?
            .value_as_datetime(row),
        TimeUnit::Microsecond => any
            .downcast_ref::<TimestampMicrosecondArray>()?
            .value_as_datetime(row),
        TimeUnit::Nanosecond => any
            .downcast_ref::<TimestampNanosecondArray>()?
            .value_as_datetime(row),
    };
    dt.map(CellValue::Date)
}
