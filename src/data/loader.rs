use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{GeochemDataset, MetadataValue, Sample};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an observation table from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat table, one numeric column per element (recommended)
/// * `.json`    – `[{ "La": 6.2, "Ce": 15.1, ...meta }, ...]`
/// * `.csv`     – header row of element abbreviations and metadata columns
///
/// A column is treated as a concentration column when its cells are numeric;
/// everything else becomes sample metadata. Empty cells in a concentration
/// column mean "not measured".
pub fn load_file(path: &Path) -> Result<GeochemDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "sample_id": "S01", "La": 6.2, "Ce": 15.1, "rock_type": "basalt" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<GeochemDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json_records(&text)
}

fn parse_json_records(text: &str) -> Result<GeochemDataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut samples = Vec::with_capacity(records.len());
    let mut element_order: Vec<String> = Vec::new();

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut sample = Sample::default();
        for (key, val) in obj {
            match val {
                JsonValue::Number(n) => {
                    let value = n
                        .as_f64()
                        .with_context(|| format!("Row {i}, '{key}': number out of range"))?;
                    if !element_order.iter().any(|c| c == key) {
                        element_order.push(key.clone());
                    }
                    sample.values.insert(key.clone(), value);
                }
                other => {
                    sample
                        .metadata
                        .insert(key.clone(), json_to_metadata(other));
                }
            }
        }
        samples.push(sample);
    }

    Ok(GeochemDataset::from_samples(samples, element_order))
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one row per sample:
///
/// ```text
/// sample_id,rock_type,La,Ce,Sr
/// S01,basalt,6.2,15.1,400
/// ```
///
/// Column typing is inferred: a column whose non-empty cells all parse as
/// floats is a concentration column, the rest are metadata.
fn load_csv(path: &Path) -> Result<GeochemDataset> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    load_csv_from_reader(file)
}

fn load_csv_from_reader<R: Read>(reader: R) -> Result<GeochemDataset> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = csv_reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records: Vec<csv::StringRecord> = Vec::new();
    for (row_no, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: expected {} fields, found {}",
                headers.len(),
                record.len()
            );
        }
        records.push(record);
    }

    // A column is numeric when it has at least one non-empty cell and every
    // non-empty cell parses as f64.
    let numeric: Vec<bool> = (0..headers.len())
        .map(|col| {
            let mut seen = false;
            for record in &records {
                let cell = record.get(col).unwrap_or("").trim();
                if cell.is_empty() {
                    continue;
                }
                seen = true;
                if cell.parse::<f64>().is_err() {
                    return false;
                }
            }
            seen
        })
        .collect();

    let element_order: Vec<String> = headers
        .iter()
        .zip(&numeric)
        .filter(|(_, &is_num)| is_num)
        .map(|(h, _)| h.clone())
        .collect();

    let mut samples = Vec::with_capacity(records.len());
    for record in &records {
        let mut sample = Sample::default();
        for (col, cell) in record.iter().enumerate() {
            let cell = cell.trim();
            let header = &headers[col];
            if numeric[col] {
                if !cell.is_empty() {
                    // Parse already validated above.
                    if let Ok(value) = cell.parse::<f64>() {
                        sample.values.insert(header.clone(), value);
                    }
                }
            } else {
                sample
                    .metadata
                    .insert(header.clone(), guess_metadata_type(cell));
            }
        }
        samples.push(sample);
    }

    Ok(GeochemDataset::from_samples(samples, element_order))
}

fn guess_metadata_type(s: &str) -> MetadataValue {
    if s.is_empty() {
        return MetadataValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return MetadataValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return MetadataValue::Float(f);
    }
    if s == "true" || s == "false" {
        return MetadataValue::Bool(s == "true");
    }
    MetadataValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing a flat observation table.
///
/// Expected schema: one numeric column (Float64/Float32/Int64/Int32) per
/// element; Utf8 and Boolean columns become metadata. Works with files
/// written by both **Pandas** (`df.to_parquet()`) and **Polars**
/// (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<GeochemDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut samples: Vec<Sample> = Vec::new();
    let mut element_order: Vec<String> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let n_rows = batch.num_rows();

        if element_order.is_empty() {
            element_order = schema
                .fields()
                .iter()
                .filter(|f| is_numeric(f.data_type()))
                .map(|f| f.name().clone())
                .collect();
        }

        for row in 0..n_rows {
            let mut sample = Sample::default();
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let column = batch.column(col_idx);
                if is_numeric(field.data_type()) {
                    if let Some(value) = extract_f64(column, row)
                        .with_context(|| format!("Row {row}: failed to read '{}'", field.name()))?
                    {
                        sample.values.insert(field.name().clone(), value);
                    }
                } else {
                    sample
                        .metadata
                        .insert(field.name().clone(), extract_metadata_value(column, row));
                }
            }
            samples.push(sample);
        }
    }

    Ok(GeochemDataset::from_samples(samples, element_order))
}

// -- Parquet / Arrow helpers --

fn is_numeric(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32
    )
}

/// Extract an `f64` from a numeric column at the given row; `None` for nulls.
fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let value = match col.data_type() {
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            arr.value(row)
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            arr.value(row) as f64
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            arr.value(row) as f64
        }
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            arr.value(row) as f64
        }
        other => bail!("Expected numeric column, got {other:?}"),
    };
    Ok(Some(value))
}

/// Extract a single metadata value from an Arrow column at a given row.
fn extract_metadata_value(col: &Arc<dyn Array>, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            if let Some(s) = col.as_any().downcast_ref::<arrow::array::StringArray>() {
                MetadataValue::String(s.value(row).to_string())
            } else if let Some(s) = col.as_any().downcast_ref::<arrow::array::LargeStringArray>() {
                MetadataValue::String(s.value(row).to_string())
            } else {
                MetadataValue::Null
            }
        }
        DataType::Boolean => {
            if let Some(arr) = col.as_any().downcast_ref::<BooleanArray>() {
                MetadataValue::Bool(arr.value(row))
            } else {
                MetadataValue::Null
            }
        }
        _ => MetadataValue::String(format!("{:?}", col.data_type())),
    }
}
