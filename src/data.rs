//! Data Loading
//!
//! Loads dam and sire trait records from CSV, Parquet (via Polars) or JSON.
//! Each column becomes a top-level field; string columns named after a nested
//! blob (`genetic_data`, `main_indices`, `reliabilities`, `haplotypes`) are
//! decoded as JSON into that blob.

use crate::record::{Blob, FieldValue, TraitRecord};
use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs;
use std::path::Path;

/// Load records, choosing the reader from the file extension
pub fn load_records(path: &Path) -> Result<Vec<TraitRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("parquet") => load_records_parquet(path),
        Some("json") => load_records_json(path),
        Some("csv") => load_records_csv(path),
        other => anyhow::bail!("Unsupported record file type {:?}: {:?}", other, path),
    }
}

pub fn load_records_csv(path: &Path) -> Result<Vec<TraitRecord>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load records CSV: {:?}", path))?;

    records_from_frame(&df)
}

pub fn load_records_parquet(path: &Path) -> Result<Vec<TraitRecord>> {
    let df = LazyFrame::scan_parquet(path, Default::default())
        .with_context(|| format!("Failed to scan parquet: {:?}", path))?
        .collect()
        .with_context(|| format!("Failed to load records parquet: {:?}", path))?;

    records_from_frame(&df)
}

/// Load a JSON array of record objects
pub fn load_records_json(path: &Path) -> Result<Vec<TraitRecord>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read records: {:?}", path))?;

    serde_json::from_str(&contents).with_context(|| "Failed to parse records JSON")
}

/// One record per row
pub fn records_from_frame(df: &DataFrame) -> Result<Vec<TraitRecord>> {
    let mut records = vec![TraitRecord::default(); df.height()];

    for column in df.get_columns() {
        let name = column.name().to_string();
        let blob = Blob::from_key(&name);

        for (idx, record) in records.iter_mut().enumerate() {
            let value = column
                .get(idx)
                .with_context(|| format!("Failed to read row {} of column '{}'", idx, name))?;

            match (blob, text_of(&value)) {
                (Some(blob), Some(text)) => {
                    if !record.insert_blob_json(blob, serde_json::Value::String(text.to_string())) {
                        tracing::debug!(column = %name, row = idx, "blob column is not a JSON object, skipped");
                    }
                }
                _ => {
                    let field = field_from_any(&value);
                    if !field.is_missing() {
                        record.insert(name.clone(), field);
                    }
                }
            }
        }
    }

    tracing::debug!(rows = records.len(), columns = df.width(), "records loaded");
    Ok(records)
}

fn text_of<'a>(value: &'a AnyValue<'_>) -> Option<&'a str> {
    match value {
        AnyValue::String(s) => Some(*s),
        AnyValue::StringOwned(s) => Some(s.as_str()),
        _ => None,
    }
}

/// Polars cell → record value (numbers as f64, strings as text, nulls missing)
fn field_from_any(value: &AnyValue) -> FieldValue {
    if let Some(text) = text_of(value) {
        return FieldValue::Text(text.to_string());
    }
    match value {
        AnyValue::Null => FieldValue::Missing,
        AnyValue::Boolean(b) => FieldValue::Number(if *b { 1.0 } else { 0.0 }),
        other => other
            .extract::<f64>()
            .filter(|v| v.is_finite())
            .map_or(FieldValue::Missing, FieldValue::Number),
    }
}
