//! Loading the question catalog, response table and scope text from disk.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::contracts::Question;
use crate::engine::table::{CellValue, ResponseTable};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid data format: {0}")]
    InvalidFormat(String),
}

/// Load the catalog from a JSON document that is either a bare array of
/// question objects or an object with a `questions` array. Anything else is
/// a fatal load-time error.
pub fn load_questions(path: &Path) -> Result<Vec<Question>, DataError> {
    let raw = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(DataError::InvalidFormat(
                    "questions document must be an array or an object with a 'questions' array"
                        .into(),
                ))
            }
        },
        _ => {
            return Err(DataError::InvalidFormat(
                "questions document must be an array or an object with a 'questions' array".into(),
            ))
        }
    };

    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(DataError::from))
        .collect()
}

/// Load the response table from a CSV whose headers are question ids. Cells
/// are sniffed int → float → text; empty cells are null.
pub fn load_responses(path: &Path) -> Result<ResponseTable, DataError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut table = ResponseTable::new(headers);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(CellValue::parse).collect());
    }
    Ok(table)
}

/// Load the optional scope text. A missing file is not an error.
pub fn load_scope(path: &Path) -> Result<Option<String>, DataError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
