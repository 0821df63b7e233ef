//! Row-oriented response table with column access by question id.

use std::collections::HashMap;
use std::fmt;

/// Delimiter for multi-choice cells ("DASH|API").
pub const MULTI_CHOICE_DELIMITER: char = '|';

/// One cell of the response table.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Null,
}

impl CellValue {
    /// Parse a raw CSV field: empty = null, then int, then float, then text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Number(i as f64);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Number(f);
        }
        CellValue::Text(trimmed.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Members of a multi-choice cell. A plain text or numeric cell yields
    /// itself as a single member; null yields nothing.
    pub fn set_members(&self) -> Vec<String> {
        match self {
            CellValue::Null => Vec::new(),
            CellValue::Number(_) => vec![self.to_string()],
            CellValue::Text(s) => s
                .split(MULTI_CHOICE_DELIMITER)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Null => Ok(()),
        }
    }
}

/// Column-major table; headers are question ids.
#[derive(Debug, Clone, Default)]
pub struct ResponseTable {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    cells: Vec<Vec<CellValue>>,
    rows: usize,
}

impl ResponseTable {
    pub fn new(columns: Vec<String>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        let cells = columns.iter().map(|_| Vec::new()).collect();
        Self {
            columns,
            index,
            cells,
            rows: 0,
        }
    }

    /// Append one row. Short rows are padded with nulls; long rows are
    /// truncated to the header width.
    pub fn push_row(&mut self, row: Vec<CellValue>) {
        let mut row = row;
        row.resize(self.columns.len(), CellValue::Null);
        for (col, cell) in self.cells.iter_mut().zip(row) {
            col.push(cell);
        }
        self.rows += 1;
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn column(&self, question_id: &str) -> Option<&[CellValue]> {
        self.index
            .get(question_id)
            .map(|&i| self.cells[i].as_slice())
    }
}
