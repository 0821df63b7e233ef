//! Cut execution: filter, group, compute metric per cell, assemble a result
//! table with a base N.
//!
//! Cuts in a batch are independent: one cut's failure lands in `errors` and
//! leaves the others untouched. Segment masks are memoized per batch in
//! `segments_computed`, so the same mask backs every reference to a segment
//! regardless of cut order.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::contracts::questions::{Question, QuestionType};
use crate::contracts::specs::{CutSpec, DimensionKind, MetricType, SegmentSpec};

use super::evaluator::{evaluate, EvalError};
use super::table::{CellValue, ResponseTable};

// =============================================================================
// RESULTS
// =============================================================================

/// One value in a result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultCell {
    Text(String),
    Count(u64),
    Value(f64),
}

impl fmt::Display for ResultCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultCell::Text(s) => write!(f, "{s}"),
            ResultCell::Count(n) => write!(f, "{n}"),
            ResultCell::Value(v) => write!(f, "{v:.1}"),
        }
    }
}

/// Grouped metric values for one cut.
#[derive(Debug, Clone, Serialize)]
pub struct ResultTable {
    pub cut_id: String,
    /// Row count of the filtered base the metric was computed over.
    pub base_n: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ResultCell>>,
}

impl ResultTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Why one cut in a batch failed. Display strings are user-safe.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CutError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("unknown question id '{0}'")]
    UnknownQuestion(String),

    #[error("unknown segment id '{0}'")]
    UnknownSegment(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("cut '{cut_id}': {source}")]
pub struct CutFailure {
    pub cut_id: String,
    #[source]
    pub source: CutError,
}

#[derive(Debug, Default)]
pub struct ExecutionResult {
    pub tables: Vec<ResultTable>,
    pub errors: Vec<CutFailure>,
    /// Segment masks computed during this batch, keyed by segment id.
    pub segments_computed: HashMap<String, Vec<bool>>,
}

// =============================================================================
// EXECUTOR
// =============================================================================

pub struct Executor<'a> {
    table: &'a ResponseTable,
    questions: &'a HashMap<String, Question>,
    segments: &'a HashMap<String, SegmentSpec>,
}

/// A resolved grouping axis: display label plus one optional key per row.
struct Axis {
    label: String,
    keys: Vec<Option<String>>,
}

impl<'a> Executor<'a> {
    pub fn new(
        table: &'a ResponseTable,
        questions: &'a HashMap<String, Question>,
        segments: &'a HashMap<String, SegmentSpec>,
    ) -> Self {
        Self {
            table,
            questions,
            segments,
        }
    }

    /// Execute every cut, isolating failures per cut.
    pub fn execute_cuts(&self, cuts: &[CutSpec]) -> ExecutionResult {
        let mut result = ExecutionResult::default();
        for cut in cuts {
            match self.execute_one(cut, &mut result.segments_computed) {
                Ok(table) => result.tables.push(table),
                Err(source) => result.errors.push(CutFailure {
                    cut_id: cut.cut_id.clone(),
                    source,
                }),
            }
        }
        result
    }

    fn execute_one(
        &self,
        cut: &CutSpec,
        seg_masks: &mut HashMap<String, Vec<bool>>,
    ) -> Result<ResultTable, CutError> {
        let base = match &cut.filter {
            Some(filter) => evaluate(filter, self.table, self.questions)?,
            None => vec![true; self.table.len()],
        };
        let base_rows: Vec<usize> = (0..self.table.len()).filter(|&i| base[i]).collect();
        let base_n = base_rows.len();

        let mut axes = Vec::with_capacity(cut.dimensions.len());
        for dim in &cut.dimensions {
            axes.push(match dim.kind {
                DimensionKind::Question => self.question_axis(&dim.id)?,
                DimensionKind::Segment => self.segment_axis(&dim.id, seg_masks)?,
            });
        }

        let groups = group_rows(&base_rows, &axes);

        let metric_cells = self
            .table
            .column(&cut.metric.question_id)
            .ok_or_else(|| CutError::UnknownQuestion(cut.metric.question_id.clone()))?;
        let metric_question = self
            .questions
            .get(&cut.metric.question_id)
            .ok_or_else(|| CutError::UnknownQuestion(cut.metric.question_id.clone()))?;

        let mut columns: Vec<String> = axes.iter().map(|a| a.label.clone()).collect();
        let mut rows = Vec::new();

        match cut.metric.mtype {
            MetricType::Frequency => {
                columns.push(metric_question.label.clone());
                columns.push("count".into());
                columns.push("percent".into());
                for (key, members) in &groups {
                    frequency_rows(key, members, metric_cells, &mut rows);
                }
            }
            MetricType::Mean => {
                columns.push("mean".into());
                columns.push("n".into());
                for (key, members) in &groups {
                    let values = numeric_values(members, metric_cells);
                    if values.is_empty() {
                        continue;
                    }
                    let mean = values.iter().sum::<f64>() / values.len() as f64;
                    rows.push(metric_row(key, ResultCell::Value(mean), values.len()));
                }
            }
            MetricType::Top2box | MetricType::Bottom2box => {
                let header = if cut.metric.mtype == MetricType::Top2box {
                    "top2box_pct"
                } else {
                    "bottom2box_pct"
                };
                columns.push(header.into());
                columns.push("n".into());
                let band = box_band(metric_question.qtype, cut.metric.mtype);
                for (key, members) in &groups {
                    let values = numeric_values(members, metric_cells);
                    if values.is_empty() {
                        continue;
                    }
                    let hits = values.iter().filter(|v| band.contains(*v)).count();
                    let pct = hits as f64 / values.len() as f64 * 100.0;
                    rows.push(metric_row(key, ResultCell::Value(pct), values.len()));
                }
            }
            MetricType::Nps => {
                columns.push("nps".into());
                columns.push("n".into());
                for (key, members) in &groups {
                    let values = numeric_values(members, metric_cells);
                    if values.is_empty() {
                        continue;
                    }
                    let promoters = values.iter().filter(|v| **v >= 9.0).count() as f64;
                    let detractors = values.iter().filter(|v| **v <= 6.0).count() as f64;
                    let nps = (promoters - detractors) / values.len() as f64 * 100.0;
                    rows.push(metric_row(key, ResultCell::Value(nps), values.len()));
                }
            }
        }

        Ok(ResultTable {
            cut_id: cut.cut_id.clone(),
            base_n,
            columns,
            rows,
        })
    }

    fn question_axis(&self, question_id: &str) -> Result<Axis, CutError> {
        let cells = self
            .table
            .column(question_id)
            .ok_or_else(|| CutError::UnknownQuestion(question_id.to_string()))?;
        let label = self
            .questions
            .get(question_id)
            .map(|q| q.label.clone())
            .unwrap_or_else(|| question_id.to_string());
        let keys = cells
            .iter()
            .map(|c| (!c.is_null()).then(|| c.to_string()))
            .collect();
        Ok(Axis { label, keys })
    }

    fn segment_axis(
        &self,
        segment_id: &str,
        seg_masks: &mut HashMap<String, Vec<bool>>,
    ) -> Result<Axis, CutError> {
        let segment = self
            .segments
            .get(segment_id)
            .ok_or_else(|| CutError::UnknownSegment(segment_id.to_string()))?;

        if !seg_masks.contains_key(segment_id) {
            let mask = evaluate(&segment.definition, self.table, self.questions)?;
            seg_masks.insert(segment_id.to_string(), mask);
        }
        let mask = &seg_masks[segment_id];

        let keys = mask
            .iter()
            .map(|&m| Some(if m { "in" } else { "out" }.to_string()))
            .collect();
        Ok(Axis {
            label: segment.name.clone(),
            keys,
        })
    }
}

// =============================================================================
// GROUPING AND METRIC HELPERS
// =============================================================================

/// Cross the axes over the base rows. Rows with a null key on any axis are
/// excluded from grouping. Group keys are ordered numeric-aware ascending so
/// repeated executions produce identical tables.
fn group_rows(base_rows: &[usize], axes: &[Axis]) -> Vec<(Vec<String>, Vec<usize>)> {
    let mut groups: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    'rows: for &row in base_rows {
        let mut key = Vec::with_capacity(axes.len());
        for axis in axes {
            match &axis.keys[row] {
                Some(k) => key.push(k.clone()),
                None => continue 'rows,
            }
        }
        groups.entry(key).or_default().push(row);
    }
    let mut out: Vec<_> = groups.into_iter().collect();
    out.sort_by(|(a, _), (b, _)| compare_keys(a, b));
    out
}

fn compare_keys(a: &[String], b: &[String]) -> std::cmp::Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = match (x.parse::<f64>(), y.parse::<f64>()) {
            (Ok(nx), Ok(ny)) => nx.partial_cmp(&ny).unwrap_or(std::cmp::Ordering::Equal),
            _ => x.cmp(y),
        };
        if ord != std::cmp::Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn numeric_values(members: &[usize], cells: &[CellValue]) -> Vec<f64> {
    members.iter().filter_map(|&i| cells[i].as_f64()).collect()
}

fn metric_row(key: &[String], value: ResultCell, n: usize) -> Vec<ResultCell> {
    let mut row: Vec<ResultCell> = key.iter().cloned().map(ResultCell::Text).collect();
    row.push(value);
    row.push(ResultCell::Count(n as u64));
    row
}

/// Category counts within one group. Multi-choice cells contribute one count
/// per selected option; the percent base stays the responding-row count.
fn frequency_rows(
    key: &[String],
    members: &[usize],
    cells: &[CellValue],
    rows: &mut Vec<Vec<ResultCell>>,
) {
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut respondents = 0usize;
    for &i in members {
        let options = cells[i].set_members();
        if options.is_empty() {
            continue;
        }
        respondents += 1;
        for option in options {
            *counts.entry(option).or_default() += 1;
        }
    }
    if respondents == 0 {
        return;
    }

    let mut categories: Vec<_> = counts.into_iter().collect();
    categories.sort_by(|(a, _), (b, _)| {
        compare_keys(std::slice::from_ref(a), std::slice::from_ref(b))
    });

    for (category, count) in categories {
        let mut row: Vec<ResultCell> = key.iter().cloned().map(ResultCell::Text).collect();
        row.push(ResultCell::Text(category));
        row.push(ResultCell::Count(count));
        row.push(ResultCell::Value(count as f64 / respondents as f64 * 100.0));
        rows.push(row);
    }
}

/// The two ordinal codes counted by top2box/bottom2box for a likert scale.
fn box_band(qtype: QuestionType, metric: MetricType) -> std::ops::RangeInclusive<f64> {
    match (qtype, metric) {
        (QuestionType::Likert1To5, MetricType::Top2box) => 4.0..=5.0,
        (QuestionType::Likert1To7, MetricType::Top2box) => 6.0..=7.0,
        // Bottom two codes are 1..=2 on both scales. Validators guarantee we
        // never get here with a non-likert type.
        _ => 1.0..=2.0,
    }
}
