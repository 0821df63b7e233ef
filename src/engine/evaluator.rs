//! Filter expression evaluation against the response table.
//!
//! Produces a boolean mask over rows. Identifier misses fail loudly: a filter
//! naming an unknown column is an error, never a silent all-false mask. Null
//! cells never match a leaf predicate.

use std::collections::HashMap;

use thiserror::Error;

use crate::contracts::filters::{FilterExpr, ScalarValue};
use crate::contracts::questions::{Question, QuestionType};

use super::table::{CellValue, ResponseTable};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unknown question id '{question_id}'")]
    UnknownQuestionId { question_id: String },

    #[error("operator '{op}' does not apply to question '{question_id}' ({qtype})")]
    TypeMismatch {
        op: &'static str,
        question_id: String,
        qtype: &'static str,
    },
}

fn column<'t>(
    table: &'t ResponseTable,
    question_id: &str,
) -> Result<&'t [CellValue], EvalError> {
    table
        .column(question_id)
        .ok_or_else(|| EvalError::UnknownQuestionId {
            question_id: question_id.to_string(),
        })
}

fn scalar_matches(cell: &CellValue, value: &ScalarValue) -> bool {
    match (cell, value) {
        (CellValue::Null, _) => false,
        (CellValue::Number(a), ScalarValue::Number(b)) => a == b,
        (CellValue::Text(a), ScalarValue::Text(b)) => a == b,
        // Mixed representations: compare display forms, so a numeric code
        // stored as text still matches a numeric literal.
        (cell, value) => cell.to_string() == value.to_string(),
    }
}

fn numeric_mask(
    cells: &[CellValue],
    mut pred: impl FnMut(f64) -> bool,
) -> Vec<bool> {
    cells
        .iter()
        .map(|c| c.as_f64().map(&mut pred).unwrap_or(false))
        .collect()
}

/// Evaluate `expr` over every row of `table`, returning one bool per row.
pub fn evaluate(
    expr: &FilterExpr,
    table: &ResponseTable,
    questions: &HashMap<String, Question>,
) -> Result<Vec<bool>, EvalError> {
    match expr {
        FilterExpr::Eq { question_id, value } => {
            let cells = column(table, question_id)?;
            // eq on a delimited-set column is meaningless; validators reject
            // it up front, and the evaluator refuses rather than guessing.
            if questions
                .get(question_id)
                .is_some_and(|q| q.qtype == QuestionType::MultiChoice)
            {
                return Err(EvalError::TypeMismatch {
                    op: "eq",
                    question_id: question_id.clone(),
                    qtype: QuestionType::MultiChoice.as_str(),
                });
            }
            Ok(cells.iter().map(|c| scalar_matches(c, value)).collect())
        }
        FilterExpr::In {
            question_id,
            values,
        } => {
            let cells = column(table, question_id)?;
            Ok(cells
                .iter()
                .map(|c| values.iter().any(|v| scalar_matches(c, v)))
                .collect())
        }
        FilterExpr::Range {
            question_id,
            min,
            max,
            inclusive,
        } => {
            let cells = column(table, question_id)?;
            let (min, max, inclusive) = (*min, *max, *inclusive);
            Ok(numeric_mask(cells, |v| {
                if inclusive {
                    v >= min && v <= max
                } else {
                    v > min && v < max
                }
            }))
        }
        FilterExpr::ContainsAny {
            question_id,
            values,
        } => {
            let cells = column(table, question_id)?;
            let wanted: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            Ok(cells
                .iter()
                .map(|c| {
                    c.set_members()
                        .iter()
                        .any(|m| wanted.iter().any(|w| w == m))
                })
                .collect())
        }
        FilterExpr::Gt { question_id, value } => {
            let (cells, v) = (column(table, question_id)?, *value);
            Ok(numeric_mask(cells, |x| x > v))
        }
        FilterExpr::Gte { question_id, value } => {
            let (cells, v) = (column(table, question_id)?, *value);
            Ok(numeric_mask(cells, |x| x >= v))
        }
        FilterExpr::Lt { question_id, value } => {
            let (cells, v) = (column(table, question_id)?, *value);
            Ok(numeric_mask(cells, |x| x < v))
        }
        FilterExpr::Lte { question_id, value } => {
            let (cells, v) = (column(table, question_id)?, *value);
            Ok(numeric_mask(cells, |x| x <= v))
        }
        FilterExpr::And { children } => {
            let mut mask = vec![true; table.len()];
            for child in children {
                let m = evaluate(child, table, questions)?;
                for (a, b) in mask.iter_mut().zip(m) {
                    *a = *a && b;
                }
            }
            Ok(mask)
        }
        FilterExpr::Or { children } => {
            let mut mask = vec![false; table.len()];
            for child in children {
                let m = evaluate(child, table, questions)?;
                for (a, b) in mask.iter_mut().zip(m) {
                    *a = *a || b;
                }
            }
            Ok(mask)
        }
        FilterExpr::Not { child } => {
            let mut mask = evaluate(child, table, questions)?;
            for b in &mut mask {
                *b = !*b;
            }
            Ok(mask)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::questions::AnswerOption;

    fn questions() -> HashMap<String, Question> {
        [
            ("Q_REGION", "Region", QuestionType::SingleChoice),
            ("Q_FEATURES", "Features Used", QuestionType::MultiChoice),
            ("Q_NPS", "Net Promoter Score", QuestionType::Nps0To10),
            ("Q_AGE", "Age", QuestionType::Numeric),
        ]
        .into_iter()
        .map(|(id, label, qtype)| {
            (
                id.to_string(),
                Question {
                    question_id: id.to_string(),
                    label: label.to_string(),
                    qtype,
                    options: Vec::<AnswerOption>::new(),
                },
            )
        })
        .collect()
    }

    fn table() -> ResponseTable {
        let mut t = ResponseTable::new(vec![
            "Q_REGION".into(),
            "Q_FEATURES".into(),
            "Q_NPS".into(),
            "Q_AGE".into(),
        ]);
        t.push_row(vec![
            CellValue::Text("NORTH".into()),
            CellValue::Text("DASH|API".into()),
            CellValue::Number(9.0),
            CellValue::Number(34.0),
        ]);
        t.push_row(vec![
            CellValue::Text("SOUTH".into()),
            CellValue::Text("REPORTS".into()),
            CellValue::Number(4.0),
            CellValue::Number(51.0),
        ]);
        t.push_row(vec![
            CellValue::Text("NORTH".into()),
            CellValue::Null,
            CellValue::Null,
            CellValue::Number(22.0),
        ]);
        t
    }

    #[test]
    fn eq_matches_text_column() {
        let expr = FilterExpr::Eq {
            question_id: "Q_REGION".into(),
            value: ScalarValue::Text("NORTH".into()),
        };
        let mask = evaluate(&expr, &table(), &questions()).unwrap();
        assert_eq!(mask, vec![true, false, true]);
    }

    #[test]
    fn eq_on_multi_choice_is_type_mismatch() {
        let expr = FilterExpr::Eq {
            question_id: "Q_FEATURES".into(),
            value: ScalarValue::Text("DASH".into()),
        };
        let err = evaluate(&expr, &table(), &questions()).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { op: "eq", .. }));
    }

    #[test]
    fn unknown_column_fails_loudly() {
        let expr = FilterExpr::Eq {
            question_id: "UNKNOWN".into(),
            value: ScalarValue::Number(10.0),
        };
        let err = evaluate(&expr, &table(), &questions()).unwrap_err();
        assert_eq!(
            err,
            EvalError::UnknownQuestionId {
                question_id: "UNKNOWN".into()
            }
        );
    }

    #[test]
    fn contains_any_intersects_delimited_sets() {
        let expr = FilterExpr::ContainsAny {
            question_id: "Q_FEATURES".into(),
            values: vec![ScalarValue::Text("API".into())],
        };
        let mask = evaluate(&expr, &table(), &questions()).unwrap();
        assert_eq!(mask, vec![true, false, false]);
    }

    #[test]
    fn range_respects_inclusive_flag() {
        let inclusive = FilterExpr::Range {
            question_id: "Q_AGE".into(),
            min: 22.0,
            max: 34.0,
            inclusive: true,
        };
        assert_eq!(
            evaluate(&inclusive, &table(), &questions()).unwrap(),
            vec![true, false, true]
        );

        let exclusive = FilterExpr::Range {
            question_id: "Q_AGE".into(),
            min: 22.0,
            max: 34.0,
            inclusive: false,
        };
        assert_eq!(
            evaluate(&exclusive, &table(), &questions()).unwrap(),
            vec![false, false, false]
        );
    }

    #[test]
    fn null_cells_never_match() {
        let expr = FilterExpr::Lte {
            question_id: "Q_NPS".into(),
            value: 10.0,
        };
        let mask = evaluate(&expr, &table(), &questions()).unwrap();
        assert_eq!(mask, vec![true, true, false]);
    }

    #[test]
    fn composites_combine_left_to_right() {
        let expr = FilterExpr::And {
            children: vec![
                FilterExpr::Eq {
                    question_id: "Q_REGION".into(),
                    value: ScalarValue::Text("NORTH".into()),
                },
                FilterExpr::Gte {
                    question_id: "Q_NPS".into(),
                    value: 9.0,
                },
            ],
        };
        assert_eq!(
            evaluate(&expr, &table(), &questions()).unwrap(),
            vec![true, false, false]
        );

        let negated = FilterExpr::Not {
            child: Box::new(expr),
        };
        assert_eq!(
            evaluate(&negated, &table(), &questions()).unwrap(),
            vec![false, true, true]
        );
    }
}
