//! Domain validation for specifications received from the planning model.
//!
//! Runs after schema decoding and before any execution or session mutation.
//! A spec that fails any check here never reaches the executor and never
//! registers a segment.

use std::collections::HashMap;

use thiserror::Error;

use super::filters::{FilterExpr, ScalarValue};
use super::questions::{Question, QuestionType};
use super::specs::{CutSpec, DimensionKind, MetricSpec, MetricType, SegmentSpec};

/// A domain-validation failure. Display strings are user-safe.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecError {
    #[error("unknown question id '{question_id}'")]
    UnknownQuestion { question_id: String },

    #[error("unknown segment id '{segment_id}'")]
    UnknownSegment { segment_id: String },

    #[error("metric '{metric}' is not compatible with question type '{qtype}'")]
    MetricIncompatible {
        metric: &'static str,
        qtype: &'static str,
    },

    #[error("operator '{op}' cannot be applied to question '{question_id}' ({qtype})")]
    FilterOperatorInvalid {
        op: &'static str,
        question_id: String,
        qtype: &'static str,
    },

    #[error("value '{value}' is not valid for question '{question_id}'")]
    InvalidCriteriaValue { question_id: String, value: String },
}

// Which metrics apply to which question types. Order mirrors the MetricType
// declaration so a new metric without a row here is caught by the exhaustive
// lookup below.
const METRIC_COMPAT: &[(MetricType, &[QuestionType])] = &[
    (
        MetricType::Frequency,
        &[
            QuestionType::SingleChoice,
            QuestionType::MultiChoice,
            QuestionType::Likert1To5,
            QuestionType::Likert1To7,
            QuestionType::Nps0To10,
            QuestionType::Numeric,
        ],
    ),
    (
        MetricType::Mean,
        &[
            QuestionType::Likert1To5,
            QuestionType::Likert1To7,
            QuestionType::Nps0To10,
            QuestionType::Numeric,
        ],
    ),
    (
        MetricType::Top2box,
        &[QuestionType::Likert1To5, QuestionType::Likert1To7],
    ),
    (
        MetricType::Bottom2box,
        &[QuestionType::Likert1To5, QuestionType::Likert1To7],
    ),
    (MetricType::Nps, &[QuestionType::Nps0To10]),
];

fn metric_compatible(metric: MetricType, qtype: QuestionType) -> bool {
    METRIC_COMPAT
        .iter()
        .find(|(m, _)| *m == metric)
        .map(|(_, types)| types.contains(&qtype))
        .unwrap_or(false)
}

fn check_metric(
    metric: &MetricSpec,
    questions: &HashMap<String, Question>,
    errors: &mut Vec<SpecError>,
) {
    let Some(q) = questions.get(&metric.question_id) else {
        errors.push(SpecError::UnknownQuestion {
            question_id: metric.question_id.clone(),
        });
        return;
    };
    if !metric_compatible(metric.mtype, q.qtype) {
        errors.push(SpecError::MetricIncompatible {
            metric: metric.mtype.as_str(),
            qtype: q.qtype.as_str(),
        });
    }
}

fn check_literal(q: &Question, value: &ScalarValue, errors: &mut Vec<SpecError>) {
    match q.qtype {
        QuestionType::Numeric => {
            if value.as_f64().is_none() {
                errors.push(SpecError::InvalidCriteriaValue {
                    question_id: q.question_id.clone(),
                    value: value.to_string(),
                });
            }
        }
        QuestionType::SingleChoice | QuestionType::MultiChoice => {
            if !q.options.is_empty() {
                let text = value.to_string();
                if !q.option_codes().any(|c| c == text) {
                    errors.push(SpecError::InvalidCriteriaValue {
                        question_id: q.question_id.clone(),
                        value: text,
                    });
                }
            }
        }
        // Likert/NPS scales carry no declared option set; bounds are implied
        // by the scale and left to the data.
        _ => {}
    }
}

fn check_ordinal_op(
    op: &'static str,
    q: &Question,
    errors: &mut Vec<SpecError>,
) -> bool {
    if q.qtype.is_ordinal() {
        true
    } else {
        errors.push(SpecError::FilterOperatorInvalid {
            op,
            question_id: q.question_id.clone(),
            qtype: q.qtype.as_str(),
        });
        false
    }
}

/// Validate one filter expression against the catalog: identifier existence,
/// operator applicability per question type, and literal domains.
pub fn validate_filter(expr: &FilterExpr, questions: &HashMap<String, Question>) -> Vec<SpecError> {
    let mut errors = Vec::new();
    expr.for_each_leaf(&mut |leaf| {
        let Some(id) = leaf.leaf_question_id() else {
            return;
        };
        let Some(q) = questions.get(id) else {
            errors.push(SpecError::UnknownQuestion {
                question_id: id.to_string(),
            });
            return;
        };
        match leaf {
            FilterExpr::Eq { value, .. } => {
                if q.qtype == QuestionType::MultiChoice {
                    errors.push(SpecError::FilterOperatorInvalid {
                        op: "eq",
                        question_id: q.question_id.clone(),
                        qtype: q.qtype.as_str(),
                    });
                } else {
                    check_literal(q, value, &mut errors);
                }
            }
            FilterExpr::In { values, .. } => {
                if q.qtype == QuestionType::MultiChoice {
                    errors.push(SpecError::FilterOperatorInvalid {
                        op: "in",
                        question_id: q.question_id.clone(),
                        qtype: q.qtype.as_str(),
                    });
                } else {
                    for v in values {
                        check_literal(q, v, &mut errors);
                    }
                }
            }
            FilterExpr::ContainsAny { values, .. } => {
                if q.qtype != QuestionType::MultiChoice {
                    errors.push(SpecError::FilterOperatorInvalid {
                        op: "contains_any",
                        question_id: q.question_id.clone(),
                        qtype: q.qtype.as_str(),
                    });
                } else {
                    for v in values {
                        check_literal(q, v, &mut errors);
                    }
                }
            }
            FilterExpr::Range { min, max, .. } => {
                if check_ordinal_op("range", q, &mut errors) && min > max {
                    errors.push(SpecError::InvalidCriteriaValue {
                        question_id: q.question_id.clone(),
                        value: format!("[{min}, {max}]"),
                    });
                }
            }
            FilterExpr::Gt { .. } => {
                check_ordinal_op("gt", q, &mut errors);
            }
            FilterExpr::Gte { .. } => {
                check_ordinal_op("gte", q, &mut errors);
            }
            FilterExpr::Lt { .. } => {
                check_ordinal_op("lt", q, &mut errors);
            }
            FilterExpr::Lte { .. } => {
                check_ordinal_op("lte", q, &mut errors);
            }
            _ => {}
        }
    });
    errors
}

/// Validate a segment definition before it is registered in the session.
pub fn validate_segment(
    segment: &SegmentSpec,
    questions: &HashMap<String, Question>,
) -> Result<(), Vec<SpecError>> {
    let errors = validate_filter(&segment.definition, questions);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a cut specification: every referenced id must exist, the metric
/// must fit the target question's type, and the filter must be well-formed.
pub fn validate_cut(
    cut: &CutSpec,
    questions: &HashMap<String, Question>,
    segments: &HashMap<String, SegmentSpec>,
) -> Result<(), Vec<SpecError>> {
    let mut errors = Vec::new();

    check_metric(&cut.metric, questions, &mut errors);

    for dim in &cut.dimensions {
        match dim.kind {
            DimensionKind::Question => {
                if !questions.contains_key(&dim.id) {
                    errors.push(SpecError::UnknownQuestion {
                        question_id: dim.id.clone(),
                    });
                }
            }
            DimensionKind::Segment => {
                if !segments.contains_key(&dim.id) {
                    errors.push(SpecError::UnknownSegment {
                        segment_id: dim.id.clone(),
                    });
                }
            }
        }
    }

    if let Some(filter) = &cut.filter {
        errors.extend(validate_filter(filter, questions));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::specs::DimensionSpec;

    fn catalog() -> HashMap<String, Question> {
        let questions = vec![
            q("Q_REGION", "Region", QuestionType::SingleChoice, &["NORTH", "SOUTH"]),
            q("Q_FEATURES", "Features Used", QuestionType::MultiChoice, &["DASH", "API"]),
            q("Q_SAT", "Overall Satisfaction", QuestionType::Likert1To5, &[]),
            q("Q_NPS", "Net Promoter Score", QuestionType::Nps0To10, &[]),
            q("Q_AGE", "Age", QuestionType::Numeric, &[]),
        ];
        questions
            .into_iter()
            .map(|q| (q.question_id.clone(), q))
            .collect()
    }

    fn q(id: &str, label: &str, qtype: QuestionType, codes: &[&str]) -> Question {
        Question {
            question_id: id.into(),
            label: label.into(),
            qtype,
            options: codes
                .iter()
                .map(|c| crate::contracts::AnswerOption {
                    code: c.to_string(),
                    label: c.to_string(),
                })
                .collect(),
        }
    }

    fn freq_cut(question_id: &str) -> CutSpec {
        CutSpec {
            cut_id: "c1".into(),
            metric: MetricSpec {
                mtype: MetricType::Frequency,
                question_id: question_id.into(),
                params: Default::default(),
            },
            dimensions: Vec::new(),
            filter: None,
        }
    }

    #[test]
    fn mean_on_single_choice_is_incompatible() {
        let mut cut = freq_cut("Q_REGION");
        cut.metric.mtype = MetricType::Mean;
        let errs = validate_cut(&cut, &catalog(), &HashMap::new()).unwrap_err();
        assert!(matches!(errs[0], SpecError::MetricIncompatible { .. }));
    }

    #[test]
    fn nps_requires_nps_scaled_question() {
        let mut cut = freq_cut("Q_SAT");
        cut.metric.mtype = MetricType::Nps;
        assert!(validate_cut(&cut, &catalog(), &HashMap::new()).is_err());

        let mut ok = freq_cut("Q_NPS");
        ok.metric.mtype = MetricType::Nps;
        assert!(validate_cut(&ok, &catalog(), &HashMap::new()).is_ok());
    }

    #[test]
    fn unknown_dimension_ids_are_reported() {
        let mut cut = freq_cut("Q_REGION");
        cut.dimensions = vec![
            DimensionSpec {
                kind: DimensionKind::Question,
                id: "QUNKNOWN".into(),
            },
            DimensionSpec {
                kind: DimensionKind::Segment,
                id: "seg_missing".into(),
            },
        ];
        let errs = validate_cut(&cut, &catalog(), &HashMap::new()).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(matches!(errs[0], SpecError::UnknownQuestion { .. }));
        assert!(matches!(errs[1], SpecError::UnknownSegment { .. }));
    }

    #[test]
    fn gt_on_categorical_is_operator_invalid() {
        let filter = FilterExpr::Gt {
            question_id: "Q_REGION".into(),
            value: 5.0,
        };
        let errs = validate_filter(&filter, &catalog());
        assert!(matches!(errs[0], SpecError::FilterOperatorInvalid { op: "gt", .. }));
    }

    #[test]
    fn eq_on_multi_choice_is_operator_invalid() {
        let filter = FilterExpr::Eq {
            question_id: "Q_FEATURES".into(),
            value: ScalarValue::Text("DASH".into()),
        };
        let errs = validate_filter(&filter, &catalog());
        assert!(matches!(errs[0], SpecError::FilterOperatorInvalid { op: "eq", .. }));
    }

    #[test]
    fn contains_any_only_on_multi_choice() {
        let ok = FilterExpr::ContainsAny {
            question_id: "Q_FEATURES".into(),
            values: vec![ScalarValue::Text("DASH".into())],
        };
        assert!(validate_filter(&ok, &catalog()).is_empty());

        let bad = FilterExpr::ContainsAny {
            question_id: "Q_REGION".into(),
            values: vec![ScalarValue::Text("NORTH".into())],
        };
        assert!(!validate_filter(&bad, &catalog()).is_empty());
    }

    #[test]
    fn out_of_domain_code_is_invalid_criteria() {
        let filter = FilterExpr::Eq {
            question_id: "Q_REGION".into(),
            value: ScalarValue::Text("SOUTHEAST".into()),
        };
        let errs = validate_filter(&filter, &catalog());
        assert!(matches!(errs[0], SpecError::InvalidCriteriaValue { .. }));
    }

    #[test]
    fn text_literal_on_numeric_question_is_invalid() {
        let filter = FilterExpr::Eq {
            question_id: "Q_AGE".into(),
            value: ScalarValue::Text("UK".into()),
        };
        let errs = validate_filter(&filter, &catalog());
        assert!(matches!(errs[0], SpecError::InvalidCriteriaValue { .. }));
    }

    #[test]
    fn inverted_range_is_invalid_criteria() {
        let filter = FilterExpr::Range {
            question_id: "Q_AGE".into(),
            min: 40.0,
            max: 18.0,
            inclusive: true,
        };
        let errs = validate_filter(&filter, &catalog());
        assert!(matches!(errs[0], SpecError::InvalidCriteriaValue { .. }));
    }

    #[test]
    fn unknown_filter_id_is_reported_once() {
        let filter = FilterExpr::Eq {
            question_id: "UNKNOWN".into(),
            value: ScalarValue::Number(10.0),
        };
        let errs = validate_filter(&filter, &catalog());
        assert_eq!(
            errs,
            vec![SpecError::UnknownQuestion {
                question_id: "UNKNOWN".into()
            }]
        );
    }
}
