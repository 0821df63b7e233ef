//! Boolean expression AST for filter definitions.
//!
//! A `FilterExpr` arrives from the planning model as tagged JSON (`kind`
//! discriminant). It is not checked against the question catalog at
//! construction: provisional trees must be representable while in transit.
//! Identifier and operator checks happen in [`crate::contracts::validate`]
//! and at evaluation time.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A literal that can appear in a predicate: answer code or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ScalarValue {
    Number(f64),
    Text(String),
}

impl ScalarValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Number(n) => Some(*n),
            ScalarValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s),
            ScalarValue::Number(_) => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            ScalarValue::Number(n) => write!(f, "{n}"),
            ScalarValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Predicate / boolean-expression tree over question columns.
///
/// Leaves reference a `question_id`; composites own their children in order.
/// `and`/`or` children are evaluated left to right for deterministic
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterExpr {
    Eq {
        question_id: String,
        value: ScalarValue,
    },
    In {
        question_id: String,
        values: Vec<ScalarValue>,
    },
    Range {
        question_id: String,
        min: f64,
        max: f64,
        #[serde(default = "default_inclusive")]
        inclusive: bool,
    },
    ContainsAny {
        question_id: String,
        values: Vec<ScalarValue>,
    },
    Gt {
        question_id: String,
        value: f64,
    },
    Gte {
        question_id: String,
        value: f64,
    },
    Lt {
        question_id: String,
        value: f64,
    },
    Lte {
        question_id: String,
        value: f64,
    },
    And {
        children: Vec<FilterExpr>,
    },
    Or {
        children: Vec<FilterExpr>,
    },
    Not {
        child: Box<FilterExpr>,
    },
}

fn default_inclusive() -> bool {
    true
}

impl FilterExpr {
    /// Visit every leaf predicate, left to right.
    pub fn for_each_leaf<'a>(&'a self, f: &mut impl FnMut(&'a FilterExpr)) {
        match self {
            FilterExpr::And { children } | FilterExpr::Or { children } => {
                for c in children {
                    c.for_each_leaf(f);
                }
            }
            FilterExpr::Not { child } => child.for_each_leaf(f),
            leaf => f(leaf),
        }
    }

    /// The question id a leaf references; `None` for composites.
    pub fn leaf_question_id(&self) -> Option<&str> {
        match self {
            FilterExpr::Eq { question_id, .. }
            | FilterExpr::In { question_id, .. }
            | FilterExpr::Range { question_id, .. }
            | FilterExpr::ContainsAny { question_id, .. }
            | FilterExpr::Gt { question_id, .. }
            | FilterExpr::Gte { question_id, .. }
            | FilterExpr::Lt { question_id, .. }
            | FilterExpr::Lte { question_id, .. } => Some(question_id),
            _ => None,
        }
    }
}
