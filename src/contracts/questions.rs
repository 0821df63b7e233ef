//! Survey question catalog types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a question's responses are scaled and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// One categorical answer per respondent.
    SingleChoice,
    /// Zero or more categorical answers, stored as a `|`-delimited set.
    MultiChoice,
    /// Likert scale coded 1..=5.
    #[serde(rename = "likert_1_5")]
    Likert1To5,
    /// Likert scale coded 1..=7.
    #[serde(rename = "likert_1_7")]
    Likert1To7,
    /// Net Promoter Score coded 0..=10.
    #[serde(rename = "nps_0_10")]
    Nps0To10,
    /// Free numeric value (age, spend, ...).
    Numeric,
}

impl QuestionType {
    /// Whether responses carry a meaningful numeric order.
    pub fn is_ordinal(self) -> bool {
        matches!(
            self,
            QuestionType::Likert1To5
                | QuestionType::Likert1To7
                | QuestionType::Nps0To10
                | QuestionType::Numeric
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultiChoice => "multi_choice",
            QuestionType::Likert1To5 => "likert_1_5",
            QuestionType::Likert1To7 => "likert_1_7",
            QuestionType::Nps0To10 => "nps_0_10",
            QuestionType::Numeric => "numeric",
        }
    }
}

/// One declared answer code for a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerOption {
    pub code: String,
    pub label: String,
}

/// A catalog entry. Immutable once loaded; the catalog is owned by the agent
/// for the lifetime of the session.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    pub question_id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub qtype: QuestionType,
    /// Enumerated domain for choice questions; empty for scales and numerics.
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

impl Question {
    /// Declared option codes, if any.
    pub fn option_codes(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|o| o.code.as_str())
    }

    /// Display form used in user-facing text: "Label (Q_ID)".
    pub fn display_label(&self) -> String {
        format!("{} ({})", self.label, self.question_id)
    }
}
