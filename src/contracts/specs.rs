//! Specification contracts for analysis definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::filters::FilterExpr;

// =============================================================================
// SEGMENTS, METRICS, CUTS
// =============================================================================

/// A named, reusable subset of respondents defined by a filter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentSpec {
    pub segment_id: String,
    pub name: String,
    pub definition: FilterExpr,
    #[serde(default)]
    pub intended_partition: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Closed metric set. Anything else must fail schema decoding before it can
/// reach validation or execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Frequency,
    Mean,
    Top2box,
    Bottom2box,
    Nps,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Frequency => "frequency",
            MetricType::Mean => "mean",
            MetricType::Top2box => "top2box",
            MetricType::Bottom2box => "bottom2box",
            MetricType::Nps => "nps",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetricSpec {
    #[serde(rename = "type")]
    pub mtype: MetricType,
    pub question_id: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    Question,
    Segment,
}

/// A grouping axis: another question's categories, or membership in a
/// previously defined segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DimensionSpec {
    pub kind: DimensionKind,
    pub id: String,
}

/// The unit of execution: one metric, optional crossing dimensions, optional
/// top-level filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CutSpec {
    pub cut_id: String,
    pub metric: MetricSpec,
    #[serde(default)]
    pub dimensions: Vec<DimensionSpec>,
    #[serde(default)]
    pub filter: Option<FilterExpr>,
}

// =============================================================================
// PLANNING
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisIntent {
    pub intent_id: String,
    pub description: String,
    #[serde(default)]
    pub segments_needed: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HighLevelPlan {
    pub intents: Vec<AnalysisIntent>,
    pub rationale: String,
    #[serde(default)]
    pub suggested_segments: Vec<SegmentSpec>,
}

/// Envelope the cut planner model fills in. `ok = false` means the planner
/// could not produce a cut from the request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CutPlanOutcome {
    #[serde(default = "default_true")]
    pub ok: bool,
    #[serde(default)]
    pub cut: Option<CutSpec>,
    /// How free-text mentions were resolved to question ids (diagnostic).
    #[serde(default)]
    pub resolution_map: Map<String, Value>,
    #[serde(default)]
    pub ambiguity_options: Vec<String>,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// INTENTS AND TURN ENVELOPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Chat,
    HighLevelPlan,
    CutAnalysis,
    SegmentDefinition,
    Clarify,
}

impl IntentType {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentType::Chat => "chat",
            IntentType::HighLevelPlan => "high_level_plan",
            IntentType::CutAnalysis => "cut_analysis",
            IntentType::SegmentDefinition => "segment_definition",
            IntentType::Clarify => "clarify",
        }
    }
}

/// Routing decision for one turn. `reasoning` is diagnostic only and is never
/// shown to end users.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UserIntent {
    pub intent_type: IntentType,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

impl UserIntent {
    pub fn new(intent_type: IntentType, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            intent_type,
            confidence,
            reasoning: reasoning.into(),
        }
    }
}

/// A follow-up the chat responder may suggest.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    pub label: String,
    pub action_type: IntentType,
    #[serde(default)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChatReply {
    pub message: String,
    #[serde(default)]
    pub suggested_actions: Vec<Action>,
}

/// One candidate interpretation offered when input is ambiguous.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DisambiguationOption {
    pub option_id: String,
    pub label: String,
    pub action_type: IntentType,
    #[serde(default)]
    pub action_params: Map<String, Value>,
}

/// Ephemeral clarification prompt: held only between two turns, at most one
/// pending set at a time.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClarifyRequest {
    pub question: String,
    pub options: Vec<DisambiguationOption>,
}

/// What one turn of `Agent::handle_message` returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub intent: UserIntent,
    pub success: bool,
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub clarify: Option<ClarifyRequest>,
}
