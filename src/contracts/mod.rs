//! Data contracts shared by the tools, validators, engine and orchestrator.
//!
//! Everything here is serde-serializable: these are the shapes that cross the
//! structured-completion boundary, so the JSON schema derived from them is the
//! schema the planner model is held to.

pub mod filters;
pub mod questions;
pub mod specs;
pub mod tool_output;
pub mod validate;

pub use filters::{FilterExpr, ScalarValue};
pub use questions::{AnswerOption, Question, QuestionType};
pub use specs::{
    Action, AgentResponse, AnalysisIntent, ChatReply, ClarifyRequest, CutPlanOutcome, CutSpec,
    DimensionKind, DimensionSpec, DisambiguationOption, HighLevelPlan, IntentType, MetricSpec,
    MetricType, SegmentSpec, UserIntent,
};
pub use tool_output::{ToolMessage, ToolOutput};
pub use validate::{validate_cut, validate_filter, validate_segment, SpecError};
