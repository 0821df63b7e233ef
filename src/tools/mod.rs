//! The agent's tools: one pure classifier plus four LLM-backed planners.
//!
//! Every LLM-backed tool makes at most one gateway call and returns a
//! [`ToolOutput`]; gateway failures are folded into the envelope, never
//! propagated as raised errors.

pub mod chat;
pub mod cut;
pub mod intent;
pub mod plan;
pub mod segment;

use crate::contracts::tool_output::{ToolMessage, ToolOutput};
use crate::contracts::{Question, SegmentSpec};
use crate::gateway::GatewayError;

/// Compact catalog listing injected into planner prompts.
pub(crate) fn questions_summary(questions: &[Question]) -> String {
    let mut out = String::new();
    for q in questions {
        out.push_str(&format!("- {} ({}): {}", q.question_id, q.qtype.as_str(), q.label));
        if !q.options.is_empty() {
            let codes: Vec<&str> = q.option_codes().collect();
            out.push_str(&format!(" [options: {}]", codes.join(", ")));
        }
        out.push('\n');
    }
    if out.is_empty() {
        out.push_str("(none)\n");
    }
    out
}

/// Compact segment listing injected into the cut planner prompt.
pub(crate) fn segments_summary(segments: &[SegmentSpec]) -> String {
    if segments.is_empty() {
        return "(none)\n".to_string();
    }
    let mut out = String::new();
    for s in segments {
        out.push_str(&format!("- {}: {}\n", s.segment_id, s.name));
    }
    out
}

/// Convert a gateway failure into a tool failure envelope. Schema violations
/// keep their own code so the orchestrator can report them distinctly.
pub(crate) fn gateway_failure<T>(what: &str, err: GatewayError) -> ToolOutput<T> {
    tracing::warn!(tool = what, code = err.code(), error = %err, "tool call failed");
    let (code, message) = if err.is_schema_violation() {
        (
            "unsupported_schema_value",
            format!("{what} returned a value outside the supported contract"),
        )
    } else {
        ("tool_error", format!("{what} failed"))
    };
    ToolOutput::failure(vec![ToolMessage::new(code, message)], None)
}
