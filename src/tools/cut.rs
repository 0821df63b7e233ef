//! Cut specification planner.

use crate::contracts::tool_output::{ToolMessage, ToolOutput};
use crate::contracts::{CutPlanOutcome, CutSpec, Question, SegmentSpec};
use crate::gateway::{structured_complete, StructuredProvider};
use crate::prompts;

use super::{gateway_failure, questions_summary, segments_summary};

pub async fn plan_cut(
    provider: &dyn StructuredProvider,
    prompt: &str,
    questions: &[Question],
    segments: &[SegmentSpec],
) -> ToolOutput<CutSpec> {
    if prompt.trim().is_empty() {
        return ToolOutput::failure_with("missing_input", "No analysis request provided");
    }

    let user_content = format!(
        "Request:\n{prompt}\n\nQuestions:\n{}\nSegments:\n{}",
        questions_summary(questions),
        segments_summary(segments),
    );

    let (outcome, trace) =
        match structured_complete::<CutPlanOutcome>(provider, prompts::CUT_PLAN, &user_content)
            .await
        {
            Ok(ok) => ok,
            Err(err) => return gateway_failure("cut planner", err),
        };

    if !outcome.ok {
        let mut msg = ToolMessage::new(
            "planning_failed",
            "The request could not be turned into a concrete cut",
        );
        if !outcome.ambiguity_options.is_empty() {
            msg = msg.with_context("ambiguity_options", outcome.ambiguity_options.clone());
        }
        return ToolOutput::failure(vec![msg], Some(trace));
    }

    match outcome.cut {
        Some(cut) => ToolOutput::success(cut, Some(trace)),
        None => ToolOutput::failure(
            vec![ToolMessage::new(
                "planning_failed",
                "The planner reported success without a cut",
            )],
            Some(trace),
        ),
    }
}
