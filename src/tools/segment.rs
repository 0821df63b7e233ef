//! Segment definition builder.

use crate::contracts::tool_output::ToolOutput;
use crate::contracts::{Question, SegmentSpec};
use crate::gateway::{structured_complete, StructuredProvider};
use crate::prompts;

use super::{gateway_failure, questions_summary};

pub async fn build_segment(
    provider: &dyn StructuredProvider,
    prompt: &str,
    questions: &[Question],
) -> ToolOutput<SegmentSpec> {
    if prompt.trim().is_empty() {
        return ToolOutput::failure_with("missing_input", "No segment description provided");
    }

    let user_content = format!(
        "Segment request:\n{prompt}\n\nQuestions:\n{}",
        questions_summary(questions),
    );

    match structured_complete::<SegmentSpec>(provider, prompts::SEGMENT_PLAN, &user_content).await
    {
        Ok((segment, trace)) => ToolOutput::success(segment, Some(trace)),
        Err(err) => gateway_failure("segment builder", err),
    }
}
