//! High-level analysis planner.

use crate::contracts::tool_output::ToolOutput;
use crate::contracts::{HighLevelPlan, Question};
use crate::gateway::{structured_complete, StructuredProvider};
use crate::prompts;

use super::{gateway_failure, questions_summary};

pub async fn build_plan(
    provider: &dyn StructuredProvider,
    prompt: &str,
    scope: Option<&str>,
    questions: &[Question],
) -> ToolOutput<HighLevelPlan> {
    let request = if prompt.trim().is_empty() {
        "Create an analysis plan."
    } else {
        prompt
    };
    let user_content = format!(
        "User request:\n{request}\n\nScope:\n{}\n\nQuestions:\n{}",
        scope.unwrap_or(""),
        questions_summary(questions),
    );

    match structured_complete::<HighLevelPlan>(provider, prompts::HIGH_LEVEL_PLAN, &user_content)
        .await
    {
        Ok((plan, trace)) => ToolOutput::success(plan, Some(trace)),
        Err(err) => gateway_failure("analysis planner", err),
    }
}
