//! Conversational responder.

use crate::contracts::tool_output::ToolOutput;
use crate::contracts::ChatReply;
use crate::gateway::{structured_complete, StructuredProvider};
use crate::prompts;

use super::gateway_failure;

pub async fn respond(provider: &dyn StructuredProvider, prompt: &str) -> ToolOutput<ChatReply> {
    if prompt.trim().is_empty() {
        return ToolOutput::failure_with("missing_input", "No user input provided");
    }

    match structured_complete::<ChatReply>(provider, prompts::CHAT_RESPOND, prompt).await {
        Ok((reply, trace)) => ToolOutput::success(reply, Some(trace)),
        Err(err) => gateway_failure("chat responder", err),
    }
}
