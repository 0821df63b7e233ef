//! Standard output envelope for tool invocations.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::gateway::CallTrace;

/// A machine-readable error or warning from a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolMessage {
    /// Stable code, e.g. `unknown_identifier` or `tool_error`.
    pub code: String,
    /// Human-readable message, safe to show to end users.
    pub message: String,
    /// Extra context for debugging. Never surfaced in user-facing text.
    pub context: Map<String, Value>,
}

impl ToolMessage {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: Map::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Success-with-data or failure-with-errors; `trace` carries diagnostic
/// metadata about any LLM call the tool made.
#[derive(Debug)]
pub struct ToolOutput<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub errors: Vec<ToolMessage>,
    pub warnings: Vec<ToolMessage>,
    pub trace: Option<CallTrace>,
}

impl<T> ToolOutput<T> {
    pub fn success(data: T, trace: Option<CallTrace>) -> Self {
        Self {
            ok: true,
            data: Some(data),
            errors: Vec::new(),
            warnings: Vec::new(),
            trace,
        }
    }

    pub fn failure(errors: Vec<ToolMessage>, trace: Option<CallTrace>) -> Self {
        Self {
            ok: false,
            data: None,
            errors,
            warnings: Vec::new(),
            trace,
        }
    }

    pub fn failure_with(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::failure(vec![ToolMessage::new(code, message)], None)
    }
}
