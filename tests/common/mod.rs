#![allow(dead_code)]

//! Shared test fixtures: a deterministic structured-completion stub and the
//! demo dataset.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crosstab_agent::agent::Agent;
use crosstab_agent::contracts::Question;
use crosstab_agent::data;
use crosstab_agent::engine::ResponseTable;
use crosstab_agent::gateway::{
    CallTrace, GatewayError, StructuredProvider, StructuredReply, StructuredRequest,
};

type Handler = Box<dyn Fn(&str) -> Value + Send + Sync>;

/// Deterministic provider: one handler per target schema name, fed the user
/// content so replies can vary by request text. Schemas without a handler
/// fail like a transport error would.
#[derive(Default)]
pub struct StubProvider {
    handlers: HashMap<&'static str, Handler>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        mut self,
        schema: &'static str,
        handler: impl Fn(&str) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.handlers.insert(schema, Box::new(handler));
        self
    }

    pub fn value(self, schema: &'static str, value: Value) -> Self {
        self.on(schema, move |_| value.clone())
    }

    pub fn chat(self, message: &str) -> Self {
        let message = message.to_string();
        self.on("ChatReply", move |_| {
            serde_json::json!({ "message": message, "suggested_actions": [] })
        })
    }
}

#[async_trait]
impl StructuredProvider for StubProvider {
    async fn complete(&self, req: StructuredRequest) -> Result<StructuredReply, GatewayError> {
        match self.handlers.get(req.schema_name.as_str()) {
            Some(handler) => Ok(StructuredReply {
                value: handler(&req.user),
                trace: CallTrace::local("stub"),
            }),
            None => Err(GatewayError::provider("stub", "no handler for schema")),
        }
    }
}

fn demo_path(file: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("data/demo")
        .join(file)
}

pub fn demo_questions() -> Vec<Question> {
    data::load_questions(&demo_path("questions.json")).expect("demo questions load")
}

pub fn demo_table() -> ResponseTable {
    data::load_responses(&demo_path("responses.csv")).expect("demo responses load")
}

pub fn demo_agent(provider: StubProvider) -> Agent {
    Agent::new(demo_questions(), demo_table(), None, Arc::new(provider))
}
