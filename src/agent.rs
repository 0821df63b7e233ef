//! The per-session orchestrator.
//!
//! One `handle_message` call runs a whole turn: pending-selection resolution,
//! ambiguity check, intent classification, tool dispatch, domain validation,
//! execution, response formatting. Each stage may short-circuit into a
//! user-facing failure or clarification without invoking later stages, and a
//! raised error never escapes to the caller: every failure is folded into a
//! polite envelope with no internal identifiers in the message.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::clarify;
use crate::contracts::tool_output::ToolMessage;
use crate::contracts::{
    validate_cut, validate_segment, AgentResponse, ClarifyRequest, CutSpec, DisambiguationOption,
    FilterExpr, IntentType, Question, SegmentSpec, UserIntent,
};
use crate::engine::{Executor, ResponseTable, ResultTable};
use crate::gateway::StructuredProvider;
use crate::tools;

/// Display rows shown in a cut-result preview.
const PREVIEW_ROWS: usize = 20;

/// Plan intents listed in a plan response.
const PLAN_ITEMS: usize = 20;

const GENERIC_FAILURE: &str =
    "Sorry, I couldn't complete that request. Try rephrasing it, or ask for help to see what I can do.";

const VALIDATION_FAILURE: &str =
    "That request doesn't line up with the survey data. Check the question ids and values, then try again.";

pub struct Agent {
    questions: Vec<Question>,
    questions_by_id: HashMap<String, Question>,
    table: ResponseTable,
    scope: Option<String>,
    segments: Vec<SegmentSpec>,
    segments_by_id: HashMap<String, SegmentSpec>,
    /// Single-slot pending clarification; cleared on every follow-up.
    pending: Option<Vec<DisambiguationOption>>,
    provider: Arc<dyn StructuredProvider>,
    executions: u64,
}

impl Agent {
    pub fn new(
        questions: Vec<Question>,
        table: ResponseTable,
        scope: Option<String>,
        provider: Arc<dyn StructuredProvider>,
    ) -> Self {
        let questions_by_id = questions
            .iter()
            .map(|q| (q.question_id.clone(), q.clone()))
            .collect();
        Self {
            questions,
            questions_by_id,
            table,
            scope,
            segments: Vec::new(),
            segments_by_id: HashMap::new(),
            pending: None,
            provider,
            executions: 0,
        }
    }

    /// Segments defined so far, in definition order.
    pub fn segments(&self) -> &[SegmentSpec] {
        &self.segments
    }

    pub fn segment(&self, segment_id: &str) -> Option<&SegmentSpec> {
        self.segments_by_id.get(segment_id)
    }

    /// Whether a clarification prompt is awaiting a numeric selection.
    pub fn awaiting_selection(&self) -> bool {
        self.pending.is_some()
    }

    /// How many executor batches have run this session.
    pub fn executions(&self) -> u64 {
        self.executions
    }

    /// Process one user turn.
    pub async fn handle_message(&mut self, input: &str) -> AgentResponse {
        let turn_id = Uuid::new_v4();
        let text = input.trim().to_string();

        // Pending clarification: a valid numeric choice dispatches directly;
        // anything else cancels and the current message is processed fresh.
        if let Some(pending) = self.pending.take() {
            if let Some(option) = clarify::resolve_selection(&text, &pending) {
                tracing::debug!(%turn_id, option = %option.option_id, "clarification resolved");
                return self.execute_action(option).await;
            }
            tracing::debug!(%turn_id, "clarification cancelled");
        }

        if text.is_empty() {
            return AgentResponse {
                intent: UserIntent::new(IntentType::Chat, 0.0, "missing input"),
                success: false,
                message: Some("I didn't catch that. Please type a request.".to_string()),
                errors: vec!["No user input provided".to_string()],
                data: None,
                clarify: None,
            };
        }

        if let Some(request) = clarify::detect_ambiguity(&text, &self.questions) {
            tracing::debug!(%turn_id, options = request.options.len(), "ambiguity detected");
            return self.ask_clarification(request);
        }

        let intent = tools::intent::classify(&text, &self.questions);
        tracing::debug!(
            %turn_id,
            intent = intent.intent_type.as_str(),
            confidence = intent.confidence,
            "intent classified"
        );

        match intent.intent_type {
            IntentType::HighLevelPlan => self.run_plan(intent, &text).await,
            IntentType::SegmentDefinition => self.run_segment(intent, &text).await,
            IntentType::CutAnalysis => self.run_cut(intent, &text).await,
            IntentType::Chat | IntentType::Clarify => self.run_chat(intent, &text).await,
        }
    }

    // =========================================================================
    // CLARIFICATION
    // =========================================================================

    fn ask_clarification(&mut self, request: ClarifyRequest) -> AgentResponse {
        self.pending = Some(request.options.clone());

        let mut lines = vec![request.question.clone(), String::new(), "Please choose one:".into()];
        for (i, option) in request.options.iter().enumerate() {
            lines.push(format!("{}) {}", i + 1, option.label));
        }
        lines.push("Reply with a number.".into());

        AgentResponse {
            intent: UserIntent::new(IntentType::Clarify, 1.0, "ambiguous input"),
            success: true,
            message: Some(lines.join("\n")),
            errors: Vec::new(),
            data: None,
            clarify: Some(request),
        }
    }

    /// Dispatch a resolved clarification option directly, bypassing intent
    /// classification so a short action label like "plan" cannot re-trigger
    /// the ambiguity check.
    async fn execute_action(&mut self, option: DisambiguationOption) -> AgentResponse {
        match option.action_type {
            IntentType::HighLevelPlan => {
                let intent =
                    UserIntent::new(IntentType::HighLevelPlan, 1.0, "clarify selection");
                self.run_plan(intent, "Create an analysis plan").await
            }
            IntentType::CutAnalysis => {
                let prompt = option
                    .action_params
                    .get("question_id")
                    .and_then(Value::as_str)
                    .map(|qid| format!("analyze {qid}"))
                    .or_else(|| {
                        option
                            .action_params
                            .get("request")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                    .unwrap_or_else(|| option.label.clone());
                let intent = UserIntent::new(IntentType::CutAnalysis, 1.0, "clarify selection");
                self.run_cut(intent, &prompt).await
            }
            _ => {
                let intent = UserIntent::new(IntentType::Chat, 1.0, "clarify selection");
                self.run_chat(intent, &option.label).await
            }
        }
    }

    // =========================================================================
    // TOOL PATHS
    // =========================================================================

    async fn run_chat(&self, intent: UserIntent, prompt: &str) -> AgentResponse {
        let out = tools::chat::respond(self.provider.as_ref(), prompt).await;
        let reply = match (out.ok, out.data) {
            (true, Some(reply)) => reply,
            _ => return failure_response(intent, GENERIC_FAILURE, &out.errors),
        };
        let data = serde_json::to_value(&reply).ok();
        AgentResponse {
            intent,
            success: true,
            message: Some(reply.message),
            errors: Vec::new(),
            data,
            clarify: None,
        }
    }

    async fn run_plan(&self, intent: UserIntent, prompt: &str) -> AgentResponse {
        let out = tools::plan::build_plan(
            self.provider.as_ref(),
            prompt,
            self.scope.as_deref(),
            &self.questions,
        )
        .await;
        let plan = match (out.ok, out.data) {
            (true, Some(plan)) => plan,
            _ => return failure_response(intent, GENERIC_FAILURE, &out.errors),
        };

        let mut lines = vec!["Analysis plan:".to_string()];
        for (i, item) in plan.intents.iter().take(PLAN_ITEMS).enumerate() {
            lines.push(format!(
                "{}. {} (priority {})",
                i + 1,
                item.description,
                item.priority
            ));
        }

        AgentResponse {
            intent,
            success: true,
            message: Some(lines.join("\n")),
            errors: Vec::new(),
            data: serde_json::to_value(&plan).ok(),
            clarify: None,
        }
    }

    async fn run_segment(&mut self, intent: UserIntent, prompt: &str) -> AgentResponse {
        let out =
            tools::segment::build_segment(self.provider.as_ref(), prompt, &self.questions).await;
        let segment = match (out.ok, out.data) {
            (true, Some(segment)) => segment,
            _ => return failure_response(intent, GENERIC_FAILURE, &out.errors),
        };

        if let Err(errors) = validate_segment(&segment, &self.questions_by_id) {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return spec_failure_response(intent, &messages);
        }

        // Redefinition with the same id replaces in place, keeping the list
        // view's original position.
        let message = format!("Created segment {} ({})", segment.name, segment.segment_id);
        let data = serde_json::to_value(&segment).ok();
        match self
            .segments
            .iter_mut()
            .find(|s| s.segment_id == segment.segment_id)
        {
            Some(slot) => *slot = segment.clone(),
            None => self.segments.push(segment.clone()),
        }
        self.segments_by_id
            .insert(segment.segment_id.clone(), segment);

        AgentResponse {
            intent,
            success: true,
            message: Some(message),
            errors: Vec::new(),
            data,
            clarify: None,
        }
    }

    async fn run_cut(&mut self, intent: UserIntent, prompt: &str) -> AgentResponse {
        let out = tools::cut::plan_cut(
            self.provider.as_ref(),
            prompt,
            &self.questions,
            &self.segments,
        )
        .await;
        let cut = match (out.ok, out.data) {
            (true, Some(cut)) => cut,
            _ => return failure_response(intent, GENERIC_FAILURE, &out.errors),
        };

        if let Err(errors) = validate_cut(&cut, &self.questions_by_id, &self.segments_by_id) {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return spec_failure_response(intent, &messages);
        }

        self.executions += 1;
        let result = Executor::new(&self.table, &self.questions_by_id, &self.segments_by_id)
            .execute_cuts(std::slice::from_ref(&cut));

        if !result.errors.is_empty() {
            let messages: Vec<String> = result.errors.iter().map(|e| e.to_string()).collect();
            return spec_failure_response(intent, &messages);
        }
        let Some(table) = result.tables.first() else {
            return failure_response(intent, GENERIC_FAILURE, &[]);
        };

        let mut message = format!(
            "{}\n\nBase N: {}",
            self.format_cut_spec(&cut),
            table.base_n
        );
        if !table.is_empty() {
            message.push_str("\n\n");
            message.push_str(&render_preview(table, PREVIEW_ROWS));
        }

        AgentResponse {
            intent,
            success: true,
            message: Some(message),
            errors: Vec::new(),
            data: serde_json::to_value(table).ok(),
            clarify: None,
        }
    }

    // =========================================================================
    // FORMATTING
    // =========================================================================

    fn q_label(&self, question_id: &str) -> String {
        self.questions_by_id
            .get(question_id)
            .map(Question::display_label)
            .unwrap_or_else(|| question_id.to_string())
    }

    fn segment_label(&self, segment_id: &str) -> String {
        self.segments_by_id
            .get(segment_id)
            .map(|s| format!("{} ({})", s.name, s.segment_id))
            .unwrap_or_else(|| segment_id.to_string())
    }

    fn format_filter(&self, expr: &FilterExpr) -> String {
        match expr {
            FilterExpr::Eq { question_id, value } => {
                format!("{} == {}", self.q_label(question_id), value)
            }
            FilterExpr::In {
                question_id,
                values,
            } => {
                let vals: Vec<String> = values.iter().map(ToString::to_string).collect();
                format!("{} in [{}]", self.q_label(question_id), vals.join(", "))
            }
            FilterExpr::Range {
                question_id,
                min,
                max,
                inclusive,
            } => {
                let op = if *inclusive { "between" } else { "strictly between" };
                format!("{} {op} [{min}, {max}]", self.q_label(question_id))
            }
            FilterExpr::ContainsAny {
                question_id,
                values,
            } => {
                let vals: Vec<String> = values.iter().map(ToString::to_string).collect();
                format!(
                    "{} contains any of [{}]",
                    self.q_label(question_id),
                    vals.join(", ")
                )
            }
            FilterExpr::Gt { question_id, value } => {
                format!("{} > {value}", self.q_label(question_id))
            }
            FilterExpr::Gte { question_id, value } => {
                format!("{} >= {value}", self.q_label(question_id))
            }
            FilterExpr::Lt { question_id, value } => {
                format!("{} < {value}", self.q_label(question_id))
            }
            FilterExpr::Lte { question_id, value } => {
                format!("{} <= {value}", self.q_label(question_id))
            }
            FilterExpr::And { children } => {
                let parts: Vec<String> = children.iter().map(|c| self.format_filter(c)).collect();
                format!("({})", parts.join(" AND "))
            }
            FilterExpr::Or { children } => {
                let parts: Vec<String> = children.iter().map(|c| self.format_filter(c)).collect();
                format!("({})", parts.join(" OR "))
            }
            FilterExpr::Not { child } => format!("(NOT {})", self.format_filter(child)),
        }
    }

    fn format_cut_spec(&self, cut: &CutSpec) -> String {
        let metric = format!(
            "{} on {}",
            cut.metric.mtype.as_str(),
            self.q_label(&cut.metric.question_id)
        );

        let dims: Vec<String> = cut
            .dimensions
            .iter()
            .map(|d| match d.kind {
                crate::contracts::DimensionKind::Question => self.q_label(&d.id),
                crate::contracts::DimensionKind::Segment => self.segment_label(&d.id),
            })
            .collect();

        let filter = cut
            .filter
            .as_ref()
            .map(|f| self.format_filter(f))
            .unwrap_or_else(|| "(none)".to_string());

        let mut lines = vec![
            "CutSpec:".to_string(),
            format!("- cut_id: {}", cut.cut_id),
            format!("- metric: {metric}"),
            format!(
                "- dimensions: {}",
                if dims.is_empty() {
                    "(none)".to_string()
                } else {
                    dims.join(", ")
                }
            ),
            format!("- filter: {filter}"),
        ];
        if !cut.metric.params.is_empty() {
            lines.push(format!(
                "- metric_params: {}",
                Value::Object(cut.metric.params.clone())
            ));
        }
        lines.join("\n")
    }
}

/// Failure envelope for tool errors. The user-facing message stays generic;
/// sanitized per-error lines ride in `errors`.
fn failure_response(intent: UserIntent, message: &str, errors: &[ToolMessage]) -> AgentResponse {
    AgentResponse {
        intent,
        success: false,
        message: Some(message.to_string()),
        errors: errors.iter().map(|e| e.message.clone()).collect(),
        data: None,
        clarify: None,
    }
}

/// Failure envelope for validation/execution errors, whose Display strings
/// are already user-safe.
fn spec_failure_response(intent: UserIntent, errors: &[String]) -> AgentResponse {
    AgentResponse {
        intent,
        success: false,
        message: Some(VALIDATION_FAILURE.to_string()),
        errors: errors.to_vec(),
        data: None,
        clarify: None,
    }
}

/// Fixed-width text preview of a result table.
fn render_preview(table: &ResultTable, max_rows: usize) -> String {
    let shown: Vec<Vec<String>> = table
        .rows
        .iter()
        .take(max_rows)
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();

    let mut widths: Vec<usize> = table.columns.iter().map(String::len).collect();
    for row in &shown {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let render_row = |cells: Vec<String>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:width$}", c, width = widths.get(i).copied().unwrap_or(0)))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render_row(table.columns.clone())];
    for row in shown {
        lines.push(render_row(row));
    }
    lines.join("\n")
}
