#![forbid(unsafe_code)]

//! # crosstab-agent
//!
//! A conversational survey-tabulation agent. Free-text requests are routed by
//! a deterministic intent classifier to one of four capabilities: general
//! chat, high-level analysis planning, segment definition, or cut analysis.
//! Specifications come back from a schema-constrained LLM call, pass domain
//! validation against the question catalog, and execute against the in-memory
//! response table.
//!
//! The interesting parts are the layered classifier ([`tools::intent`]), the
//! ambiguity/clarification state machine ([`clarify`]) and the cut executor
//! ([`engine::executor`]); the LLM transport ([`gateway`]) and data loading
//! ([`data`]) are thin I/O around them.

pub mod agent;
pub mod clarify;
pub mod contracts;
pub mod data;
pub mod engine;
pub mod gateway;
pub mod prompts;
pub mod tools;

pub use agent::Agent;
pub use contracts::{
    AgentResponse, ClarifyRequest, CutSpec, FilterExpr, IntentType, MetricType, Question,
    QuestionType, SegmentSpec, UserIntent,
};
pub use engine::{ExecutionResult, Executor, ResponseTable, ResultTable};
pub use gateway::{GatewayError, OpenRouterAdapter, StructuredProvider};
