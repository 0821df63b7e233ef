//! Gateway to the structured-completion collaborator.
//!
//! One call per tool invocation, no implicit retries: a failed call is a
//! single opaque tool error, whatever the root cause. The `trace` carried on
//! each reply is diagnostic metadata and never reaches end-user text.

pub mod error;
pub mod openrouter;
pub mod structured;
pub mod types;

pub use error::{ErrorContext, GatewayError};
pub use openrouter::{OpenRouterAdapter, StructuredProvider};
pub use structured::{schema_for, structured_complete};
pub use types::{CallTrace, Message, Role, StructuredReply, StructuredRequest};
