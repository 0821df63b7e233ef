//! Typed layer over the raw structured-completion provider.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use super::error::GatewayError;
use super::openrouter::StructuredProvider;
use super::types::{CallTrace, StructuredRequest};

/// Derive the JSON schema document for a contract type. Subschemas stay as
/// `definitions` references; filter trees are recursive, so they cannot be
/// inlined.
pub fn schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::gen::SchemaGenerator::default().into_root_schema_for::<T>();
    serde_json::to_value(schema).unwrap_or_default()
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Request one completion conforming to `T`'s schema and decode it.
///
/// At most one provider call is made per invocation; no retries. A
/// reply that parses as JSON but fails to decode into `T` (for example a
/// metric type outside the closed enum) surfaces as [`GatewayError::Schema`],
/// never as a silently coerced value.
pub async fn structured_complete<T>(
    provider: &dyn StructuredProvider,
    system: &str,
    user: &str,
) -> Result<(T, CallTrace), GatewayError>
where
    T: DeserializeOwned + JsonSchema,
{
    let req = StructuredRequest::new(short_type_name::<T>(), schema_for::<T>(), system, user);
    let reply = provider.complete(req).await?;
    let instance: T = serde_json::from_value(reply.value)
        .map_err(|e| GatewayError::schema(e.to_string()))?;
    Ok((instance, reply.trace))
}
