use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crosstab_agent::contracts::ChatReply;
use crosstab_agent::gateway::{
    structured_complete, OpenRouterAdapter, StructuredProvider, StructuredRequest,
};

fn adapter(server: &MockServer) -> OpenRouterAdapter {
    OpenRouterAdapter::with_config(
        "sk-test",
        server.uri(),
        "openai/gpt-5-mini",
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn parses_structured_content_and_usage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "model": "openai/gpt-5-mini",
            "response_format": { "type": "json_schema" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "content": "{\"message\": \"hello there\", \"suggested_actions\": []}" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 20 }
        })))
        .mount(&server)
        .await;

    let adapter = adapter(&server);
    let (reply, trace) = structured_complete::<ChatReply>(&adapter, "sys", "user")
        .await
        .unwrap();

    assert_eq!(reply.message, "hello there");
    assert!(reply.suggested_actions.is_empty());
    assert_eq!(trace.model, "openai/gpt-5-mini");
    assert_eq!(trace.prompt_tokens, 10);
    assert_eq!(trace.completion_tokens, 20);
    assert_eq!(trace.finish_reason.as_deref(), Some("stop"));
}

#[tokio::test]
async fn falls_back_to_tool_call_arguments_when_content_empty() {
    let server = MockServer::start().await;
    let args = r#"{"message": "from tool call", "suggested_actions": []}"#;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "content": "",
                    "tool_calls": [{"function": {"arguments": args}}]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": { "prompt_tokens": 1, "completion_tokens": 1 }
        })))
        .mount(&server)
        .await;

    let adapter = adapter(&server);
    let (reply, _trace) = structured_complete::<ChatReply>(&adapter, "sys", "user")
        .await
        .unwrap();
    assert_eq!(reply.message, "from tool call");
}

#[tokio::test]
async fn api_error_body_maps_to_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "message": "invalid api key", "code": "invalid_api_key" }
        })))
        .mount(&server)
        .await;

    let adapter = adapter(&server);
    let err = structured_complete::<ChatReply>(&adapter, "sys", "user")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "provider_error");
    assert_eq!(
        err.context().and_then(|c| c.provider_code.as_deref()),
        Some("invalid_api_key")
    );
}

#[tokio::test]
async fn non_conforming_reply_is_a_schema_violation() {
    let server = MockServer::start().await;

    // Valid JSON, wrong shape: `message` is required on ChatReply.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "content": "{\"msg\": \"oops\"}" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 1, "completion_tokens": 1 }
        })))
        .mount(&server)
        .await;

    let adapter = adapter(&server);
    let err = structured_complete::<ChatReply>(&adapter, "sys", "user")
        .await
        .unwrap_err();
    assert!(err.is_schema_violation());
}

#[tokio::test]
async fn non_json_reply_is_a_schema_violation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "content": "I'd rather chat in prose." },
                "finish_reason": "stop"
            }]
        })))
        .mount(&server)
        .await;

    let adapter = adapter(&server);
    let err = structured_complete::<ChatReply>(&adapter, "sys", "user")
        .await
        .unwrap_err();
    assert!(err.is_schema_violation());
}

#[tokio::test]
async fn oversized_input_is_rejected_before_any_http_call() {
    let server = MockServer::start().await;
    let adapter = adapter(&server);

    let huge = "x".repeat(600_000);
    let req = StructuredRequest::new("ChatReply", json!({}), huge, "user");
    let err = adapter.complete(req).await.unwrap_err();
    assert_eq!(err.code(), "invalid_request");
}
