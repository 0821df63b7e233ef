mod common;

use serde_json::json;

use common::{demo_agent, StubProvider};
use crosstab_agent::agent::Agent;
use crosstab_agent::contracts::IntentType;

fn happy_provider() -> StubProvider {
    StubProvider::new()
        .chat("stub chat")
        .value(
            "HighLevelPlan",
            json!({
                "intents": [
                    {"intent_id": "intent_001", "description": "NPS by region", "segments_needed": [], "priority": 1},
                    {"intent_id": "intent_002", "description": "Satisfaction by plan", "segments_needed": [], "priority": 2}
                ],
                "rationale": "Stub rationale",
                "suggested_segments": []
            }),
        )
        .on("SegmentSpec", |user| {
            let name = if user.to_lowercase().contains("v2") {
                "Promoters v2"
            } else {
                "Promoters"
            };
            json!({
                "segment_id": "seg_promoters",
                "name": name,
                "definition": {"kind": "gte", "question_id": "Q_NPS", "value": 9},
                "intended_partition": false,
                "notes": null
            })
        })
        .on("CutPlanOutcome", |user| {
            let cut = if user.to_lowercase().contains("by segment") {
                json!({
                    "cut_id": "cut_nps_by_promoters",
                    "metric": {"type": "mean", "question_id": "Q_OVERALL_SAT", "params": {}},
                    "dimensions": [{"kind": "segment", "id": "seg_promoters"}],
                    "filter": null
                })
            } else {
                json!({
                    "cut_id": "cut_nps_by_region",
                    "metric": {"type": "nps", "question_id": "Q_NPS", "params": {}},
                    "dimensions": [{"kind": "question", "id": "Q_REGION"}],
                    "filter": null
                })
            };
            json!({"ok": true, "cut": cut, "resolution_map": {}, "ambiguity_options": []})
        })
}

#[tokio::test]
async fn chat_happy_path() {
    let mut agent = demo_agent(happy_provider());

    let resp = agent.handle_message("hello").await;
    assert!(resp.success);
    assert_eq!(resp.intent.intent_type, IntentType::Chat);
    assert_eq!(resp.message.as_deref(), Some("stub chat"));
}

#[tokio::test]
async fn plan_happy_path() {
    let mut agent = demo_agent(happy_provider());

    let resp = agent.handle_message("create an analysis plan").await;
    assert!(resp.success);
    assert_eq!(resp.intent.intent_type, IntentType::HighLevelPlan);
    let message = resp.message.unwrap();
    assert!(message.starts_with("Analysis plan:"));
    assert!(message.contains("1. NPS by region (priority 1)"));
    assert!(message.contains("2. Satisfaction by plan (priority 2)"));
}

#[tokio::test]
async fn segment_then_cut_happy_path() {
    let mut agent = demo_agent(happy_provider());

    let seg_resp = agent.handle_message("define a segment for promoters").await;
    assert!(seg_resp.success);
    assert_eq!(seg_resp.intent.intent_type, IntentType::SegmentDefinition);
    assert_eq!(
        seg_resp.message.as_deref(),
        Some("Created segment Promoters (seg_promoters)")
    );
    assert_eq!(agent.segments().len(), 1);

    let cut_resp = agent.handle_message("analyze Q_NPS by Q_REGION").await;
    assert!(cut_resp.success);
    assert_eq!(cut_resp.intent.intent_type, IntentType::CutAnalysis);
    let message = cut_resp.message.unwrap();
    assert!(message.contains("CutSpec:"));
    assert!(message.contains("- metric: nps on Net Promoter Score (Q_NPS)"));
    assert!(message.contains("- dimensions: Region (Q_REGION)"));
    assert!(message.contains("Base N: 24"));
    // Tabular preview follows the header block.
    assert!(message.contains("Region"));
    assert!(message.contains("nps"));
    assert_eq!(agent.executions(), 1);
}

#[tokio::test]
async fn redefining_a_segment_replaces_it_in_place() {
    let mut agent = demo_agent(happy_provider());

    agent.handle_message("define a segment for promoters").await;
    agent
        .handle_message("define a segment for promoters v2")
        .await;

    assert_eq!(agent.segments().len(), 1);
    assert_eq!(agent.segment("seg_promoters").unwrap().name, "Promoters v2");
}

#[tokio::test]
async fn segment_dimension_groups_in_and_out() {
    let mut agent = demo_agent(happy_provider());

    agent.handle_message("define a segment for promoters").await;
    let resp = agent.handle_message("analyze Q_OVERALL_SAT by segment").await;
    assert!(resp.success);
    let message = resp.message.unwrap();
    assert!(message.contains("- dimensions: Promoters (seg_promoters)"));
    assert!(message.contains("Base N: 24"));
    assert!(message.contains("\nin "));
    assert!(message.contains("\nout"));
}

#[tokio::test]
async fn executing_the_same_cut_twice_is_deterministic() {
    let mut agent = demo_agent(happy_provider());

    let first = agent.handle_message("analyze Q_NPS by Q_REGION").await;
    let second = agent.handle_message("analyze Q_NPS by Q_REGION").await;
    assert_eq!(first.message, second.message);
    assert_eq!(agent.executions(), 2);
}

#[tokio::test]
async fn empty_input_is_a_missing_input_failure() {
    let mut agent: Agent = demo_agent(happy_provider());

    let resp = agent.handle_message("   ").await;
    assert!(!resp.success);
    assert!(resp.message.is_some());
    assert_eq!(resp.errors, vec!["No user input provided".to_string()]);
}
