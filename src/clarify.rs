//! Ambiguity detection and the pending-selection state machine.
//!
//! Ambiguity is tested *before* intent classification: an input that could
//! plausibly target several questions, or that collides with the "plan"
//! command verb, earns a numbered clarification prompt instead of a guess.
//! The pending option list is single-slot session state: a new trigger
//! replaces any prior set, and any follow-up other than a valid numeric
//! selection clears it.

use serde_json::Value;

use crate::contracts::{ClarifyRequest, DisambiguationOption, IntentType, Question};
use crate::tools::intent::tokens;

/// Cap on offered options.
const MAX_OPTIONS: usize = 5;

/// Tokens with no targeting power: analysis verbs, articles, generic nouns.
/// Removing them isolates the content token a vague request is aiming at.
const FILLER_TOKENS: &[&str] = &[
    "analyze", "analyse", "show", "display", "break", "down", "breakdown", "run",
    "create", "build", "do", "give", "make", "see", "get", "want", "need",
    "cut", "cuts", "analysis", "distribution", "results", "stats",
    "a", "an", "the", "me", "my", "we", "us", "of", "for", "to", "about", "on",
    "in", "at", "with", "by", "is", "it", "this", "that", "please", "and", "or",
];

fn content_tokens(input_tokens: &[String]) -> Vec<&String> {
    input_tokens
        .iter()
        .filter(|t| !FILLER_TOKENS.contains(&t.as_str()))
        .collect()
}

fn matching_questions<'a>(token: &str, questions: &'a [Question]) -> Vec<&'a Question> {
    questions
        .iter()
        .filter(|q| {
            token == q.question_id.to_lowercase() || q.label.to_lowercase().contains(token)
        })
        .collect()
}

fn analyze_option(q: &Question) -> DisambiguationOption {
    let mut params = serde_json::Map::new();
    params.insert(
        "question_id".to_string(),
        Value::String(q.question_id.clone()),
    );
    DisambiguationOption {
        option_id: format!("opt_cut_{}", q.question_id),
        label: format!("Analyze {}", q.display_label()),
        action_type: IntentType::CutAnalysis,
        action_params: params,
    }
}

/// Test an incoming message for ambiguity and build the clarification prompt.
///
/// Two triggers:
/// - a lone content token that matches more than one question id/label;
/// - a short input whose tokens include "plan" while the catalog also has a
///   plan-flavored question (command name vs data field collision).
pub fn detect_ambiguity(input: &str, questions: &[Question]) -> Option<ClarifyRequest> {
    let input_tokens = tokens(input);
    if input_tokens.is_empty() {
        return None;
    }

    // Longer inputs mentioning "plan" ("create an analysis plan") are clear
    // enough; the collision only bites on terse ones like "plan" or
    // "analyse plan".
    let plan_collision = input_tokens.len() <= 2
        && input_tokens.iter().any(|t| t == "plan")
        && questions.iter().any(|q| {
            q.question_id.eq_ignore_ascii_case("q_plan") || q.label.to_lowercase().contains("plan")
        });

    let content = content_tokens(&input_tokens);
    let matches = match content.as_slice() {
        [only] => matching_questions(only.as_str(), questions),
        _ => Vec::new(),
    };

    if matches.len() <= 1 && !plan_collision {
        return None;
    }

    let mut options: Vec<DisambiguationOption> = Vec::new();

    if plan_collision {
        options.push(DisambiguationOption {
            option_id: "opt_high_level_plan".to_string(),
            label: "Create analysis plan".to_string(),
            action_type: IntentType::HighLevelPlan,
            action_params: serde_json::Map::new(),
        });
        if let Some(q_plan) = questions
            .iter()
            .find(|q| q.question_id.eq_ignore_ascii_case("q_plan"))
        {
            options.push(analyze_option(q_plan));
        }
    }

    for q in matches.iter().take(MAX_OPTIONS) {
        options.push(analyze_option(q));
    }

    // Dedup by option id, preserving first occurrence order.
    let mut seen = std::collections::HashSet::new();
    options.retain(|o| seen.insert(o.option_id.clone()));
    options.truncate(MAX_OPTIONS);

    if options.is_empty() {
        return None;
    }

    Some(ClarifyRequest {
        question: "I am not sure what you meant. Which of these did you want?".to_string(),
        options,
    })
}

/// Resolve a follow-up against the pending option list.
///
/// Returns the chosen option for a pure integer in `[1, len]`. Anything else
/// (out-of-range number, free text) returns `None`: the caller must clear the
/// pending set and process the message as a fresh turn.
pub fn resolve_selection(
    input: &str,
    options: &[DisambiguationOption],
) -> Option<DisambiguationOption> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let index: usize = trimmed.parse().ok()?;
    if (1..=options.len()).contains(&index) {
        Some(options[index - 1].clone())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::QuestionType;

    fn catalog() -> Vec<Question> {
        [
            ("Q_PLAN", "Subscription Plan", QuestionType::SingleChoice),
            ("Q_OVERALL_SAT", "Overall Satisfaction", QuestionType::Likert1To5),
            ("Q_SUPPORT_SAT", "Support Satisfaction", QuestionType::Likert1To5),
            ("Q_REGION", "Region", QuestionType::SingleChoice),
            ("Q_NPS", "Net Promoter Score", QuestionType::Nps0To10),
        ]
        .into_iter()
        .map(|(id, label, qtype)| Question {
            question_id: id.into(),
            label: label.into(),
            qtype,
            options: Vec::new(),
        })
        .collect()
    }

    #[test]
    fn lone_token_matching_many_questions_is_ambiguous() {
        let clarify = detect_ambiguity("satisfaction", &catalog()).unwrap();
        let labels: Vec<&str> = clarify.options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Analyze Overall Satisfaction (Q_OVERALL_SAT)",
                "Analyze Support Satisfaction (Q_SUPPORT_SAT)",
            ]
        );
    }

    #[test]
    fn verb_prefixed_ambiguous_token_still_triggers() {
        assert!(detect_ambiguity("analyze satisfaction", &catalog()).is_some());
        assert!(detect_ambiguity("create a cut about satisfaction", &catalog()).is_some());
    }

    #[test]
    fn unique_reference_is_not_ambiguous() {
        assert!(detect_ambiguity("region", &catalog()).is_none());
        assert!(detect_ambiguity("analyze Q_NPS", &catalog()).is_none());
    }

    #[test]
    fn plan_collision_offers_plan_first_then_question() {
        let clarify = detect_ambiguity("plan", &catalog()).unwrap();
        assert_eq!(clarify.options[0].option_id, "opt_high_level_plan");
        assert_eq!(clarify.options[1].option_id, "opt_cut_Q_PLAN");
    }

    #[test]
    fn long_plan_requests_do_not_collide() {
        assert!(detect_ambiguity("create an analysis plan", &catalog()).is_none());
        assert!(detect_ambiguity("plan the analysis", &catalog()).is_none());
    }

    #[test]
    fn multi_reference_requests_are_left_to_the_classifier() {
        assert!(detect_ambiguity("analyze Q_NPS by Q_REGION", &catalog()).is_none());
    }

    #[test]
    fn selection_resolves_only_in_range_integers() {
        let options = detect_ambiguity("satisfaction", &catalog()).unwrap().options;
        assert_eq!(
            resolve_selection("1", &options).unwrap().option_id,
            "opt_cut_Q_OVERALL_SAT"
        );
        assert_eq!(
            resolve_selection(" 2 ", &options).unwrap().option_id,
            "opt_cut_Q_SUPPORT_SAT"
        );
        assert!(resolve_selection("0", &options).is_none());
        assert!(resolve_selection("9", &options).is_none());
        assert!(resolve_selection("first", &options).is_none());
        assert!(resolve_selection("1.5", &options).is_none());
    }
}
