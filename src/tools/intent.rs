//! Deterministic intent classification.
//!
//! A layered rule cascade over the lower-cased, trimmed input: each tier is a
//! data-driven pattern table evaluated in order, first match wins, ties within
//! a tier resolved by table order. Pure function of (prompt, catalog): no
//! randomness, no external calls.

use crate::contracts::{IntentType, Question, UserIntent};

// =============================================================================
// PATTERN TABLES
// =============================================================================

/// Tier 1: explicit analysis-planning phrases.
const PLAN_PHRASES: &[&str] = &[
    "create an analysis plan",
    "create analysis plan",
    "analysis plan",
    "plan the analysis",
    "plan our analysis",
    "plan an analysis",
    "what should we analyze",
    "what should we analyse",
    "what should we look at",
    "suggest a plan",
    "propose a plan",
    "give me a roadmap",
    "roadmap",
];

/// Verbs that signal a tabulation request.
const ANALYSIS_VERBS: &[&str] = &[
    "analyze",
    "analyse",
    "break down",
    "breakdown",
    "show",
    "display",
    "distribution",
    "average",
    "mean",
    "frequency",
    "compare",
    "tabulate",
];

/// Nouns that signal segment vocabulary (tier 2 collision check).
const SEGMENT_NOUNS: &[&str] = &["segment", "cohort", "audience"];

/// Tier 3: explicit segment-creation patterns with per-pattern confidence.
const SEGMENT_PATTERNS: &[(&str, f64)] = &[
    ("define segment", 0.95),
    ("define a segment", 0.95),
    ("define an audience", 0.95),
    ("create segment", 0.95),
    ("create a segment", 0.95),
    ("create a cohort", 0.95),
    ("create cohort", 0.95),
    ("create an audience", 0.95),
    ("build a segment", 0.95),
    ("build segment", 0.95),
    ("build a cohort", 0.95),
    ("build an audience", 0.95),
    ("new segment", 0.9),
    ("users who are", 0.9),
    ("customers who are", 0.9),
    ("respondents who", 0.9),
    ("people who", 0.9),
    ("users aged", 0.9),
    ("customers aged", 0.9),
    ("respondents aged", 0.9),
    ("filter to", 0.9),
    ("segment of", 0.9),
    ("cohort of", 0.9),
    ("cohort for", 0.9),
    ("audience of", 0.9),
];

/// Tier 4: conversational inputs matched against the whole trimmed text.
const CHAT_EXACT: &[&str] = &[
    "hello", "hi", "hey", "help", "thanks", "thank you", "ok", "okay", "yes", "no",
];

/// Tier 4: conversational substrings. Runs before the question-reference
/// tier so casual uses of domain words are not misrouted.
const CHAT_SUBSTRINGS: &[&str] = &[
    "what can you do",
    "what do you do",
    "how does this work",
    "how do i",
    "what is a",
    "what's a",
    "who are you",
    "thanks",
    "thank you",
    "good morning",
    "good afternoon",
    "pricing plan",
];

/// Tokens ignored when looking for question-label overlap.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "where", "what", "that", "this", "from", "are", "was",
    "can", "you", "our", "your", "per", "by", "of", "a", "an", "me", "my", "we", "is",
    "in", "on", "to", "it", "at", "as", "or", "do", "did", "does", "about", "please",
];

// =============================================================================
// CLASSIFIER
// =============================================================================

/// Lower-cased word tokens of `text`, split on anything non-alphanumeric.
pub(crate) fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn first_match<'a>(haystack: &str, patterns: &[&'a str]) -> Option<&'a str> {
    patterns.iter().copied().find(|p| haystack.contains(p))
}

fn has_analysis_verb(text: &str) -> bool {
    ANALYSIS_VERBS.iter().any(|v| text.contains(v))
}

/// First question whose id or label appears in the text. Ids and single-word
/// labels must match a whole token ("Age" should not fire inside "average");
/// multi-word labels match as a substring.
fn question_reference<'a>(
    text: &str,
    text_tokens: &[String],
    questions: &'a [Question],
) -> Option<&'a Question> {
    questions.iter().find(|q| {
        let id = q.question_id.to_lowercase();
        if text_tokens.iter().any(|t| *t == id) {
            return true;
        }
        let label = q.label.to_lowercase();
        let label_tokens = tokens(&label);
        match label_tokens.len() {
            0 => false,
            1 => text_tokens.contains(&label_tokens[0]),
            _ => text.contains(&label),
        }
    })
}

/// Whether any content token of the text appears in a question label.
fn label_token_overlap(text_tokens: &[String], questions: &[Question]) -> bool {
    let content: Vec<&String> = text_tokens
        .iter()
        .filter(|t| t.len() >= 3 && !STOPWORDS.contains(&t.as_str()))
        .collect();
    questions.iter().any(|q| {
        let label_tokens = tokens(&q.label);
        content.iter().any(|t| label_tokens.contains(t))
    })
}

/// Classify free text into one of the routing intents.
pub fn classify(prompt: &str, questions: &[Question]) -> UserIntent {
    let text = prompt.trim().to_lowercase();
    let text_tokens = tokens(&text);

    // Tier 1: explicit planning phrases.
    if let Some(p) = first_match(&text, PLAN_PHRASES) {
        return UserIntent::new(
            IntentType::HighLevelPlan,
            0.95,
            format!("matched analysis-plan phrase '{p}'"),
        );
    }

    // Tier 2: multi-intent override. "analyze satisfaction and segment by
    // region" should execute a cut, not merely define a segment.
    if has_analysis_verb(&text) && SEGMENT_NOUNS.iter().any(|n| text.contains(n)) {
        return UserIntent::new(
            IntentType::CutAnalysis,
            0.9,
            "analysis verb alongside segment noun; analysis verb wins",
        );
    }

    // Tier 3: explicit segment creation.
    if let Some((p, confidence)) = SEGMENT_PATTERNS.iter().find(|(p, _)| text.contains(p)) {
        return UserIntent::new(
            IntentType::SegmentDefinition,
            *confidence,
            format!("matched segment pattern '{p}'"),
        );
    }

    // Tier 4: conversational input.
    let bare = text.trim_end_matches(['.', '!', '?', ',']);
    if CHAT_EXACT.contains(&bare) {
        return UserIntent::new(IntentType::Chat, 0.9, format!("conversational input '{bare}'"));
    }
    if let Some(p) = first_match(&text, CHAT_SUBSTRINGS) {
        return UserIntent::new(
            IntentType::Chat,
            0.9,
            format!("matched conversational pattern '{p}'"),
        );
    }

    // Tier 5: cut-analysis signals, strongest first.
    let verb = has_analysis_verb(&text);
    let reference = question_reference(&text, &text_tokens, questions);
    match (reference, verb) {
        (Some(q), true) => {
            return UserIntent::new(
                IntentType::CutAnalysis,
                0.95,
                format!("question reference '{}' with analysis verb", q.question_id),
            );
        }
        (Some(q), false) => {
            return UserIntent::new(
                IntentType::CutAnalysis,
                0.85,
                format!("bare question reference '{}'", q.question_id),
            );
        }
        (None, _) => {}
    }
    if verb && text_tokens.iter().any(|t| t == "by") {
        return UserIntent::new(
            IntentType::CutAnalysis,
            0.8,
            "dimensional breakdown: 'by' with analysis verb",
        );
    }
    if verb && label_token_overlap(&text_tokens, questions) {
        return UserIntent::new(
            IntentType::CutAnalysis,
            0.75,
            "analysis verb with question-label overlap",
        );
    }

    // Tier 6: nothing matched.
    UserIntent::new(IntentType::Chat, 0.5, "no clear pattern")
}
