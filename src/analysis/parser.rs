//! Free-text response mining.
//!
//! The specialist models reply in prose. These functions pull structured
//! signals out of that prose with label-anchored patterns. This is a
//! best-effort text-mining step: false negatives are an accepted cost,
//! and a miss is a normal outcome, never an error.

use crate::models::Priority;
use regex::Regex;
use std::sync::LazyLock;

/// Placeholder returned when a reply contains no advisory sentences.
pub const NO_COMMENTS_PLACEHOLDER: &str = "No specific comments";

/// Advisory-language sentences: a trigger word followed by text up to the
/// next comma or period.
static ADVISORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(recommend|suggest|advis(e|ing)|should)\s[^.,]*[.,]")
        .expect("advisory pattern is valid")
});

static PRIORITY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)priority.*?:\s*(Routine|Urgent|Cancer|Two Week Wait)")
        .expect("priority pattern is valid")
});

static REASONING_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)reasoning.*?:\s*([^\n]*)").expect("reasoning pattern is valid"));

static RISK_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)risk.*?:\s*([^\n]*)").expect("risk pattern is valid"));

static ACTION_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)action.*?:\s*([^\n]*)").expect("action pattern is valid"));

/// Extract advisory sentences from a health-analysis reply, trimmed, in
/// order of first appearance.
///
/// Never returns an empty sequence: a reply without trigger words yields
/// the single [`NO_COMMENTS_PLACEHOLDER`] entry.
pub fn extract_comments(text: &str) -> Vec<String> {
    let comments: Vec<String> = ADVISORY
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .collect();

    if comments.is_empty() {
        vec![NO_COMMENTS_PLACEHOLDER.to_string()]
    } else {
        comments
    }
}

/// Fields mined from a waiting-list assessment reply.
///
/// A field whose label never appears stays `None`, so the reducer can
/// distinguish "not provided" from "empty string".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedAssessment {
    pub priority: Option<Priority>,
    pub reasoning: Option<String>,
    pub risk: Option<String>,
    pub action: Option<String>,
}

/// Extract the four labeled fields from a waiting-list assessment reply.
/// Each label is matched independently and captures to the end of line.
pub fn extract_assessment(text: &str) -> ParsedAssessment {
    ParsedAssessment {
        priority: capture(&PRIORITY_LABEL, text).and_then(|s| s.parse().ok()),
        reasoning: capture(&REASONING_LABEL, text),
        risk: capture(&RISK_LABEL, text),
        action: capture(&ACTION_LABEL, text),
    }
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_advisory_sentences_in_order() {
        let text = "Your resting rate is stable. I recommend more cardio exercise, \
                    and you should monitor evening readings. Data looks otherwise fine.";

        let comments = extract_comments(text);
        assert_eq!(comments.len(), 2);
        assert!(comments[0].starts_with("recommend more cardio"));
        assert!(comments[1].starts_with("should monitor evening"));
    }

    #[test]
    fn test_advisory_triggers_are_case_insensitive() {
        let comments = extract_comments("We Suggest shorter screen time before bed.");
        assert_eq!(comments, vec!["Suggest shorter screen time before bed."]);
    }

    #[test]
    fn test_advising_variant_matches() {
        let comments = extract_comments("Advising a follow-up reading next week.");
        assert_eq!(comments.len(), 1);
        assert!(comments[0].starts_with("Advising a follow-up"));
    }

    #[test]
    fn test_no_trigger_words_yields_placeholder() {
        let comments = extract_comments("All metrics are within normal ranges.");
        assert_eq!(comments, vec![NO_COMMENTS_PLACEHOLDER.to_string()]);
    }

    #[test]
    fn test_empty_text_yields_placeholder_not_empty_sequence() {
        let comments = extract_comments("");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0], NO_COMMENTS_PLACEHOLDER);
    }

    #[test]
    fn test_assessment_fields_extracted() {
        let parsed = extract_assessment("Priority: Urgent\nReasoning: improving slowly\n");
        assert_eq!(parsed.priority, Some(Priority::Urgent));
        assert_eq!(parsed.reasoning.as_deref(), Some("improving slowly"));
        assert_eq!(parsed.risk, None);
        assert_eq!(parsed.action, None);
    }

    #[test]
    fn test_assessment_full_reply() {
        let text = "1. Recommended priority level: Two Week Wait\n\
                    2. Reasoning: wait exceeds the specialty target\n\
                    3. Risk assessment: High likelihood of deterioration\n\
                    4. Required action: expedite booking\n";

        let parsed = extract_assessment(text);
        assert_eq!(parsed.priority, Some(Priority::TwoWeekWait));
        assert_eq!(
            parsed.reasoning.as_deref(),
            Some("wait exceeds the specialty target")
        );
        assert_eq!(
            parsed.risk.as_deref(),
            Some("High likelihood of deterioration")
        );
        assert_eq!(parsed.action.as_deref(), Some("expedite booking"));
    }

    #[test]
    fn test_risk_label_skips_prose_mentions_without_colon() {
        let text = "Reasoning: high risk of deterioration here\nRisk: Medium\n";
        let parsed = extract_assessment(text);
        assert_eq!(parsed.risk.as_deref(), Some("Medium"));
    }

    #[test]
    fn test_unlabeled_priority_value_is_absent() {
        let parsed = extract_assessment("The patient seems urgent to me.");
        assert_eq!(parsed.priority, None);
    }

    #[test]
    fn test_trailing_empty_label_is_empty_string_not_absent() {
        let parsed = extract_assessment("Nothing to flag here.\nAction:");
        assert_eq!(parsed.action.as_deref(), Some(""));
    }

    #[test]
    fn test_label_value_on_next_line_is_still_captured() {
        // Whitespace after the colon spans the line break, so a value on
        // its own line still belongs to the label.
        let parsed = extract_assessment("Action:\nrebook within two weeks");
        assert_eq!(parsed.action.as_deref(), Some("rebook within two weeks"));
    }

    #[test]
    fn test_arbitrary_garbage_never_panics() {
        for text in ["{{{{", "priority priority priority", "::::\n\n::", "\u{0}\u{1}"] {
            let _ = extract_assessment(text);
            let _ = extract_comments(text);
        }
    }
}
