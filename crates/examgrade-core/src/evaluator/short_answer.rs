//! Short free-text answers.

use serde_json::Value;

use super::Scored;
use crate::answer::{answer_text, normalize_text};
use crate::definition::ShortAnswerDefinition;
use crate::policy::ShortAnswerMatchPolicy;

pub(crate) fn score_short_answer(
    def: &ShortAnswerDefinition,
    answer: &Value,
    marks: f64,
    policy: ShortAnswerMatchPolicy,
) -> Scored {
    let raw = answer_text(answer);
    let text = raw.as_deref().map(normalize_text).unwrap_or_default();

    let is_correct = !text.is_empty() && matches(&text, &def.accepted_answers, policy);
    let student_answer = raw.map(Value::String).unwrap_or(Value::Null);
    Scored::new(is_correct, marks, student_answer, def.accepted_answers.clone())
}

/// Accepted answers are stored normalized.
fn matches(text: &str, accepted: &[String], policy: ShortAnswerMatchPolicy) -> bool {
    match policy {
        ShortAnswerMatchPolicy::Exact => accepted.iter().any(|a| a == text),
        ShortAnswerMatchPolicy::Contains => accepted.iter().any(|a| text.contains(a.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paris() -> ShortAnswerDefinition {
        ShortAnswerDefinition {
            accepted_answers: vec!["paris".into()],
        }
    }

    #[test]
    fn case_and_whitespace_insensitive() {
        let def = paris();
        let padded = score_short_answer(&def, &json!(" Paris "), 2.0, ShortAnswerMatchPolicy::Exact);
        let plain = score_short_answer(&def, &json!("paris"), 2.0, ShortAnswerMatchPolicy::Exact);
        assert!(padded.is_correct);
        assert!(plain.is_correct);
        assert_eq!(padded.points_earned, plain.points_earned);
    }

    #[test]
    fn exact_policy_rejects_surrounding_text() {
        let scored = score_short_answer(
            &paris(),
            &json!("It is Paris"),
            2.0,
            ShortAnswerMatchPolicy::Exact,
        );
        assert!(!scored.is_correct);
        assert_eq!(scored.points_earned, 0.0);
    }

    #[test]
    fn contains_policy_accepts_surrounding_text() {
        let scored = score_short_answer(
            &paris(),
            &json!("It is Paris"),
            2.0,
            ShortAnswerMatchPolicy::Contains,
        );
        assert!(scored.is_correct);
        assert_eq!(scored.points_earned, 2.0);
    }

    #[test]
    fn blank_or_missing_answer_scores_zero() {
        for answer in [json!("   "), Value::Null, json!(["paris"])] {
            let scored = score_short_answer(&paris(), &answer, 2.0, ShortAnswerMatchPolicy::Contains);
            assert!(!scored.is_correct, "{answer} should not match");
        }
    }

    #[test]
    fn any_accepted_answer_matches() {
        let def = ShortAnswerDefinition {
            accepted_answers: vec!["h2o".into(), "water".into()],
        };
        let scored = score_short_answer(&def, &json!("WATER"), 1.0, ShortAnswerMatchPolicy::Exact);
        assert!(scored.is_correct);
    }
}
