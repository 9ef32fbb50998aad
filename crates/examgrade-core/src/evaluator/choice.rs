//! Single- and multiple-choice scoring.

use std::collections::BTreeSet;

use serde_json::Value;

use super::Scored;
use crate::answer::{normalize_choice, normalize_selections};
use crate::definition::{MultipleChoiceDefinition, SingleChoiceDefinition};

/// All or nothing: the selected option id must equal the correct one.
pub(crate) fn score_single_choice(
    def: &SingleChoiceDefinition,
    answer: &Value,
    marks: f64,
) -> Scored {
    let selected = normalize_choice(answer);

    let Some(correct) = &def.correct_answer else {
        tracing::debug!("single-choice question has no correct option; scoring 0");
        return Scored::new(false, marks, to_value(selected), Vec::new());
    };

    let is_correct = selected.as_deref() == Some(correct.as_str());
    Scored::new(is_correct, marks, to_value(selected), vec![correct.clone()])
}

/// Exact set match between the selected and the correct option ids.
/// Selection order and repeated ids do not matter; there is no partial credit.
pub(crate) fn score_multiple_choice(
    def: &MultipleChoiceDefinition,
    answer: &Value,
    marks: f64,
) -> Scored {
    let selected: BTreeSet<String> = normalize_selections(answer).into_iter().collect();
    let correct: Vec<String> = def.correct_answers.iter().cloned().collect();

    if def.correct_answers.is_empty() {
        tracing::debug!("multiple-choice question has no correct options; scoring 0");
    }

    let is_correct = !def.correct_answers.is_empty() && selected == def.correct_answers;
    let student_answer = Value::Array(selected.into_iter().map(Value::String).collect());
    Scored::new(is_correct, marks, student_answer, correct)
}

fn to_value(selected: Option<String>) -> Value {
    selected.map(Value::String).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ChoiceOption;
    use serde_json::json;

    fn options() -> Vec<ChoiceOption> {
        ["A", "B", "C"]
            .iter()
            .enumerate()
            .map(|(i, text)| ChoiceOption {
                id: format!("opt{}", i + 1),
                text: text.to_string(),
                is_correct: i == 1,
            })
            .collect()
    }

    fn single(correct: Option<&str>) -> SingleChoiceDefinition {
        SingleChoiceDefinition {
            options: options(),
            correct_answer: correct.map(str::to_string),
        }
    }

    fn multiple(correct: &[&str]) -> MultipleChoiceDefinition {
        MultipleChoiceDefinition {
            options: options(),
            correct_answers: correct.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn single_choice_full_or_nothing() {
        let def = single(Some("opt2"));
        let right = score_single_choice(&def, &json!("opt2"), 5.0);
        assert!(right.is_correct);
        assert_eq!(right.points_earned, 5.0);

        let wrong = score_single_choice(&def, &json!("opt3"), 5.0);
        assert!(!wrong.is_correct);
        assert_eq!(wrong.points_earned, 0.0);
    }

    #[test]
    fn legacy_index_scores_like_option_id() {
        let def = single(Some("opt1"));
        let by_index = score_single_choice(&def, &json!(0), 3.0);
        let by_id = score_single_choice(&def, &json!("opt1"), 3.0);
        assert_eq!(by_index, by_id);
        assert_eq!(by_index.points_earned, 3.0);
    }

    #[test]
    fn single_choice_without_correct_option_scores_zero() {
        let def = single(None);
        let scored = score_single_choice(&def, &json!("opt2"), 5.0);
        assert!(!scored.is_correct);
        assert_eq!(scored.points_earned, 0.0);
        assert!(scored.correct_answers.is_empty());
    }

    #[test]
    fn multiple_choice_example_scenario() {
        let def = multiple(&["opt1", "opt3"]);
        let right = score_multiple_choice(&def, &json!(["opt3", "opt1"]), 4.0);
        assert!(right.is_correct);
        assert_eq!(right.points_earned, 4.0);

        let partial = score_multiple_choice(&def, &json!(["opt1"]), 4.0);
        assert!(!partial.is_correct);
        assert_eq!(partial.points_earned, 0.0);
    }

    #[test]
    fn multiple_choice_is_order_invariant() {
        let def = multiple(&["opt1", "opt2"]);
        let a = score_multiple_choice(&def, &json!(["opt1", "opt2"]), 2.0);
        let b = score_multiple_choice(&def, &json!(["opt2", "opt1"]), 2.0);
        assert_eq!(a, b);
    }

    #[test]
    fn multiple_choice_rejects_extra_selections() {
        let def = multiple(&["opt1", "opt2"]);
        let scored = score_multiple_choice(&def, &json!(["opt1", "opt2", "opt3"]), 2.0);
        assert!(!scored.is_correct);
    }

    #[test]
    fn multiple_choice_wraps_scalar_and_normalizes_indices() {
        let def = multiple(&["opt1"]);
        assert!(score_multiple_choice(&def, &json!("opt1"), 1.0).is_correct);
        assert!(score_multiple_choice(&def, &json!([0]), 1.0).is_correct);
    }

    #[test]
    fn multiple_choice_with_empty_key_never_matches() {
        let def = multiple(&[]);
        let scored = score_multiple_choice(&def, &json!([]), 2.0);
        assert!(!scored.is_correct);
        assert_eq!(scored.points_earned, 0.0);
    }
}
