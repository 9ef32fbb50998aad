//! The `examgrade evaluate` command.

use anyhow::{Context, Result};
use serde_json::Value;

use examgrade_core::{EvaluationPolicy, Evaluator};

use super::override_policy;

pub fn execute(
    question_type: String,
    definition: String,
    answer: String,
    marks: f64,
    text: Option<String>,
    case_study_credit: Option<String>,
    short_answer_match: Option<String>,
) -> Result<()> {
    let policy = override_policy(
        EvaluationPolicy::default(),
        case_study_credit.as_deref(),
        short_answer_match.as_deref(),
    )?;

    // The definition is passed through as text; the evaluator decodes it and
    // reports malformed JSON as a fallback result.
    let definition = Value::String(definition);
    let answer = parse_answer(&answer);

    let mut result = Evaluator::new(policy).evaluate(&question_type, &definition, &answer, marks);
    if let Some(text) = text {
        result = result.with_question_text(text);
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("failed to serialize result")?
    );

    Ok(())
}

/// Parse the answer as JSON, treating anything that is not JSON as text.
fn parse_answer(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
