pub mod compare;
pub mod evaluate;
pub mod grade;
pub mod init;
pub mod validate;

use anyhow::Result;

use examgrade_core::EvaluationPolicy;

/// Apply `--case-study-credit` / `--short-answer-match` flags on top of `policy`.
pub fn override_policy(
    mut policy: EvaluationPolicy,
    case_study_credit: Option<&str>,
    short_answer_match: Option<&str>,
) -> Result<EvaluationPolicy> {
    if let Some(value) = case_study_credit {
        policy.case_study_credit = value.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }
    if let Some(value) = short_answer_match {
        policy.short_answer_match = value.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }
    Ok(policy)
}
