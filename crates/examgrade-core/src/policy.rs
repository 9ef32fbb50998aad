//! Grading policies for the points where equally plausible scoring rules
//! produce different outcomes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// When a case-study question as a whole counts as correct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStudyCreditPolicy {
    /// Every sub-question must be answered correctly.
    #[default]
    Full,
    /// Any points earned on any sub-question.
    Any,
}

impl fmt::Display for CaseStudyCreditPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseStudyCreditPolicy::Full => write!(f, "full"),
            CaseStudyCreditPolicy::Any => write!(f, "any"),
        }
    }
}

impl FromStr for CaseStudyCreditPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(CaseStudyCreditPolicy::Full),
            "any" => Ok(CaseStudyCreditPolicy::Any),
            other => Err(format!("unknown case-study credit policy: {other}")),
        }
    }
}

/// How a short free-text answer is matched against the accepted answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortAnswerMatchPolicy {
    /// The normalized answer equals one of the accepted answers.
    #[default]
    Exact,
    /// The normalized answer contains one of the accepted answers.
    Contains,
}

impl fmt::Display for ShortAnswerMatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShortAnswerMatchPolicy::Exact => write!(f, "exact"),
            ShortAnswerMatchPolicy::Contains => write!(f, "contains"),
        }
    }
}

impl FromStr for ShortAnswerMatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(ShortAnswerMatchPolicy::Exact),
            "contains" | "substring" => Ok(ShortAnswerMatchPolicy::Contains),
            other => Err(format!("unknown short-answer match policy: {other}")),
        }
    }
}

/// The full set of grading policies applied by an evaluator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationPolicy {
    #[serde(default)]
    pub case_study_credit: CaseStudyCreditPolicy,
    #[serde(default)]
    pub short_answer_match: ShortAnswerMatchPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_strict_policies() {
        let policy = EvaluationPolicy::default();
        assert_eq!(policy.case_study_credit, CaseStudyCreditPolicy::Full);
        assert_eq!(policy.short_answer_match, ShortAnswerMatchPolicy::Exact);
    }

    #[test]
    fn policy_display_and_parse() {
        assert_eq!(CaseStudyCreditPolicy::Any.to_string(), "any");
        assert_eq!(
            "FULL".parse::<CaseStudyCreditPolicy>().unwrap(),
            CaseStudyCreditPolicy::Full
        );
        assert_eq!(
            "substring".parse::<ShortAnswerMatchPolicy>().unwrap(),
            ShortAnswerMatchPolicy::Contains
        );
        assert!("partial".parse::<CaseStudyCreditPolicy>().is_err());
        assert!("fuzzy".parse::<ShortAnswerMatchPolicy>().is_err());
    }

    #[test]
    fn policy_from_toml() {
        let policy: EvaluationPolicy = toml::from_str(
            r#"
case_study_credit = "any"
short_answer_match = "contains"
"#,
        )
        .unwrap();
        assert_eq!(policy.case_study_credit, CaseStudyCreditPolicy::Any);
        assert_eq!(policy.short_answer_match, ShortAnswerMatchPolicy::Contains);

        let empty: EvaluationPolicy = toml::from_str("").unwrap();
        assert_eq!(empty, EvaluationPolicy::default());
    }
}
