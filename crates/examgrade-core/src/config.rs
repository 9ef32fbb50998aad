//! examgrade configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::policy::EvaluationPolicy;

/// Top-level examgrade configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeConfig {
    /// Grading policies.
    #[serde(default)]
    pub policy: EvaluationPolicy,
    /// Max concurrent submissions graded.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Pass mark for exams that do not define one.
    #[serde(default = "default_passing_percent")]
    pub passing_percent: f64,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_parallelism() -> usize {
    4
}
fn default_passing_percent() -> f64 {
    50.0
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./examgrade-results")
}

impl Default for GradeConfig {
    fn default() -> Self {
        Self {
            policy: EvaluationPolicy::default(),
            parallelism: default_parallelism(),
            passing_percent: default_passing_percent(),
            output_dir: default_output_dir(),
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examgrade.toml` in the current directory
/// 2. `~/.config/examgrade/config.toml`
///
/// Environment variable overrides: `EXAMGRADE_CASE_STUDY_CREDIT`,
/// `EXAMGRADE_SHORT_ANSWER_MATCH`, `EXAMGRADE_PARALLELISM`.
pub fn load_config() -> Result<GradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GradeConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    Ok(config)
}

/// Parse a TOML config document.
pub fn parse_config_str(content: &str) -> Result<GradeConfig> {
    Ok(toml::from_str::<GradeConfig>(content)?)
}

/// Apply environment overrides read through `lookup`.
fn apply_env_overrides(
    config: &mut GradeConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(value) = lookup("EXAMGRADE_CASE_STUDY_CREDIT") {
        config.policy.case_study_credit = value
            .parse()
            .map_err(|e: String| anyhow::anyhow!("EXAMGRADE_CASE_STUDY_CREDIT: {e}"))?;
    }

    if let Some(value) = lookup("EXAMGRADE_SHORT_ANSWER_MATCH") {
        config.policy.short_answer_match = value
            .parse()
            .map_err(|e: String| anyhow::anyhow!("EXAMGRADE_SHORT_ANSWER_MATCH: {e}"))?;
    }

    if let Some(value) = lookup("EXAMGRADE_PARALLELISM") {
        config.parallelism = value
            .trim()
            .parse()
            .with_context(|| format!("EXAMGRADE_PARALLELISM: invalid value '{value}'"))?;
    }

    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examgrade"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{CaseStudyCreditPolicy, ShortAnswerMatchPolicy};
    use std::collections::HashMap;

    #[test]
    fn default_config() {
        let config = GradeConfig::default();
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.passing_percent, 50.0);
        assert_eq!(config.policy, EvaluationPolicy::default());
    }

    #[test]
    fn parse_full_config() {
        let config = parse_config_str(
            r#"
parallelism = 8
passing_percent = 65.0
output_dir = "out"

[policy]
case_study_credit = "any"
short_answer_match = "contains"
"#,
        )
        .unwrap();
        assert_eq!(config.parallelism, 8);
        assert_eq!(config.passing_percent, 65.0);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.policy.case_study_credit, CaseStudyCreditPolicy::Any);
        assert_eq!(
            config.policy.short_answer_match,
            ShortAnswerMatchPolicy::Contains
        );
    }

    #[test]
    fn unknown_policy_value_is_rejected() {
        assert!(parse_config_str("[policy]\ncase_study_credit = \"most\"\n").is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("EXAMGRADE_CASE_STUDY_CREDIT", "any"),
            ("EXAMGRADE_PARALLELISM", " 2 "),
        ]);
        let mut config = GradeConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.policy.case_study_credit, CaseStudyCreditPolicy::Any);
        assert_eq!(config.policy.short_answer_match, ShortAnswerMatchPolicy::Exact);
        assert_eq!(config.parallelism, 2);
    }

    #[test]
    fn invalid_env_override_is_an_error() {
        let mut config = GradeConfig::default();
        let err = apply_env_overrides(&mut config, |k| {
            (k == "EXAMGRADE_SHORT_ANSWER_MATCH").then(|| "fuzzy".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("EXAMGRADE_SHORT_ANSWER_MATCH"));
    }

    #[test]
    fn load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "passing_percent = 70.0\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.passing_percent, 70.0);

        assert!(load_config_from(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
