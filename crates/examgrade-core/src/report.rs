//! Grading report types with JSON persistence and re-grade comparison.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::exam::SubmissionResult;
use crate::policy::EvaluationPolicy;
use crate::statistics::ExamStats;

/// A complete grading report for one exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the exam.
    pub exam: ExamSummary,
    /// Policies the submissions were graded under.
    pub policy: EvaluationPolicy,
    /// Graded submissions, ordered by submission id.
    pub results: Vec<SubmissionResult>,
    /// Aggregate statistics.
    pub aggregate: ExamStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of an exam (without the full question definitions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSummary {
    pub id: String,
    pub title: String,
    pub question_count: usize,
    pub total_marks: f64,
}

impl GradingReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradingReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Render the per-submission scores and aggregate statistics as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "## {} ({})\n\n**Policy:** case-study credit `{}`, short-answer match `{}`\n\n",
            self.exam.title,
            self.exam.id,
            self.policy.case_study_credit,
            self.policy.short_answer_match
        ));

        md.push_str("| Submission | Student | Score | Percentage | Passed |\n");
        md.push_str("|------------|---------|-------|------------|--------|\n");
        for r in &self.results {
            md.push_str(&format!(
                "| {} | {} | {:.2} / {:.2} | {:.1}% | {} |\n",
                r.submission_id,
                r.student_id,
                r.score,
                r.total_marks,
                r.percentage,
                if r.passed { "yes" } else { "no" }
            ));
        }

        let stats = &self.aggregate;
        md.push_str(&format!(
            "\n**Summary:** {} submissions, mean {:.2}, median {:.2}, pass rate {:.1}%\n",
            stats.submission_count,
            stats.mean_score,
            stats.median_score,
            stats.pass_rate * 100.0
        ));

        md
    }

    /// Compare this report against a baseline grading of the same
    /// submissions, e.g. one produced under different policies.
    ///
    /// Scores are compared as fractions of total marks; a change smaller
    /// than `threshold` counts as unchanged.
    pub fn compare(&self, baseline: &GradingReport, threshold: f64) -> RegradeReport {
        let score_map = |report: &GradingReport| -> HashMap<String, (String, f64)> {
            report
                .results
                .iter()
                .map(|r| {
                    let fraction = if r.total_marks > 0.0 {
                        r.score / r.total_marks
                    } else {
                        0.0
                    };
                    (r.submission_id.clone(), (r.student_id.clone(), fraction))
                })
                .collect()
        };

        let baseline_scores = score_map(baseline);
        let current_scores = score_map(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_submissions = 0usize;

        for (submission_id, (student_id, current)) in &current_scores {
            if let Some((_, baseline_val)) = baseline_scores.get(submission_id) {
                let change = ScoreChange {
                    submission_id: submission_id.clone(),
                    student_id: student_id.clone(),
                    baseline_score: *baseline_val,
                    current_score: *current,
                    delta: current - baseline_val,
                };
                if change.delta < -threshold {
                    regressions.push(change);
                } else if change.delta > threshold {
                    improvements.push(change);
                } else {
                    unchanged += 1;
                }
            } else {
                new_submissions += 1;
            }
        }

        regressions.sort_by(|a, b| a.submission_id.cmp(&b.submission_id));
        improvements.sort_by(|a, b| a.submission_id.cmp(&b.submission_id));

        let removed_submissions = baseline_scores
            .keys()
            .filter(|k| !current_scores.contains_key(*k))
            .count();

        RegradeReport {
            regressions,
            improvements,
            unchanged,
            new_submissions,
            removed_submissions,
        }
    }
}

/// Result of comparing two grading reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegradeReport {
    /// Submissions whose score went down.
    pub regressions: Vec<ScoreChange>,
    /// Submissions whose score went up.
    pub improvements: Vec<ScoreChange>,
    /// Submissions with no significant change.
    pub unchanged: usize,
    /// Submissions in current but not baseline.
    pub new_submissions: usize,
    /// Submissions in baseline but not current.
    pub removed_submissions: usize,
}

/// A score that moved between two gradings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreChange {
    pub submission_id: String,
    pub student_id: String,
    pub baseline_score: f64,
    pub current_score: f64,
    pub delta: f64,
}

impl RegradeReport {
    /// Format the re-grade report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        if !self.regressions.is_empty() {
            md.push_str("### Regressions\n\n");
            md.push_str("| Submission | Student | Baseline | Current | Delta |\n");
            md.push_str("|------------|---------|----------|---------|-------|\n");
            for r in &self.regressions {
                md.push_str(&format!(
                    "| {} | {} | {:.1}% | {:.1}% | {:.1}% |\n",
                    r.submission_id,
                    r.student_id,
                    r.baseline_score * 100.0,
                    r.current_score * 100.0,
                    r.delta * 100.0
                ));
            }
            md.push('\n');
        }

        if !self.improvements.is_empty() {
            md.push_str("### Improvements\n\n");
            md.push_str("| Submission | Student | Baseline | Current | Delta |\n");
            md.push_str("|------------|---------|----------|---------|-------|\n");
            for i in &self.improvements {
                md.push_str(&format!(
                    "| {} | {} | {:.1}% | {:.1}% | +{:.1}% |\n",
                    i.submission_id,
                    i.student_id,
                    i.baseline_score * 100.0,
                    i.current_score * 100.0,
                    i.delta * 100.0
                ));
            }
        }

        md
    }

    /// Returns true if any submission scored lower than in the baseline.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
