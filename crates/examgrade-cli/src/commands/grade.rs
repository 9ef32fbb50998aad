//! The `examgrade grade` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use examgrade_core::config::load_config_from;
use examgrade_core::engine::{GradingEngine, GradingEngineConfig, ProgressReporter};
use examgrade_core::exam::SubmissionResult;
use examgrade_core::parser;
use examgrade_core::report::GradingReport;

use super::override_policy;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_submission_graded(&self, result: &SubmissionResult) {
        let fallbacks = match result.fallback_count() {
            0 => String::new(),
            n => format!(" [{n} fallback]"),
        };
        eprintln!(
            "  Graded: {} ({}) {:.2}/{:.2} {}{}",
            result.submission_id,
            result.student_id,
            result.score,
            result.total_marks,
            if result.passed { "PASS" } else { "FAIL" },
            fallbacks,
        );
    }

    fn on_submission_skipped(&self, submission_id: &str, reason: &str) {
        eprintln!("  Skipped: {submission_id}: {reason}");
    }

    fn on_submission_error(&self, submission_id: &str, error: &str) {
        eprintln!("  ERROR: {submission_id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, graded: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {graded}/{total} graded, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    exam_path: PathBuf,
    submissions_path: PathBuf,
    output: Option<PathBuf>,
    format: String,
    parallelism: Option<usize>,
    case_study_credit: Option<String>,
    short_answer_match: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let policy = override_policy(
        config.policy,
        case_study_credit.as_deref(),
        short_answer_match.as_deref(),
    )?;

    let exam = parser::parse_exam(&exam_path)?;
    for warning in parser::validate_exam(&exam) {
        match &warning.question_id {
            Some(id) => tracing::warn!("[{id}] {}", warning.message),
            None => tracing::warn!("{}", warning.message),
        }
    }

    let submissions = parser::load_submissions(&submissions_path)?;

    eprintln!(
        "examgrade v{} - Grading {} submissions for '{}' ({} questions, {} marks)",
        env!("CARGO_PKG_VERSION"),
        submissions.len(),
        exam.title,
        exam.questions.len(),
        exam.total_marks()
    );
    eprintln!();

    let engine = GradingEngine::new(GradingEngineConfig {
        parallelism,
        passing_percent: config.passing_percent,
        policy,
    });
    let report = engine.grade_all(&exam, submissions, &ConsoleReporter).await?;

    print_summary(&report);

    let output = output.unwrap_or(config.output_dir);
    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "markdown"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("report-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "markdown" | "md" => {
                let path = output.join(format!("report-{timestamp}.md"));
                std::fs::write(&path, report.to_markdown())?;
                eprintln!("Markdown report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn print_summary(report: &GradingReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Question",
        "Type",
        "Marks",
        "Attempts",
        "Correct %",
        "Avg Points",
        "Fallbacks",
    ]);

    for (question_id, stats) in &report.aggregate.per_question {
        table.add_row(vec![
            Cell::new(question_id),
            Cell::new(&stats.question_type),
            Cell::new(format!("{:.2}", stats.max_marks)),
            Cell::new(stats.attempts),
            Cell::new(format!("{:.1}%", stats.correct_rate * 100.0)),
            Cell::new(format!("{:.2}", stats.avg_points)),
            Cell::new(stats.fallback_count),
        ]);
    }

    let stats = &report.aggregate;
    eprintln!("\n{table}");
    eprintln!(
        "Mean {:.2} / {:.2}, median {:.2}, pass rate {:.1}%",
        stats.mean_score,
        report.exam.total_marks,
        stats.median_score,
        stats.pass_rate * 100.0
    );
}
