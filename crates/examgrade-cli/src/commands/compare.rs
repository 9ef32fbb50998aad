//! The `examgrade compare` command.

use std::path::PathBuf;

use anyhow::Result;

use examgrade_core::report::GradingReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = GradingReport::load_json(&baseline_path)?;
    let current = GradingReport::load_json(&current_path)?;

    if baseline.exam.id != current.exam.id {
        tracing::warn!(
            "comparing reports for different exams: '{}' vs '{}'",
            baseline.exam.id,
            current.exam.id
        );
    }

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            // text format
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );

            if !report.regressions.is_empty() {
                println!("\nRegressions:");
                for r in &report.regressions {
                    println!(
                        "  {} ({}) {:.1}% -> {:.1}% ({:+.1}%)",
                        r.submission_id,
                        r.student_id,
                        r.baseline_score * 100.0,
                        r.current_score * 100.0,
                        r.delta * 100.0
                    );
                }
            }

            if !report.improvements.is_empty() {
                println!("\nImprovements:");
                for i in &report.improvements {
                    println!(
                        "  {} ({}) {:.1}% -> {:.1}% (+{:.1}%)",
                        i.submission_id,
                        i.student_id,
                        i.baseline_score * 100.0,
                        i.current_score * 100.0,
                        i.delta * 100.0
                    );
                }
            }

            if report.new_submissions > 0 {
                println!("\n{} new submission(s)", report.new_submissions);
            }
            if report.removed_submissions > 0 {
                println!("{} removed submission(s)", report.removed_submissions);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
