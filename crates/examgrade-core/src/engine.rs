//! Batch grading orchestrator.
//!
//! Grades many submissions of one exam with bounded parallelism and collects
//! the results into a [`GradingReport`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::evaluator::Evaluator;
use crate::exam::{grade_submission, Exam, Submission, SubmissionResult};
use crate::policy::EvaluationPolicy;
use crate::report::{ExamSummary, GradingReport};
use crate::statistics::compute_exam_stats;

/// Configuration for the grading engine.
#[derive(Debug, Clone)]
pub struct GradingEngineConfig {
    /// Maximum submissions graded concurrently.
    pub parallelism: usize,
    /// Pass mark for exams that do not define their own.
    pub passing_percent: f64,
    /// Grading policies.
    pub policy: EvaluationPolicy,
}

impl Default for GradingEngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            passing_percent: 50.0,
            policy: EvaluationPolicy::default(),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_submission_graded(&self, result: &SubmissionResult);
    fn on_submission_skipped(&self, submission_id: &str, reason: &str);
    fn on_submission_error(&self, submission_id: &str, error: &str);
    fn on_batch_complete(&self, total: usize, graded: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_submission_graded(&self, _: &SubmissionResult) {}
    fn on_submission_skipped(&self, _: &str, _: &str) {}
    fn on_submission_error(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// The batch grading engine.
pub struct GradingEngine {
    evaluator: Evaluator,
    config: GradingEngineConfig,
}

impl GradingEngine {
    pub fn new(config: GradingEngineConfig) -> Self {
        Self {
            evaluator: Evaluator::new(config.policy),
            config,
        }
    }

    /// Grade every submission for `exam`.
    ///
    /// Submissions addressed to another exam are skipped. Results are sorted
    /// by submission id so reports are stable across runs.
    pub async fn grade_all(
        &self,
        exam: &Exam,
        submissions: Vec<Submission>,
        progress: &dyn ProgressReporter,
    ) -> Result<GradingReport> {
        anyhow::ensure!(self.config.parallelism >= 1, "parallelism must be at least 1");

        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism));
        let shared_exam = Arc::new(exam.clone());

        let mut futures = FuturesUnordered::new();

        for submission in submissions {
            if submission.exam_id != exam.id {
                tracing::warn!(
                    "submission {} is for exam '{}', not '{}'; skipping",
                    submission.id,
                    submission.exam_id,
                    exam.id
                );
                progress.on_submission_skipped(
                    &submission.id,
                    &format!("belongs to exam '{}'", submission.exam_id),
                );
                continue;
            }

            let semaphore = Arc::clone(&semaphore);
            let exam = Arc::clone(&shared_exam);
            let evaluator = self.evaluator;
            let passing_percent = self.config.passing_percent;

            futures.push(async move {
                let submission_id = submission.id.clone();
                let inner = async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;

                    let graded = tokio::task::spawn_blocking(move || {
                        grade_submission(&exam, &submission, &evaluator, passing_percent)
                    })
                    .await?;
                    anyhow::Ok(graded)
                };
                (submission_id, inner.await)
            });
        }

        let mut results = Vec::new();
        let mut failed = 0usize;
        let total = futures.len();

        while let Some((submission_id, result)) = futures.next().await {
            match result {
                Ok(graded) => {
                    progress.on_submission_graded(&graded);
                    results.push(graded);
                }
                Err(e) => {
                    tracing::error!("grading failed for submission {submission_id}: {e:#}");
                    progress.on_submission_error(&submission_id, &e.to_string());
                    failed += 1;
                }
            }
        }

        results.sort_by(|a, b| a.submission_id.cmp(&b.submission_id));

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, results.len(), failed, elapsed);

        let aggregate = compute_exam_stats(&results, exam);

        Ok(GradingReport {
            id: run_id,
            created_at: chrono::Utc::now(),
            exam: ExamSummary {
                id: exam.id.clone(),
                title: exam.title.clone(),
                question_count: exam.questions.len(),
                total_marks: exam.total_marks(),
            },
            policy: self.config.policy,
            results,
            aggregate,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::tests::{sample_exam, submission};
    use crate::policy::CaseStudyCreditPolicy;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        graded: Mutex<Vec<String>>,
        skipped: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn on_submission_graded(&self, result: &SubmissionResult) {
            self.graded.lock().unwrap().push(result.submission_id.clone());
        }
        fn on_submission_skipped(&self, submission_id: &str, _: &str) {
            self.skipped.lock().unwrap().push(submission_id.to_string());
        }
        fn on_submission_error(&self, _: &str, _: &str) {}
        fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
    }

    fn submissions() -> Vec<Submission> {
        (0..12)
            .map(|i| {
                let answer = if i % 2 == 0 { "opt2" } else { "opt1" };
                submission(&format!("s{i:02}"), json!({"q1": answer, "q3": ["opt1", "x"]}))
            })
            .collect()
    }

    #[tokio::test]
    async fn grades_all_submissions_in_stable_order() {
        let engine = GradingEngine::new(GradingEngineConfig {
            parallelism: 3,
            ..Default::default()
        });
        let report = engine
            .grade_all(&sample_exam(), submissions(), &NoopReporter)
            .await
            .unwrap();

        assert_eq!(report.results.len(), 12);
        assert_eq!(report.results[0].submission_id, "s00");
        assert_eq!(report.results[11].submission_id, "s11");
        assert_eq!(report.results[0].score, 4.0);
        assert_eq!(report.results[1].score, 2.0);
        assert_eq!(report.exam.total_marks, 10.0);
        assert_eq!(report.aggregate.submission_count, 12);
    }

    #[tokio::test]
    async fn skips_submissions_for_other_exams() {
        let mut subs = submissions();
        subs[0].exam_id = "other-exam".into();
        let reporter = RecordingReporter::default();

        let report = GradingEngine::new(GradingEngineConfig::default())
            .grade_all(&sample_exam(), subs, &reporter)
            .await
            .unwrap();

        assert_eq!(report.results.len(), 11);
        assert_eq!(*reporter.skipped.lock().unwrap(), vec!["s00".to_string()]);
        assert_eq!(reporter.graded.lock().unwrap().len(), 11);
    }

    #[tokio::test]
    async fn policy_is_applied_and_recorded() {
        let engine = GradingEngine::new(GradingEngineConfig {
            policy: EvaluationPolicy {
                case_study_credit: CaseStudyCreditPolicy::Any,
                ..Default::default()
            },
            ..Default::default()
        });
        let report = engine
            .grade_all(&sample_exam(), submissions(), &NoopReporter)
            .await
            .unwrap();

        assert_eq!(report.policy.case_study_credit, CaseStudyCreditPolicy::Any);
        let case_study = &report.results[0].answers[2];
        assert!(case_study.result.is_correct);
        assert_eq!(case_study.result.points_earned, 2.0);
    }

    #[tokio::test]
    async fn zero_parallelism_is_rejected() {
        let engine = GradingEngine::new(GradingEngineConfig {
            parallelism: 0,
            ..Default::default()
        });
        assert!(engine
            .grade_all(&sample_exam(), submissions(), &NoopReporter)
            .await
            .is_err());
    }
}
