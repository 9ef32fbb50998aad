//! Aggregate statistics over graded submissions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evaluator::round2;
use crate::exam::{Exam, SubmissionResult};

/// Aggregate statistics for one exam.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamStats {
    /// Number of graded submissions.
    pub submission_count: usize,
    pub mean_score: f64,
    pub median_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    /// Average percentage across submissions.
    pub mean_percentage: f64,
    /// Fraction of submissions that passed, in `0.0..=1.0`.
    pub pass_rate: f64,
    /// Per-question statistics keyed by question id.
    pub per_question: BTreeMap<String, QuestionStats>,
}

/// Statistics for a single question across all submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub question_id: String,
    pub question_type: String,
    pub max_marks: f64,
    /// Submissions that answered the question.
    pub attempts: usize,
    /// Submissions whose answer was fully correct.
    pub correct_count: usize,
    /// Fraction of submissions with a fully correct answer.
    pub correct_rate: f64,
    /// Average points earned, counting unanswered as 0.
    pub avg_points: f64,
    /// Answers that could not be evaluated.
    pub fallback_count: usize,
}

/// Median of a list of values. Returns 0.0 for an empty list.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Compute aggregate statistics from the graded submissions of `exam`.
pub fn compute_exam_stats(results: &[SubmissionResult], exam: &Exam) -> ExamStats {
    if results.is_empty() {
        return ExamStats::default();
    }

    let n = results.len() as f64;
    let scores: Vec<f64> = results.iter().map(|r| r.score).collect();

    let mean_score = scores.iter().sum::<f64>() / n;
    let min_score = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean_percentage = results.iter().map(|r| r.percentage).sum::<f64>() / n;
    let pass_rate = results.iter().filter(|r| r.passed).count() as f64 / n;

    let mut per_question = BTreeMap::new();
    for question in &exam.questions {
        let graded: Vec<_> = results
            .iter()
            .filter_map(|r| r.answers.iter().find(|a| a.question_id == question.id))
            .collect();

        let correct_count = graded.iter().filter(|a| a.result.is_correct).count();
        let total_points: f64 = graded.iter().map(|a| a.result.points_earned).sum();

        per_question.insert(
            question.id.clone(),
            QuestionStats {
                question_id: question.id.clone(),
                question_type: question.question_type.clone(),
                max_marks: question.max_marks(),
                attempts: graded.iter().filter(|a| a.answered).count(),
                correct_count,
                correct_rate: correct_count as f64 / n,
                avg_points: round2(total_points / n),
                fallback_count: graded.iter().filter(|a| a.result.is_fallback()).count(),
            },
        );
    }

    ExamStats {
        submission_count: results.len(),
        mean_score: round2(mean_score),
        median_score: round2(median(&scores)),
        min_score,
        max_score,
        mean_percentage: round2(mean_percentage),
        pass_rate,
        per_question,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Evaluator;
    use crate::exam::grade_submission;
    use crate::exam::tests::{sample_exam, submission};
    use serde_json::json;

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn empty_results_give_default_stats() {
        let stats = compute_exam_stats(&[], &sample_exam());
        assert_eq!(stats.submission_count, 0);
        assert!(stats.per_question.is_empty());
    }

    #[test]
    fn stats_over_graded_submissions() {
        let exam = sample_exam();
        let evaluator = Evaluator::default();
        let results: Vec<_> = [
            submission("a", json!({"q1": "opt2", "q2": ["opt1", "opt3"], "q3": ["opt1", "Nile"]})),
            submission("b", json!({"q1": "opt1"})),
            submission("c", json!({"q1": "opt2", "q3": ["opt2", "nile"]})),
        ]
        .iter()
        .map(|s| grade_submission(&exam, s, &evaluator, 50.0))
        .collect();

        let stats = compute_exam_stats(&results, &exam);
        assert_eq!(stats.submission_count, 3);
        assert_eq!(stats.max_score, 10.0);
        assert_eq!(stats.min_score, 0.0);
        assert_eq!(stats.median_score, 5.0);
        assert_eq!(stats.mean_score, 5.0);
        assert!((stats.pass_rate - 1.0 / 3.0).abs() < 1e-9);

        let q1 = &stats.per_question["q1"];
        assert_eq!(q1.attempts, 3);
        assert_eq!(q1.correct_count, 2);
        assert_eq!(q1.avg_points, 1.33);

        let q3 = &stats.per_question["q3"];
        assert_eq!(q3.max_marks, 5.0);
        assert_eq!(q3.attempts, 2);
        assert_eq!(q3.correct_count, 1);
    }
}
