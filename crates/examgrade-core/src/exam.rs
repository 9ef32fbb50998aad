//! Exams, submissions, and whole-submission grading.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::{QuestionDefinition, QuestionType};
use crate::evaluator::{round2, EvaluationResult, Evaluator};

/// An exam: an ordered list of questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    /// Unique identifier for this exam.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Percentage needed to pass; overrides the configured default.
    #[serde(default)]
    pub passing_percent: Option<f64>,
    #[serde(default)]
    pub questions: Vec<ExamQuestion>,
}

/// One question on an exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestion {
    pub id: String,
    /// Question type tag. Kept as text so unknown types still reach the
    /// evaluator and are graded as fallback results.
    #[serde(alias = "type")]
    pub question_type: String,
    /// Marks recorded for the question. Ignored for case studies, which are
    /// worth the sum of their sub-question marks.
    #[serde(default)]
    pub marks: f64,
    #[serde(default)]
    pub text: Option<String>,
    /// Stored question data, as an object or a serialized JSON string.
    #[serde(default)]
    pub definition: Value,
}

impl ExamQuestion {
    /// The most this question can award.
    pub fn max_marks(&self) -> f64 {
        let marks = self.marks.max(0.0);
        match self.question_type.parse::<QuestionType>() {
            Ok(QuestionType::CaseStudy) => {
                QuestionDefinition::from_value(QuestionType::CaseStudy, &self.definition)
                    .map(|def| def.max_marks(marks))
                    .unwrap_or(marks)
            }
            _ => marks,
        }
    }
}

impl Exam {
    /// Total marks available on the exam.
    pub fn total_marks(&self) -> f64 {
        self.questions.iter().map(ExamQuestion::max_marks).sum()
    }

    pub fn question(&self, id: &str) -> Option<&ExamQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }
}

/// A student's answers to one exam, keyed by question id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub student_id: String,
    pub exam_id: String,
    #[serde(default)]
    pub answers: BTreeMap<String, Value>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// The graded answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedAnswer {
    pub question_id: String,
    /// Whether the submission contained an answer for this question.
    pub answered: bool,
    pub result: EvaluationResult,
}

/// The graded outcome of one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub submission_id: String,
    pub student_id: String,
    pub exam_id: String,
    pub answers: Vec<GradedAnswer>,
    /// Points earned across all questions, rounded to 2 decimal places.
    pub score: f64,
    pub total_marks: f64,
    pub percentage: f64,
    pub passed: bool,
    pub graded_at: DateTime<Utc>,
}

impl SubmissionResult {
    /// Number of answers that could not be evaluated normally.
    pub fn fallback_count(&self) -> usize {
        self.answers.iter().filter(|a| a.result.is_fallback()).count()
    }
}

/// Grade every question of `exam` for one submission.
///
/// Questions the student skipped are evaluated with a null answer and score 0.
/// `default_passing_percent` applies when the exam does not set its own.
pub fn grade_submission(
    exam: &Exam,
    submission: &Submission,
    evaluator: &Evaluator,
    default_passing_percent: f64,
) -> SubmissionResult {
    let now = Utc::now();

    for question_id in submission.answers.keys() {
        if exam.question(question_id).is_none() {
            tracing::debug!(
                "submission {} answers unknown question {question_id}",
                submission.id
            );
        }
    }

    let answers: Vec<GradedAnswer> = exam
        .questions
        .iter()
        .map(|question| {
            let answer = submission.answers.get(&question.id);
            let mut result = evaluator.evaluate_at(
                &question.question_type,
                &question.definition,
                answer.unwrap_or(&Value::Null),
                question.marks,
                now,
            );
            if let Some(text) = &question.text {
                result = result.with_question_text(text.clone());
            }
            GradedAnswer {
                question_id: question.id.clone(),
                answered: answer.is_some_and(|a| !a.is_null()),
                result,
            }
        })
        .collect();

    let total_marks = exam.total_marks();
    let score = round2(answers.iter().map(|a| a.result.points_earned).sum());
    let percentage = if total_marks > 0.0 {
        round2(score / total_marks * 100.0)
    } else {
        0.0
    };
    let passing_percent = exam.passing_percent.unwrap_or(default_passing_percent);

    SubmissionResult {
        submission_id: submission.id.clone(),
        student_id: submission.student_id.clone(),
        exam_id: submission.exam_id.clone(),
        answers,
        score,
        total_marks,
        percentage,
        passed: percentage >= passing_percent,
        graded_at: now,
    }
}
