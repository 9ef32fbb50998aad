//! Answer evaluation.
//!
//! [`Evaluator`] scores one student answer against one question definition.
//! Every evaluation converges on [`EvaluationResult`]: a correctness flag, the
//! points earned, and a [`FormattedAnswer`] record that is stored verbatim as
//! the graded answer.

mod case_study;
mod choice;
mod drag_drop;
mod short_answer;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::{QuestionDefinition, QuestionType};
use crate::error::EvaluationError;
use crate::policy::{CaseStudyCreditPolicy, EvaluationPolicy, ShortAnswerMatchPolicy};

/// Message recorded for question types that are never auto-graded.
pub const MANUAL_REVIEW_MESSAGE: &str = "Code questions require manual review";

/// The outcome of evaluating one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub is_correct: bool,
    pub points_earned: f64,
    pub formatted_answer: FormattedAnswer,
}

/// The graded-answer record persisted alongside a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedAnswer {
    /// The canonical question type tag (`drag-and-drop` is recorded as
    /// `drag-drop`). Fallback results keep the tag as received, since it may
    /// not name a known type.
    pub question_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    /// The student's answer after normalization (raw on failure).
    pub student_answer: Value,
    pub is_correct: bool,
    pub points_earned: f64,
    /// The most this question could have awarded.
    pub total_marks: f64,
    #[serde(flatten)]
    pub detail: AnswerDetail,
}

/// Type-specific part of a graded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnswerDetail {
    #[serde(rename_all = "camelCase")]
    SingleChoice { correct_answer: Option<String> },
    #[serde(rename_all = "camelCase")]
    MultipleChoice { correct_answers: Vec<String> },
    #[serde(rename_all = "camelCase")]
    DragDrop {
        correct_mappings: BTreeMap<String, String>,
        item_results: Vec<ItemResult>,
    },
    #[serde(rename_all = "camelCase")]
    CaseStudy {
        credit_policy: CaseStudyCreditPolicy,
        sub_results: Vec<SubQuestionResult>,
    },
    #[serde(rename_all = "camelCase")]
    ShortAnswer {
        correct_answers: Vec<String>,
        match_policy: ShortAnswerMatchPolicy,
    },
    #[serde(rename_all = "camelCase")]
    ManualReview { message: String },
    #[serde(rename_all = "camelCase")]
    Fallback {
        error: String,
        timestamp: DateTime<Utc>,
    },
}

/// Placement check for one drag-and-drop item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    pub item_id: String,
    pub expected_target_id: String,
    pub student_target_id: Option<String>,
    pub is_correct: bool,
}

/// Score of one case-study sub-question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQuestionResult {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_question_id: Option<String>,
    pub question_type: QuestionType,
    pub student_answer: Value,
    pub correct_answers: Vec<String>,
    pub is_correct: bool,
    pub points_earned: f64,
    pub max_marks: f64,
}

/// Score of a choice or short-answer question before it is wrapped into a
/// graded-answer record. Shared by top-level and case-study evaluation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scored {
    pub is_correct: bool,
    pub points_earned: f64,
    pub student_answer: Value,
    pub correct_answers: Vec<String>,
}

impl Scored {
    pub(crate) fn new(
        is_correct: bool,
        marks: f64,
        student_answer: Value,
        correct_answers: Vec<String>,
    ) -> Self {
        Self {
            is_correct,
            points_earned: if is_correct { marks } else { 0.0 },
            student_answer,
            correct_answers,
        }
    }
}

impl EvaluationResult {
    fn graded(
        question_type: QuestionType,
        student_answer: Value,
        is_correct: bool,
        points_earned: f64,
        total_marks: f64,
        detail: AnswerDetail,
    ) -> Self {
        Self {
            is_correct,
            points_earned,
            formatted_answer: FormattedAnswer {
                question_type: question_type.to_string(),
                question_text: None,
                student_answer,
                is_correct,
                points_earned,
                total_marks,
                detail,
            },
        }
    }

    /// The zero-score result returned whenever evaluation cannot proceed.
    pub fn fallback(
        question_type: &str,
        student_answer: &Value,
        total_marks: f64,
        error: &EvaluationError,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let total_marks = if total_marks.is_finite() && total_marks >= 0.0 {
            total_marks
        } else {
            0.0
        };
        Self {
            is_correct: false,
            points_earned: 0.0,
            formatted_answer: FormattedAnswer {
                question_type: question_type.to_string(),
                question_text: None,
                student_answer: student_answer.clone(),
                is_correct: false,
                points_earned: 0.0,
                total_marks,
                detail: AnswerDetail::Fallback {
                    error: error.to_string(),
                    timestamp,
                },
            },
        }
    }

    /// Attach the question text to the graded-answer record.
    pub fn with_question_text(mut self, text: impl Into<String>) -> Self {
        self.formatted_answer.question_text = Some(text.into());
        self
    }

    /// The error message if this is a fallback result.
    pub fn error(&self) -> Option<&str> {
        match &self.formatted_answer.detail {
            AnswerDetail::Fallback { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error().is_some()
    }

    /// The most this question could have awarded.
    pub fn max_marks(&self) -> f64 {
        self.formatted_answer.total_marks
    }
}

/// Scores answers under a fixed set of grading policies.
///
/// The evaluator holds no mutable state; a single instance can be shared
/// freely across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evaluator {
    policy: EvaluationPolicy,
}

impl Evaluator {
    pub fn new(policy: EvaluationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> EvaluationPolicy {
        self.policy
    }

    /// Evaluate an answer, reporting bad question data as an error.
    ///
    /// A missing or malformed *student answer* is not an error; it scores 0.
    pub fn try_evaluate(
        &self,
        question_type: &str,
        question_data: &Value,
        student_answer: &Value,
        total_marks: f64,
    ) -> Result<EvaluationResult, EvaluationError> {
        if !total_marks.is_finite() || total_marks < 0.0 {
            return Err(EvaluationError::InvalidMarks(total_marks));
        }
        let question_type: QuestionType = question_type.trim().parse()?;
        let definition = QuestionDefinition::from_value(question_type, question_data)?;
        Ok(self.evaluate_definition(&definition, student_answer, total_marks))
    }

    /// Evaluate an answer against an already normalized definition.
    pub fn evaluate_definition(
        &self,
        definition: &QuestionDefinition,
        student_answer: &Value,
        total_marks: f64,
    ) -> EvaluationResult {
        let total_marks = if total_marks.is_finite() {
            total_marks.max(0.0)
        } else {
            0.0
        };
        let question_type = definition.question_type();
        let result = match definition {
            QuestionDefinition::SingleChoice(def) => {
                let scored = choice::score_single_choice(def, student_answer, total_marks);
                let detail = AnswerDetail::SingleChoice {
                    correct_answer: def.correct_answer.clone(),
                };
                wrap(question_type, scored, total_marks, detail)
            }
            QuestionDefinition::MultipleChoice(def) => {
                let scored = choice::score_multiple_choice(def, student_answer, total_marks);
                let detail = AnswerDetail::MultipleChoice {
                    correct_answers: scored.correct_answers.clone(),
                };
                wrap(question_type, scored, total_marks, detail)
            }
            QuestionDefinition::ShortAnswer(def) => {
                let policy = self.policy.short_answer_match;
                let scored =
                    short_answer::score_short_answer(def, student_answer, total_marks, policy);
                let detail = AnswerDetail::ShortAnswer {
                    correct_answers: scored.correct_answers.clone(),
                    match_policy: policy,
                };
                wrap(question_type, scored, total_marks, detail)
            }
            QuestionDefinition::DragDrop(def) => {
                drag_drop::evaluate_drag_drop(def, student_answer, total_marks)
            }
            QuestionDefinition::CaseStudy(def) => {
                case_study::evaluate_case_study(def, student_answer, total_marks, &self.policy)
            }
            QuestionDefinition::Code => EvaluationResult::graded(
                question_type,
                student_answer.clone(),
                false,
                0.0,
                total_marks,
                AnswerDetail::ManualReview {
                    message: MANUAL_REVIEW_MESSAGE.to_string(),
                },
            ),
        };

        tracing::debug!(
            question_type = %question_type,
            is_correct = result.is_correct,
            points_earned = result.points_earned,
            "evaluated answer"
        );
        result
    }

    /// Evaluate an answer. Never fails: problems with the question produce a
    /// zero-score fallback result carrying the error message.
    pub fn evaluate(
        &self,
        question_type: &str,
        question_data: &Value,
        student_answer: &Value,
        total_marks: f64,
    ) -> EvaluationResult {
        self.evaluate_at(question_type, question_data, student_answer, total_marks, Utc::now())
    }

    /// Like [`Evaluator::evaluate`], stamping fallback results with `now`.
    pub fn evaluate_at(
        &self,
        question_type: &str,
        question_data: &Value,
        student_answer: &Value,
        total_marks: f64,
        now: DateTime<Utc>,
    ) -> EvaluationResult {
        match self.try_evaluate(question_type, question_data, student_answer, total_marks) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("evaluation of {question_type} answer fell back to zero: {e}");
                EvaluationResult::fallback(question_type, student_answer, total_marks, &e, now)
            }
        }
    }
}

/// Evaluate an answer with the default grading policies.
pub fn evaluate(
    question_type: &str,
    question_data: &Value,
    student_answer: &Value,
    total_marks: f64,
) -> EvaluationResult {
    Evaluator::default().evaluate(question_type, question_data, student_answer, total_marks)
}

fn wrap(
    question_type: QuestionType,
    scored: Scored,
    total_marks: f64,
    detail: AnswerDetail,
) -> EvaluationResult {
    EvaluationResult::graded(
        question_type,
        scored.student_answer,
        scored.is_correct,
        scored.points_earned,
        total_marks,
        detail,
    )
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
