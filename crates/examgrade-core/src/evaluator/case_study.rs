//! Case-study scoring.
//!
//! Sub-questions are paired with sub-answers by position, scored
//! independently with the single-choice, multiple-choice and short-answer
//! rules, and summed. The case study is worth the sum of its sub-question
//! marks, not the marks recorded on the parent question.

use serde_json::Value;

use super::{choice, round2, short_answer, AnswerDetail, EvaluationResult, SubQuestionResult};
use crate::answer::sub_answers;
use crate::definition::{CaseStudyDefinition, QuestionType, SubQuestionDefinition};
use crate::policy::{CaseStudyCreditPolicy, EvaluationPolicy};

pub(crate) fn evaluate_case_study(
    def: &CaseStudyDefinition,
    answer: &Value,
    total_marks: f64,
    policy: &EvaluationPolicy,
) -> EvaluationResult {
    let marks = def.sub_marks(total_marks);
    let answers = sub_answers(answer);

    let sub_results: Vec<SubQuestionResult> = def
        .sub_questions
        .iter()
        .zip(&marks)
        .enumerate()
        .map(|(index, (sub, &max_marks))| {
            // A missing sub-answer scores 0 without affecting the others.
            let sub_answer = answers.get(index).unwrap_or(&Value::Null);
            let scored = match &sub.definition {
                SubQuestionDefinition::SingleChoice(d) => {
                    choice::score_single_choice(d, sub_answer, max_marks)
                }
                SubQuestionDefinition::MultipleChoice(d) => {
                    choice::score_multiple_choice(d, sub_answer, max_marks)
                }
                SubQuestionDefinition::ShortAnswer(d) => short_answer::score_short_answer(
                    d,
                    sub_answer,
                    max_marks,
                    policy.short_answer_match,
                ),
            };
            SubQuestionResult {
                index,
                sub_question_id: sub.id.clone(),
                question_type: sub.definition.question_type(),
                student_answer: scored.student_answer,
                correct_answers: scored.correct_answers,
                is_correct: scored.is_correct,
                points_earned: scored.points_earned,
                max_marks,
            }
        })
        .collect();

    let max_marks: f64 = marks.iter().sum();
    let earned: f64 = sub_results.iter().map(|r| r.points_earned).sum();
    let points_earned = round2(earned).min(max_marks).max(0.0);

    let is_correct = match policy.case_study_credit {
        CaseStudyCreditPolicy::Full => {
            !sub_results.is_empty() && sub_results.iter().all(|r| r.is_correct)
        }
        CaseStudyCreditPolicy::Any => points_earned > 0.0,
    };

    let student_answer = Value::Array(
        sub_results
            .iter()
            .map(|r| r.student_answer.clone())
            .collect(),
    );

    EvaluationResult::graded(
        QuestionType::CaseStudy,
        student_answer,
        is_correct,
        points_earned,
        max_marks,
        AnswerDetail::CaseStudy {
            credit_policy: policy.case_study_credit,
            sub_results,
        },
    )
}
