//! Drag-and-drop placement scoring.

use serde_json::Value;

use super::{AnswerDetail, EvaluationResult, ItemResult};
use crate::answer::normalize_placements;
use crate::definition::{DragDropDefinition, QuestionType};

/// Every required item must sit on its target. Per-item results are kept for
/// display, but the score is all or nothing.
pub(crate) fn evaluate_drag_drop(
    def: &DragDropDefinition,
    answer: &Value,
    total_marks: f64,
) -> EvaluationResult {
    let placements = normalize_placements(answer);

    let item_results: Vec<ItemResult> = def
        .mappings
        .iter()
        .map(|(item, target)| {
            let placed = placements.get(item).cloned();
            ItemResult {
                item_id: item.clone(),
                expected_target_id: target.clone(),
                is_correct: placed.as_deref() == Some(target.as_str()),
                student_target_id: placed,
            }
        })
        .collect();

    let is_correct = !item_results.is_empty() && item_results.iter().all(|r| r.is_correct);
    let points_earned = if is_correct { total_marks } else { 0.0 };

    let student_answer = Value::Object(
        placements
            .into_iter()
            .map(|(item, target)| (item, Value::String(target)))
            .collect(),
    );

    EvaluationResult::graded(
        QuestionType::DragDrop,
        student_answer,
        is_correct,
        points_earned,
        total_marks,
        AnswerDetail::DragDrop {
            correct_mappings: def.mappings.clone(),
            item_results,
        },
    )
}
