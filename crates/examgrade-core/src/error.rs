//! Evaluation error types.
//!
//! These errors describe why an answer could not be scored. The dispatcher
//! turns every one of them into a zero-score fallback result, so callers that
//! only want a score never see them; callers that want to distinguish bad
//! question data from a wrong answer use [`crate::Evaluator::try_evaluate`].

use thiserror::Error;

/// Errors that can occur while evaluating an answer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// The question definition arrived as a string that is not valid JSON.
    #[error("invalid question definition JSON: {0}")]
    InvalidDefinitionJson(String),

    /// The question definition has the wrong shape for its type.
    #[error("malformed question definition: {0}")]
    MalformedDefinition(String),

    /// A field required by the question type is absent.
    #[error("{question_type} question is missing required field '{field}'")]
    MissingField {
        question_type: String,
        field: &'static str,
    },

    /// The question type tag is not one the engine knows.
    #[error("Unsupported question type: {0}")]
    UnsupportedQuestionType(String),

    /// A case-study sub-question uses a type that cannot be nested.
    #[error("case-study sub-question {index} has unsupported type: {question_type}")]
    UnsupportedSubQuestionType { index: usize, question_type: String },

    /// Marks must be finite and non-negative.
    #[error("invalid marks: {0}")]
    InvalidMarks(f64),
}

impl EvaluationError {
    /// Returns `true` if the error comes from the question definition rather
    /// than from the question type tag.
    pub fn is_data_error(&self) -> bool {
        !matches!(self, EvaluationError::UnsupportedQuestionType(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_message_names_the_type() {
        let err = EvaluationError::UnsupportedQuestionType("essay".into());
        assert_eq!(err.to_string(), "Unsupported question type: essay");
        assert!(!err.is_data_error());
    }

    #[test]
    fn missing_field_message() {
        let err = EvaluationError::MissingField {
            question_type: "drag-drop".into(),
            field: "dragDropTargets",
        };
        assert_eq!(
            err.to_string(),
            "drag-drop question is missing required field 'dragDropTargets'"
        );
        assert!(err.is_data_error());
    }
}
