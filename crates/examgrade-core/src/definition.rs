//! Canonical question definitions.
//!
//! Question definitions are stored as loosely shaped JSON that has picked up
//! several naming conventions over time (`correctAnswer` vs `correctAnswers`,
//! `dragDropTargets` vs `correctMappings`, ...). [`QuestionDefinition::from_value`]
//! is the only place those conventions are recognized; evaluators work on the
//! canonical types defined here.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::answer::{
    id_string, normalize_choice, normalize_placements, normalize_selections, option_id_for_index,
};
use crate::error::EvaluationError;

/// Supported question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    #[serde(alias = "drag-and-drop")]
    DragDrop,
    CaseStudy,
    ShortAnswer,
    Code,
}

impl QuestionType {
    /// Whether this type may appear as a case-study sub-question.
    pub fn nestable(self) -> bool {
        matches!(
            self,
            QuestionType::SingleChoice | QuestionType::MultipleChoice | QuestionType::ShortAnswer
        )
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::SingleChoice => write!(f, "single-choice"),
            QuestionType::MultipleChoice => write!(f, "multiple-choice"),
            QuestionType::DragDrop => write!(f, "drag-drop"),
            QuestionType::CaseStudy => write!(f, "case-study"),
            QuestionType::ShortAnswer => write!(f, "short-answer"),
            QuestionType::Code => write!(f, "code"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = EvaluationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single-choice" => Ok(QuestionType::SingleChoice),
            "multiple-choice" => Ok(QuestionType::MultipleChoice),
            "drag-drop" | "drag-and-drop" => Ok(QuestionType::DragDrop),
            "case-study" => Ok(QuestionType::CaseStudy),
            "short-answer" => Ok(QuestionType::ShortAnswer),
            "code" => Ok(QuestionType::Code),
            other => Err(EvaluationError::UnsupportedQuestionType(other.to_string())),
        }
    }
}

/// A labeled choice in a choice-type question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
}

/// A single-choice question with its correct option resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleChoiceDefinition {
    pub options: Vec<ChoiceOption>,
    /// `None` when the stored question marks no option as correct.
    pub correct_answer: Option<String>,
}

/// A multiple-choice question with its correct option set resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipleChoiceDefinition {
    pub options: Vec<ChoiceOption>,
    pub correct_answers: BTreeSet<String>,
}

/// A drag-and-drop question as a required `item id -> target id` map.
#[derive(Debug, Clone, PartialEq)]
pub struct DragDropDefinition {
    pub mappings: BTreeMap<String, String>,
}

/// A short-answer question with its accepted answers, already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortAnswerDefinition {
    pub accepted_answers: Vec<String>,
}

/// The question types allowed inside a case study.
#[derive(Debug, Clone, PartialEq)]
pub enum SubQuestionDefinition {
    SingleChoice(SingleChoiceDefinition),
    MultipleChoice(MultipleChoiceDefinition),
    ShortAnswer(ShortAnswerDefinition),
}

impl SubQuestionDefinition {
    pub fn question_type(&self) -> QuestionType {
        match self {
            SubQuestionDefinition::SingleChoice(_) => QuestionType::SingleChoice,
            SubQuestionDefinition::MultipleChoice(_) => QuestionType::MultipleChoice,
            SubQuestionDefinition::ShortAnswer(_) => QuestionType::ShortAnswer,
        }
    }
}

/// A nested question inside a case study.
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuestion {
    pub id: Option<String>,
    /// Explicit marks; `None` means an equal share of the parent's marks.
    pub marks: Option<f64>,
    pub definition: SubQuestionDefinition,
}

/// A case-study question: an ordered list of sub-questions.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseStudyDefinition {
    pub sub_questions: Vec<SubQuestion>,
}

impl CaseStudyDefinition {
    /// Marks for each sub-question, in order.
    ///
    /// Explicit marks win; the rest get `total_marks / sub_questions.len()`.
    pub fn sub_marks(&self, total_marks: f64) -> Vec<f64> {
        let share = if self.sub_questions.is_empty() {
            0.0
        } else {
            total_marks / self.sub_questions.len() as f64
        };
        self.sub_questions
            .iter()
            .map(|sq| sq.marks.unwrap_or(share))
            .collect()
    }

    /// Maximum marks for the whole case study: the sum of sub-question marks.
    pub fn max_marks(&self, total_marks: f64) -> f64 {
        self.sub_marks(total_marks).iter().sum()
    }
}

/// A question definition in canonical form, one variant per question type.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionDefinition {
    SingleChoice(SingleChoiceDefinition),
    MultipleChoice(MultipleChoiceDefinition),
    DragDrop(DragDropDefinition),
    CaseStudy(CaseStudyDefinition),
    ShortAnswer(ShortAnswerDefinition),
    Code,
}

impl QuestionDefinition {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionDefinition::SingleChoice(_) => QuestionType::SingleChoice,
            QuestionDefinition::MultipleChoice(_) => QuestionType::MultipleChoice,
            QuestionDefinition::DragDrop(_) => QuestionType::DragDrop,
            QuestionDefinition::CaseStudy(_) => QuestionType::CaseStudy,
            QuestionDefinition::ShortAnswer(_) => QuestionType::ShortAnswer,
            QuestionDefinition::Code => QuestionType::Code,
        }
    }

    /// Maximum marks this question can award, given the marks it is worth
    /// on the exam. Case studies are worth the sum of their sub-questions.
    pub fn max_marks(&self, total_marks: f64) -> f64 {
        match self {
            QuestionDefinition::CaseStudy(cs) => cs.max_marks(total_marks),
            _ => total_marks,
        }
    }

    /// Normalize stored question data into its canonical definition.
    ///
    /// `data` may be the definition object itself or a JSON string holding it.
    pub fn from_value(question_type: QuestionType, data: &Value) -> Result<Self, EvaluationError> {
        if question_type == QuestionType::Code {
            return Ok(QuestionDefinition::Code);
        }

        let data = decode(data)?;
        let raw = RawDefinition::from_value(&data)?;
        let tag = question_type.to_string();

        Ok(match question_type {
            QuestionType::SingleChoice => QuestionDefinition::SingleChoice(raw.single_choice(&tag)?),
            QuestionType::MultipleChoice => {
                QuestionDefinition::MultipleChoice(raw.multiple_choice(&tag)?)
            }
            QuestionType::DragDrop => QuestionDefinition::DragDrop(raw.drag_drop(&tag)?),
            QuestionType::CaseStudy => QuestionDefinition::CaseStudy(raw.case_study(&tag)?),
            QuestionType::ShortAnswer => QuestionDefinition::ShortAnswer(raw.short_answer(&tag)?),
            QuestionType::Code => QuestionDefinition::Code,
        })
    }
}

/// Parse a definition that was stored as a serialized JSON string.
fn decode(data: &Value) -> Result<Cow<'_, Value>, EvaluationError> {
    match data {
        Value::String(s) => serde_json::from_str(s)
            .map(Cow::Owned)
            .map_err(|e| EvaluationError::InvalidDefinitionJson(e.to_string())),
        other => Ok(Cow::Borrowed(other)),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDefinition {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, alias = "type")]
    question_type: Option<String>,
    #[serde(default, alias = "points")]
    marks: Option<f64>,
    #[serde(default)]
    options: Option<Vec<RawOption>>,
    #[serde(default)]
    correct_answer: Option<Value>,
    #[serde(default)]
    correct_answers: Option<Value>,
    #[serde(default)]
    expected_answer: Option<Value>,
    #[serde(default)]
    acceptable_answers: Option<Value>,
    #[serde(default)]
    drag_drop_targets: Option<Vec<Value>>,
    #[serde(default)]
    correct_mappings: Option<Value>,
    #[serde(default)]
    sub_questions: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOption {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "correct")]
    is_correct: Option<bool>,
}

impl RawDefinition {
    fn from_value(data: &Value) -> Result<Self, EvaluationError> {
        match data {
            Value::Object(_) => serde_json::from_value(data.clone())
                .map_err(|e| EvaluationError::MalformedDefinition(e.to_string())),
            Value::Null => Ok(RawDefinition::default()),
            other => Err(EvaluationError::MalformedDefinition(format!(
                "expected an object, found {}",
                json_kind(other)
            ))),
        }
    }

    fn options(&self) -> Vec<ChoiceOption> {
        self.options
            .iter()
            .flatten()
            .enumerate()
            .map(|(index, opt)| ChoiceOption {
                id: opt
                    .id
                    .as_ref()
                    .and_then(id_string)
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(|| option_id_for_index(index as u64)),
                text: opt.text.clone().unwrap_or_default(),
                is_correct: opt.is_correct.unwrap_or(false),
            })
            .collect()
    }

    fn has_options(&self) -> bool {
        self.options.as_ref().is_some_and(|o| !o.is_empty())
    }

    fn single_choice(&self, tag: &str) -> Result<SingleChoiceDefinition, EvaluationError> {
        let options = self.options();
        let explicit = self
            .correct_answer
            .as_ref()
            .and_then(normalize_choice)
            .or_else(|| {
                self.correct_answers
                    .as_ref()
                    .and_then(|v| normalize_selections(v).into_iter().next())
            });

        if explicit.is_none() && !self.has_options() {
            return Err(EvaluationError::MissingField {
                question_type: tag.to_string(),
                field: "options",
            });
        }

        let correct_answer =
            explicit.or_else(|| options.iter().find(|o| o.is_correct).map(|o| o.id.clone()));

        Ok(SingleChoiceDefinition {
            options,
            correct_answer,
        })
    }

    fn multiple_choice(&self, tag: &str) -> Result<MultipleChoiceDefinition, EvaluationError> {
        let options = self.options();
        let explicit: BTreeSet<String> = self
            .correct_answers
            .as_ref()
            .map(|v| normalize_selections(v).into_iter().collect())
            .unwrap_or_default();

        if explicit.is_empty() && !self.has_options() {
            return Err(EvaluationError::MissingField {
                question_type: tag.to_string(),
                field: "options",
            });
        }

        let correct_answers = if explicit.is_empty() {
            options
                .iter()
                .filter(|o| o.is_correct)
                .map(|o| o.id.clone())
                .collect()
        } else {
            explicit
        };

        Ok(MultipleChoiceDefinition {
            options,
            correct_answers,
        })
    }

    fn drag_drop(&self, tag: &str) -> Result<DragDropDefinition, EvaluationError> {
        let mappings = match (&self.correct_mappings, &self.drag_drop_targets) {
            (Some(mappings), _) if !is_empty_json(mappings) => mappings_from_value(mappings),
            (_, Some(targets)) => mappings_from_targets(targets),
            _ => {
                return Err(EvaluationError::MissingField {
                    question_type: tag.to_string(),
                    field: "dragDropTargets",
                })
            }
        };

        if mappings.is_empty() {
            return Err(EvaluationError::MalformedDefinition(
                "drag-drop question has no item-to-target mappings".into(),
            ));
        }

        Ok(DragDropDefinition { mappings })
    }

    fn short_answer(&self, tag: &str) -> Result<ShortAnswerDefinition, EvaluationError> {
        let mut accepted: Vec<String> = Vec::new();
        for source in [
            &self.correct_answers,
            &self.expected_answer,
            &self.acceptable_answers,
            &self.correct_answer,
        ]
        .into_iter()
        .flatten()
        {
            for text in text_list(source) {
                let normalized = crate::answer::normalize_text(&text);
                if !normalized.is_empty() && !accepted.contains(&normalized) {
                    accepted.push(normalized);
                }
            }
        }

        if accepted.is_empty() {
            return Err(EvaluationError::MissingField {
                question_type: tag.to_string(),
                field: "correctAnswers",
            });
        }

        Ok(ShortAnswerDefinition {
            accepted_answers: accepted,
        })
    }

    fn case_study(&self, tag: &str) -> Result<CaseStudyDefinition, EvaluationError> {
        let Some(raw_subs) = &self.sub_questions else {
            return Err(EvaluationError::MissingField {
                question_type: tag.to_string(),
                field: "subQuestions",
            });
        };
        if raw_subs.is_empty() {
            return Err(EvaluationError::MalformedDefinition(
                "case-study question has no sub-questions".into(),
            ));
        }

        let sub_questions = raw_subs
            .iter()
            .enumerate()
            .map(|(index, value)| sub_question(index, value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CaseStudyDefinition { sub_questions })
    }
}

fn sub_question(index: usize, value: &Value) -> Result<SubQuestion, EvaluationError> {
    let decoded = decode(value)?;
    let raw = RawDefinition::from_value(&decoded)?;
    let Some(type_tag) = raw.question_type.as_deref() else {
        return Err(EvaluationError::MalformedDefinition(format!(
            "case-study sub-question {index} has no questionType"
        )));
    };

    let question_type = match type_tag.parse::<QuestionType>() {
        Ok(t) if t.nestable() => t,
        _ => {
            return Err(EvaluationError::UnsupportedSubQuestionType {
                index,
                question_type: type_tag.to_string(),
            })
        }
    };

    if let Some(marks) = raw.marks {
        if !marks.is_finite() || marks < 0.0 {
            return Err(EvaluationError::InvalidMarks(marks));
        }
    }

    let definition = match question_type {
        QuestionType::SingleChoice => SubQuestionDefinition::SingleChoice(raw.single_choice(type_tag)?),
        QuestionType::MultipleChoice => {
            SubQuestionDefinition::MultipleChoice(raw.multiple_choice(type_tag)?)
        }
        _ => SubQuestionDefinition::ShortAnswer(raw.short_answer(type_tag)?),
    };

    Ok(SubQuestion {
        id: raw.id.as_ref().and_then(id_string),
        marks: raw.marks,
        definition,
    })
}

/// Legacy `correctMappings`: an `{item: target}` object or a list of records.
fn mappings_from_value(value: &Value) -> BTreeMap<String, String> {
    match value {
        Value::Array(items) if items.iter().any(|i| i.get("correctItemId").is_some()) => {
            mappings_from_targets(items)
        }
        other => normalize_placements(other),
    }
}

/// `dragDropTargets`: each target names the item that belongs on it.
fn mappings_from_targets(targets: &[Value]) -> BTreeMap<String, String> {
    targets
        .iter()
        .filter_map(|target| {
            let target_id = target.get("id").and_then(id_string)?;
            let item_id = target.get("correctItemId").and_then(id_string)?;
            Some((item_id, target_id))
        })
        .collect()
}

fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(crate::answer::answer_text).collect(),
        other => crate::answer::answer_text(other).into_iter().collect(),
    }
}

fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
