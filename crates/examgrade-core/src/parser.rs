//! Exam and submission file parser.
//!
//! Loads exams from TOML or JSON files and directories, loads submissions
//! from JSON, and validates exams for common authoring mistakes.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::definition::{QuestionDefinition, QuestionType};
use crate::exam::{Exam, ExamQuestion, Submission};

/// Intermediate TOML structure for parsing exam files.
#[derive(Debug, Deserialize)]
struct TomlExamFile {
    exam: TomlExamHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    passing_percent: Option<f64>,
}

/// A question table. Everything besides the listed keys is the question
/// definition (`options`, `correctAnswers`, `subQuestions`, ...).
#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(rename = "type")]
    question_type: String,
    #[serde(default)]
    marks: f64,
    #[serde(default)]
    text: Option<String>,
    #[serde(flatten)]
    definition: Map<String, Value>,
}

/// Parse a single exam file. `.json` files are read as JSON, everything else
/// as TOML.
pub fn parse_exam(path: &Path) -> Result<Exam> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam file: {}", path.display()))?;

    parse_exam_str(&content, path)
}

/// Parse exam file contents (useful for testing). The format is chosen from
/// the extension of `source_path`.
pub fn parse_exam_str(content: &str, source_path: &Path) -> Result<Exam> {
    if source_path.extension().is_some_and(|ext| ext == "json") {
        return serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()));
    }

    let parsed: TomlExamFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| ExamQuestion {
            id: q.id,
            question_type: q.question_type,
            marks: q.marks,
            text: q.text,
            definition: Value::Object(q.definition),
        })
        .collect();

    Ok(Exam {
        id: parsed.exam.id,
        title: parsed.exam.title,
        description: parsed.exam.description,
        passing_percent: parsed.exam.passing_percent,
        questions,
    })
}

/// Recursively load all `.toml` exam files from a directory.
pub fn load_exam_directory(dir: &Path) -> Result<Vec<Exam>> {
    let mut exams = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            exams.extend(load_exam_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_exam(&path) {
                Ok(exam) => exams.push(exam),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(exams)
}

/// Load submissions from a JSON file holding an array of submissions.
pub fn load_submissions(path: &Path) -> Result<Vec<Submission>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read submissions file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse submissions: {}", path.display()))
}

/// A warning from exam validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn question(id: &str, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(id.to_string()),
            message: message.into(),
        }
    }
}

/// Validate an exam for common issues.
pub fn validate_exam(exam: &Exam) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if exam.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "exam has no questions".into(),
        });
    }

    if let Some(pct) = exam.passing_percent {
        if !(0.0..=100.0).contains(&pct) {
            warnings.push(ValidationWarning {
                question_id: None,
                message: format!("passing_percent {pct} is outside 0..=100"),
            });
        }
    }

    // Check for duplicate question IDs
    let mut seen_ids = std::collections::HashSet::new();
    for question in &exam.questions {
        if !seen_ids.insert(&question.id) {
            warnings.push(ValidationWarning::question(
                &question.id,
                format!("duplicate question ID: {}", question.id),
            ));
        }
    }

    for question in &exam.questions {
        warnings.extend(validate_question(question));
    }

    warnings
}

fn validate_question(question: &ExamQuestion) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let id = question.id.as_str();

    if !question.marks.is_finite() || question.marks < 0.0 {
        warnings.push(ValidationWarning::question(
            id,
            format!("invalid marks: {}", question.marks),
        ));
    }

    let question_type = match question.question_type.parse::<QuestionType>() {
        Ok(t) => t,
        Err(e) => {
            warnings.push(ValidationWarning::question(id, e.to_string()));
            return warnings;
        }
    };

    let definition = match QuestionDefinition::from_value(question_type, &question.definition) {
        Ok(d) => d,
        Err(e) => {
            warnings.push(ValidationWarning::question(id, e.to_string()));
            return warnings;
        }
    };

    match &definition {
        QuestionDefinition::SingleChoice(sc) if sc.correct_answer.is_none() => {
            warnings.push(ValidationWarning::question(
                id,
                "no option is marked correct; every answer will score 0",
            ));
        }
        QuestionDefinition::MultipleChoice(mc) if mc.correct_answers.is_empty() => {
            warnings.push(ValidationWarning::question(
                id,
                "no option is marked correct; every answer will score 0",
            ));
        }
        QuestionDefinition::CaseStudy(cs) => {
            let sub_total = cs.max_marks(question.marks);
            if (sub_total - question.marks).abs() > 1e-9 {
                warnings.push(ValidationWarning::question(
                    id,
                    format!(
                        "case-study marks ({}) differ from the sum of its sub-question marks ({sub_total}); the sum is used",
                        question.marks
                    ),
                ));
            }
        }
        QuestionDefinition::Code => {
            warnings.push(ValidationWarning::question(
                id,
                "code questions require manual review and are auto-graded as 0",
            ));
        }
        _ => {}
    }

    if question_type != QuestionType::CaseStudy && question.marks == 0.0 {
        warnings.push(ValidationWarning::question(id, "question awards no marks"));
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[exam]
id = "chem-1"
title = "Chemistry quiz"
description = "Basic chemistry"
passing_percent = 60.0

[[questions]]
id = "q1"
type = "single-choice"
marks = 2
text = "Which is a noble gas?"

[[questions.options]]
id = "opt1"
text = "Oxygen"
isCorrect = false

[[questions.options]]
id = "opt2"
text = "Neon"
isCorrect = true

[[questions]]
id = "q2"
type = "short-answer"
marks = 1
expectedAnswer = "H2O"
acceptableAnswers = ["water"]

[[questions]]
id = "q3"
type = "case-study"
marks = 5

[[questions.subQuestions]]
questionType = "multiple-choice"
marks = 2
correctAnswers = ["opt1", "opt2"]

[[questions.subQuestions]]
questionType = "short-answer"
marks = 3
correctAnswers = ["covalent"]
"#;

    #[test]
    fn parse_valid_toml() {
        let exam = parse_exam_str(VALID_TOML, &PathBuf::from("chem.toml")).unwrap();
        assert_eq!(exam.id, "chem-1");
        assert_eq!(exam.passing_percent, Some(60.0));
        assert_eq!(exam.questions.len(), 3);
        assert_eq!(exam.questions[0].question_type, "single-choice");
        assert_eq!(exam.questions[0].definition["options"][1]["isCorrect"], true);
        assert_eq!(exam.questions[1].definition["expectedAnswer"], "H2O");
        assert_eq!(exam.total_marks(), 8.0);
        assert!(validate_exam(&exam).is_empty());
    }

    #[test]
    fn parse_json_exam() {
        let json = r#"{
            "id": "json-exam",
            "title": "JSON exam",
            "questions": [
                {"id": "q1", "questionType": "drag-and-drop", "marks": 4,
                 "definition": "{\"correctMappings\": {\"a\": \"x\"}}"}
            ]
        }"#;
        let exam = parse_exam_str(json, &PathBuf::from("exam.json")).unwrap();
        assert_eq!(exam.questions[0].marks, 4.0);
        assert!(validate_exam(&exam).is_empty());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_exam_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn validate_reports_authoring_mistakes() {
        let toml = r#"
[exam]
id = "broken"
title = "Broken"

[[questions]]
id = "q1"
type = "essay"
marks = 5

[[questions]]
id = "q1"
type = "single-choice"
marks = 1
options = [{ id = "opt1", text = "A" }]

[[questions]]
id = "q3"
type = "case-study"
marks = 10
subQuestions = [{ questionType = "single-choice", correctAnswer = "opt1", marks = 2 }]

[[questions]]
id = "q4"
type = "drag-drop"
marks = 2
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("broken.toml")).unwrap();
        let warnings = validate_exam(&exam);
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();

        assert!(messages.iter().any(|m| m.contains("Unsupported question type: essay")));
        assert!(messages.iter().any(|m| m.contains("duplicate question ID")));
        assert!(messages.iter().any(|m| m.contains("no option is marked correct")));
        assert!(messages.iter().any(|m| m.contains("sum of its sub-question marks (2)")));
        assert!(messages.iter().any(|m| m.contains("dragDropTargets")));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chem.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not [toml").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let exams = load_exam_directory(dir.path()).unwrap();
        assert_eq!(exams.len(), 1);
        assert_eq!(exams[0].id, "chem-1");
    }

    #[test]
    fn load_submissions_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.json");
        std::fs::write(
            &path,
            r#"[{"id": "s1", "studentId": "alice", "examId": "chem-1",
                 "answers": {"q1": "opt2", "q2": " water "}}]"#,
        )
        .unwrap();

        let subs = load_submissions(&path).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].student_id, "alice");
        assert_eq!(subs[0].answers["q2"], " water ");
    }
}
