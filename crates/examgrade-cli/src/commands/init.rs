//! The `examgrade init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("examgrade.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("exams")?;
    write_if_missing(Path::new("exams/example.toml"), EXAMPLE_EXAM)?;
    write_if_missing(
        Path::new("exams/example-submissions.json"),
        EXAMPLE_SUBMISSIONS,
    )?;

    println!("\nNext steps:");
    println!("  1. Edit examgrade.toml to choose grading policies");
    println!("  2. Run: examgrade validate --exam exams/example.toml");
    println!(
        "  3. Run: examgrade grade --exam exams/example.toml --submissions exams/example-submissions.json"
    );

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examgrade configuration

parallelism = 4
passing_percent = 50.0
output_dir = "./examgrade-results"

[policy]
# "full": a case study is correct only when every sub-question is.
# "any": a case study is correct when it earns any points.
case_study_credit = "full"
# "exact" or "contains"
short_answer_match = "exact"
"#;

const EXAMPLE_EXAM: &str = r#"[exam]
id = "example"
title = "Example Exam"
description = "A small exam to get started"
passing_percent = 50.0

[[questions]]
id = "q1"
type = "single-choice"
marks = 1
text = "2 + 2 = ?"
options = [
    { id = "opt1", text = "3" },
    { id = "opt2", text = "4", isCorrect = true },
]

[[questions]]
id = "q2"
type = "multiple-choice"
marks = 2
text = "Which numbers are prime?"
options = [
    { id = "opt1", text = "2", isCorrect = true },
    { id = "opt2", text = "4" },
    { id = "opt3", text = "7", isCorrect = true },
]

[[questions]]
id = "q3"
type = "short-answer"
marks = 1
text = "What is the chemical symbol for gold?"
correctAnswers = ["Au"]
"#;

const EXAMPLE_SUBMISSIONS: &str = r#"[
  {
    "id": "sub-1",
    "studentId": "student-1",
    "examId": "example",
    "answers": { "q1": "opt2", "q2": ["opt1", "opt3"], "q3": "au" }
  },
  {
    "id": "sub-2",
    "studentId": "student-2",
    "examId": "example",
    "answers": { "q1": 0, "q2": ["opt1"] }
  }
]
"#;
