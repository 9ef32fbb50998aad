//! examgrade CLI: evaluate answers, grade submissions and compare reports.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "examgrade", version, about = "Exam answer evaluation and batch grading")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single answer and print the graded result as JSON
    Evaluate {
        /// Question type (single-choice, multiple-choice, drag-drop, case-study, short-answer, code)
        #[arg(long = "type")]
        question_type: String,

        /// Question definition JSON
        #[arg(long)]
        definition: String,

        /// Student answer JSON (bare text is treated as a string)
        #[arg(long, default_value = "null")]
        answer: String,

        /// Marks the question is worth
        #[arg(long, default_value = "1")]
        marks: f64,

        /// Question text to record with the graded answer
        #[arg(long)]
        text: Option<String>,

        /// Case-study credit policy: full, any
        #[arg(long)]
        case_study_credit: Option<String>,

        /// Short-answer match policy: exact, contains
        #[arg(long)]
        short_answer_match: Option<String>,
    },

    /// Grade a batch of submissions against an exam
    Grade {
        /// Path to the exam file (.toml or .json)
        #[arg(long)]
        exam: PathBuf,

        /// Path to the submissions JSON file
        #[arg(long)]
        submissions: PathBuf,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Max submissions graded concurrently
        #[arg(long)]
        parallelism: Option<usize>,

        /// Case-study credit policy: full, any
        #[arg(long)]
        case_study_credit: Option<String>,

        /// Short-answer match policy: exact, contains
        #[arg(long)]
        short_answer_match: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two grading reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Minimum score change (fraction of total marks) to report
        #[arg(long, default_value = "0.0")]
        threshold: f64,

        /// Exit code 1 if any score went down
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate exam files
    Validate {
        /// Path to exam file or directory
        #[arg(long)]
        exam: PathBuf,
    },

    /// Create starter config, example exam, and example submissions
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "examgrade=info".parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            question_type,
            definition,
            answer,
            marks,
            text,
            case_study_credit,
            short_answer_match,
        } => commands::evaluate::execute(
            question_type,
            definition,
            answer,
            marks,
            text,
            case_study_credit,
            short_answer_match,
        ),
        Commands::Grade {
            exam,
            submissions,
            output,
            format,
            parallelism,
            case_study_credit,
            short_answer_match,
            config,
        } => {
            commands::grade::execute(
                exam,
                submissions,
                output,
                format,
                parallelism,
                case_study_credit,
                short_answer_match,
                config,
            )
            .await
        }
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { exam } => commands::validate::execute(exam),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
