//! examgrade-core: answer evaluation engine, exam grading and statistics.
//!
//! This crate defines the question and answer model, the per-type answer
//! evaluators, and the batch grading layer that the examgrade CLI builds on.

pub mod answer;
pub mod config;
pub mod definition;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod exam;
pub mod parser;
pub mod policy;
pub mod report;
pub mod statistics;

pub use error::EvaluationError;
pub use evaluator::{evaluate, EvaluationResult, Evaluator, FormattedAnswer};
pub use policy::{CaseStudyCreditPolicy, EvaluationPolicy, ShortAnswerMatchPolicy};
