//! Solution comparison and non-determinism scoring for code generated
//! several times for the same task.
//!
//! Candidates for one task are compared pairwise (normalized text, syntax
//! tokens, structural summary), their test outcomes aggregated, and the
//! per-task results rolled up into a corpus report.

pub mod commands;
pub mod compare;
pub mod config;
pub mod detectors;
pub mod error;
pub mod failures;
pub mod logger;
pub mod params;
pub mod persistence;
pub mod types;

pub use compare::{
    build_report, build_report_with, compare, compare_task, compare_task_with,
    summarize_outcomes, TaskInput,
};
pub use config::EvalConfig;
pub use detectors::ast::{extract_structure, extract_token_profile};
pub use detectors::normalize::normalize;
pub use error::EvalError;
pub use types::{
    AggregateStats, Candidate, ClassDef, CorpusReport, FunctionDef, Outcome, PairwiseResult,
    SemanticSummary, StructuralSummary, TaskAnalysis, TaskSummary,
};
