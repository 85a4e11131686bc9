//! The comparison engine: pair -> task -> corpus.

pub mod pairwise;
pub mod report;
pub mod semantic;
pub mod task;

pub use pairwise::{compare, CandidateProfile};
pub use report::{build_report, build_report_with, TaskInput};
pub use semantic::summarize_outcomes;
pub use task::{compare_task, compare_task_with};
