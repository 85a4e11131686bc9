//! compare/report.rs
//!
//! Corpus-level reduction over many tasks.

use super::task::compare_task_with;
use crate::config::EvalConfig;
use crate::types::{AggregateStats, Candidate, CorpusReport, TaskAnalysis};

/// One task's identifier and its candidates, in generation order.
pub type TaskInput = (String, Vec<Candidate>);

/// Analyze every task that has at least two candidates.
///
/// Tasks below the threshold are left out of both the detail list and the
/// aggregates. When no task qualifies the report is empty and
/// `aggregate_stats` is `None`.
pub fn build_report(tasks: &[TaskInput]) -> CorpusReport {
    build_report_with(tasks, &EvalConfig::default())
}

pub fn build_report_with(tasks: &[TaskInput], config: &EvalConfig) -> CorpusReport {
    let min_candidates = config.min_candidates();

    let task_analyses: Vec<TaskAnalysis> = tasks
        .iter()
        .filter(|(task_id, candidates)| {
            let eligible = candidates.len() >= min_candidates;
            if !eligible {
                tracing::debug!(%task_id, candidates = candidates.len(), "skipping task");
            }
            eligible
        })
        .map(|(task_id, candidates)| TaskAnalysis {
            task_id: task_id.clone(),
            summary: compare_task_with(candidates, config),
        })
        .collect();

    let aggregate_stats = aggregate(&task_analyses);

    tracing::info!(
        tasks = tasks.len(),
        analyzed = task_analyses.len(),
        "corpus report built"
    );

    CorpusReport {
        task_analyses,
        aggregate_stats,
    }
}

fn aggregate(analyses: &[TaskAnalysis]) -> Option<AggregateStats> {
    if analyses.is_empty() {
        return None;
    }

    let n = analyses.len() as f64;
    let consistent = analyses
        .iter()
        .filter(|a| a.summary.semantic.semantic_consistency)
        .count();

    Some(AggregateStats {
        total_tasks: analyses.len(),
        avg_non_determinism_score: analyses
            .iter()
            .map(|a| a.summary.non_determinism_score)
            .sum::<f64>()
            / n,
        avg_success_rate: analyses
            .iter()
            .map(|a| a.summary.semantic.success_rate)
            .sum::<f64>()
            / n,
        avg_structure_similarity: analyses
            .iter()
            .map(|a| a.summary.avg_structure_similarity)
            .sum::<f64>()
            / n,
        consistent_task_count: consistent,
        inconsistent_task_count: analyses.len() - consistent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;

    fn task(id: &str, sources: &[(&str, Outcome)]) -> TaskInput {
        (
            id.to_string(),
            sources
                .iter()
                .map(|(s, o)| Candidate::new(*s, o.clone()))
                .collect(),
        )
    }

    #[test]
    fn empty_corpus_has_no_aggregates() {
        let report = build_report(&[]);
        assert!(report.task_analyses.is_empty());
        assert!(report.aggregate_stats.is_none());
    }

    #[test]
    fn only_single_candidate_tasks_yields_empty_report() {
        let report = build_report(&[task("t0", &[("x = 1", Outcome::Passed)])]);
        assert_eq!(report.total_tasks(), 0);
        assert!(report.aggregate_stats.is_none());
    }

    #[test]
    fn aggregates_over_eligible_tasks_only() {
        let tasks = vec![
            task("same", &[("x = 1", Outcome::Passed), ("x = 1", Outcome::Passed)]),
            task("solo", &[("y = 2", Outcome::Failed)]),
            task("mixed", &[("a = 1", Outcome::Passed), ("zzz()", Outcome::Failed)]),
        ];
        let report = build_report(&tasks);
        let stats = report.aggregate_stats.as_ref().unwrap();

        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.consistent_task_count, 1);
        assert_eq!(stats.inconsistent_task_count, 1);
        assert!((stats.avg_success_rate - 0.75).abs() < 1e-9);

        let mixed = report.find_task("mixed").unwrap();
        let expected = mixed.summary.non_determinism_score / 2.0;
        assert!((stats.avg_non_determinism_score - expected).abs() < 1e-12);
        assert!(report.find_task("solo").is_none());
    }

    #[test]
    fn raised_threshold_excludes_more_tasks() {
        let tasks = vec![
            task("two", &[("x = 1", Outcome::Passed), ("x = 2", Outcome::Passed)]),
            task(
                "three",
                &[
                    ("x = 1", Outcome::Passed),
                    ("x = 2", Outcome::Passed),
                    ("x = 3", Outcome::Passed),
                ],
            ),
        ];
        let config = EvalConfig {
            min_candidates: 3,
            ..EvalConfig::default()
        };
        let report = build_report_with(&tasks, &config);
        assert_eq!(report.total_tasks(), 1);
        assert_eq!(report.task_analyses[0].task_id, "three");
    }
}
