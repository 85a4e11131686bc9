//! compare/semantic.rs
//!
//! Behavioral agreement across a task's candidates.

use std::collections::HashSet;

use crate::types::{Outcome, SemanticSummary};

pub fn summarize_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a Outcome>) -> SemanticSummary {
    let outcomes: Vec<&Outcome> = outcomes.into_iter().collect();

    let total_count = outcomes.len();
    let passed_count = outcomes.iter().filter(|o| o.is_passed()).count();
    let failed_count = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Failed))
        .count();

    let success_rate = if total_count > 0 {
        passed_count as f64 / total_count as f64
    } else {
        0.0
    };

    let distinct: HashSet<&Outcome> = outcomes.iter().copied().collect();

    SemanticSummary {
        passed_count,
        failed_count,
        total_count,
        success_rate,
        // vacuously consistent when there is nothing to disagree
        semantic_consistency: distinct.len() <= 1,
        all_passed: passed_count == total_count,
        all_failed: failed_count == total_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes(labels: &[&str]) -> Vec<Outcome> {
        labels.iter().map(|l| Outcome::from(*l)).collect()
    }

    #[test]
    fn all_passed_is_consistent() {
        let s = summarize_outcomes(&outcomes(&["passed", "passed"]));
        assert_eq!(s.success_rate, 1.0);
        assert!(s.semantic_consistency);
        assert!(s.all_passed);
        assert!(!s.all_failed);
    }

    #[test]
    fn mixed_outcomes_are_inconsistent() {
        let s = summarize_outcomes(&outcomes(&["passed", "failed", "passed"]));
        assert_eq!(s.passed_count, 2);
        assert_eq!(s.failed_count, 1);
        assert_eq!(s.total_count, 3);
        assert!((s.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!(!s.semantic_consistency);
    }

    #[test]
    fn one_differing_outcome_flips_consistency() {
        let mut labels = outcomes(&["failed", "failed", "failed"]);
        assert!(summarize_outcomes(&labels).semantic_consistency);

        labels.push(Outcome::Timeout);
        let s = summarize_outcomes(&labels);
        assert!(!s.semantic_consistency);
        assert_eq!(s.failed_count, 3);
        assert_eq!(s.passed_count + s.failed_count, 3);
        assert_eq!(s.total_count, 4);
    }

    #[test]
    fn timeouts_count_as_failures_for_success_rate() {
        let s = summarize_outcomes(&outcomes(&["timeout", "timeout"]));
        assert_eq!(s.success_rate, 0.0);
        assert_eq!(s.failed_count, 0);
        // consistent without either labelled flag
        assert!(s.semantic_consistency);
        assert!(!s.all_passed);
        assert!(!s.all_failed);
    }

    #[test]
    fn empty_input_is_zeroed() {
        let s = summarize_outcomes(&[]);
        assert_eq!(s.total_count, 0);
        assert_eq!(s.success_rate, 0.0);
        assert!(s.semantic_consistency);
    }
}
