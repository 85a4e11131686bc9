//! compare/task.rs
//!
//! All-pairs comparison of one task's candidates.

use super::pairwise::{compare_profiles, CandidateProfile};
use super::semantic::summarize_outcomes;
use crate::config::EvalConfig;
use crate::types::{Candidate, PairwiseResult, TaskSummary};

/// Compare every unordered pair of candidates, ascending `(i, j)`.
///
/// With fewer than two candidates the pairwise statistics are zero and the
/// non-determinism score is 0.
pub fn compare_task(candidates: &[Candidate]) -> TaskSummary {
    compare_task_with(candidates, &EvalConfig::default())
}

pub fn compare_task_with(candidates: &[Candidate], config: &EvalConfig) -> TaskSummary {
    let n = candidates.len();
    if n > config.pair_warning_threshold {
        tracing::warn!(
            candidates = n,
            pairs = n * n.saturating_sub(1) / 2,
            "candidate count is large; pairwise comparison is quadratic"
        );
    }

    let profiles: Vec<CandidateProfile> = candidates.iter().map(CandidateProfile::build).collect();

    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push(compare_profiles((i, j), &profiles[i], &profiles[j]));
        }
    }

    let semantic = summarize_outcomes(candidates.iter().map(|c| &c.outcome));

    let exact_match_count = pairs.iter().filter(|p| p.exact_match).count();
    let avg_syntax_similarity = mean(&pairs, |p| p.similarity_ratio);
    let avg_token_similarity = mean(&pairs, |p| p.token_similarity);
    let avg_structure_similarity = mean(&pairs, |p| p.structure_similarity);

    let non_determinism_score = if pairs.is_empty() {
        0.0
    } else {
        (1.0 - avg_syntax_similarity).clamp(0.0, 1.0)
    };

    tracing::debug!(
        candidates = n,
        pairs = pairs.len(),
        exact_match_count,
        non_determinism_score,
        "task compared"
    );

    TaskSummary {
        total_candidates: n,
        exact_match_count,
        avg_syntax_similarity,
        avg_token_similarity,
        avg_structure_similarity,
        non_determinism_score,
        semantic,
        pairs,
    }
}

fn mean(pairs: &[PairwiseResult], metric: impl Fn(&PairwiseResult) -> f64) -> f64 {
    if pairs.is_empty() {
        return 0.0;
    }
    pairs.iter().map(metric).sum::<f64>() / pairs.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;

    #[test]
    fn single_candidate_has_no_pairs() {
        let s = compare_task(&[Candidate::new("def f(): return 1", Outcome::Passed)]);
        assert_eq!(s.total_candidates, 1);
        assert!(s.pairs.is_empty());
        assert_eq!(s.non_determinism_score, 0.0);
        assert_eq!(s.avg_syntax_similarity, 0.0);
        assert_eq!(s.semantic.total_count, 1);
    }

    #[test]
    fn pairs_are_ascending() {
        let cands: Vec<_> = (0..4)
            .map(|i| Candidate::new(format!("x = {i}"), Outcome::Passed))
            .collect();
        let s = compare_task(&cands);
        let ids: Vec<_> = s.pairs.iter().map(|p| p.pair).collect();
        assert_eq!(ids, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn identical_candidates_score_zero() {
        let cands = vec![
            Candidate::new("def f(): return 1", Outcome::Passed),
            Candidate::new("def f(): return 1", Outcome::Passed),
        ];
        let s = compare_task(&cands);
        assert_eq!(s.exact_match_count, 1);
        assert_eq!(s.avg_syntax_similarity, 1.0);
        assert_eq!(s.non_determinism_score, 0.0);
        assert!(s.semantic.semantic_consistency);
    }

    #[test]
    fn divergent_candidates_score_between_zero_and_one() {
        let cands = vec![
            Candidate::new("def add(a, b):\n    return a + b\n", Outcome::Passed),
            Candidate::new("def add(a, b):\n    total = a\n    total += b\n    return total\n", Outcome::Failed),
            Candidate::new("add = lambda a, b: sum([a, b])\n", Outcome::Passed),
        ];
        let s = compare_task(&cands);
        assert_eq!(s.pairs.len(), 3);
        assert!(s.non_determinism_score > 0.0 && s.non_determinism_score < 1.0);
        assert!((s.non_determinism_score - (1.0 - s.avg_syntax_similarity)).abs() < 1e-12);
        assert!(!s.semantic.semantic_consistency);
    }
}
