//! compare/pairwise.rs
//!
//! Comparison of one unordered pair of candidates.

use crate::detectors::ast::pretty::structure_fields;
use crate::detectors::ast::{extract_structure, extract_token_profile};
use crate::detectors::normalize::{digest, normalize};
use crate::detectors::similarity::{text_ratio, token_ratio};
use crate::types::{Candidate, PairwiseResult, StructuralSummary};

/// Everything the comparator needs from one candidate, extracted once and
/// shared across every pair the candidate takes part in.
#[derive(Debug, Clone)]
pub struct CandidateProfile {
    pub normalized: String,
    pub digest: String,
    pub tokens: Vec<String>,
    pub structure: StructuralSummary,
}

impl CandidateProfile {
    pub fn build(candidate: &Candidate) -> Self {
        let normalized = normalize(&candidate.source_text);
        Self {
            digest: digest(&normalized),
            tokens: extract_token_profile(&candidate.source_text),
            structure: extract_structure(&candidate.source_text),
            normalized,
        }
    }

    fn char_len(&self) -> usize {
        self.normalized.chars().count()
    }
}

/// Compare two candidates. Pair identifiers are `(0, 1)`; the task
/// comparator assigns real indices through [`compare_profiles`].
pub fn compare(left: &Candidate, right: &Candidate) -> PairwiseResult {
    compare_profiles(
        (0, 1),
        &CandidateProfile::build(left),
        &CandidateProfile::build(right),
    )
}

pub fn compare_profiles(
    pair: (usize, usize),
    left: &CandidateProfile,
    right: &CandidateProfile,
) -> PairwiseResult {
    PairwiseResult {
        pair,
        exact_match: left.digest == right.digest,
        similarity_ratio: text_ratio(&left.normalized, &right.normalized),
        token_similarity: token_ratio(&left.tokens, &right.tokens),
        length_diff: left.char_len().abs_diff(right.char_len()),
        structure_similarity: structure_similarity(&left.structure, &right.structure),
        function_count_diff: left
            .structure
            .function_defs
            .len()
            .abs_diff(right.structure.function_defs.len()),
        import_count_diff: left
            .structure
            .imports
            .len()
            .abs_diff(right.structure.imports.len()),
        digest_left: left.digest.clone(),
        digest_right: right.digest.clone(),
    }
}

/// Mean of per-field sequence ratio over the fields both summaries
/// expose; 0.0 when nothing is comparable.
pub fn structure_similarity(left: &StructuralSummary, right: &StructuralSummary) -> f64 {
    let right_fields = structure_fields(right);

    let scores: Vec<f64> = structure_fields(left)
        .iter()
        .filter_map(|(name, l)| {
            right_fields
                .iter()
                .find(|(other, _)| other == name)
                .map(|(_, r)| text_ratio(l, r))
        })
        .collect();

    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;

    fn cand(src: &str) -> Candidate {
        Candidate::new(src, Outcome::Passed)
    }

    #[test]
    fn identical_candidates_match_exactly() {
        let a = cand("def f(): return 1");
        let r = compare(&a, &a);
        assert!(r.exact_match);
        assert_eq!(r.similarity_ratio, 1.0);
        assert_eq!(r.token_similarity, 1.0);
        assert_eq!(r.structure_similarity, 1.0);
        assert_eq!(r.length_diff, 0);
        assert_eq!(r.digest_left, r.digest_right);
    }

    #[test]
    fn indentation_only_difference_is_exact() {
        let a = cand("def f(x):\n    return x\n");
        let b = cand("def f(x):\n\treturn x\n\n\n");
        let r = compare(&a, &b);
        assert!(r.exact_match);
        assert_eq!(r.similarity_ratio, 1.0);
    }

    #[test]
    fn comparison_is_symmetric() {
        let a = cand("import os\ndef f(x):\n    if x:\n        return os.sep\n");
        let b = cand("def g(a, b):\n    for i in a:\n        print(i)\n    return b\n");
        let ab = compare(&a, &b);
        let ba = compare(&b, &a);
        assert_eq!(ab.similarity_ratio, ba.similarity_ratio);
        assert_eq!(ab.token_similarity, ba.token_similarity);
        assert_eq!(ab.structure_similarity, ba.structure_similarity);
        assert_eq!(ab.length_diff, ba.length_diff);
        assert_eq!(ab.import_count_diff, 1);
        assert_eq!(ab.function_count_diff, 0);
    }

    #[test]
    fn malformed_candidate_does_not_raise() {
        let good = cand("import math\n\ndef area(r):\n    return math.pi * r * r\n");
        let bad = cand("def area(r:\n    return math.pi * r *");
        let r = compare(&good, &bad);

        assert!(!r.exact_match);
        assert_eq!(r.token_similarity, 0.0);
        assert_eq!(r.function_count_diff, 1);
        assert_eq!(r.import_count_diff, 1);
        assert!(r.structure_similarity < 1.0);
        assert!((0.0..=1.0).contains(&r.similarity_ratio));
    }

    #[test]
    fn two_malformed_candidates_are_structurally_alike() {
        let r = compare(&cand("((("), &cand(")))"));
        assert_eq!(r.structure_similarity, 1.0);
        assert_eq!(r.token_similarity, 0.0);
    }

    #[test]
    fn structure_similarity_averages_field_ratios() {
        let empty = StructuralSummary::default();
        let one_import = StructuralSummary {
            imports: vec!["os".into()],
            ..Default::default()
        };
        // four fields identical; imports "[]" vs "['os']" score 2*2/8
        let expected = (4.0 + 0.5) / 5.0;
        assert!((structure_similarity(&empty, &one_import) - expected).abs() < 1e-9);
        assert_eq!(structure_similarity(&empty, &empty), 1.0);
    }
}
