//! detectors/similarity.rs
//!
//! Sequence-matching ratios shared by every pairwise metric.
//!
//! Ratcliff/Obershelp: find the longest matching block, recurse on the
//! pieces left and right of it, and score `2 * M / T` where `M` is the
//! total size of the matched blocks and `T` the combined length.

use std::collections::HashMap;
use std::hash::Hash;

/// Sequences at least this long have their popular elements junked.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Matching-block ratio of two sequences. Two empty sequences score 1.0.
///
/// The matcher is order sensitive, so inputs are put in canonical order
/// first and `sequence_ratio(a, b) == sequence_ratio(b, a)`.
pub fn sequence_ratio<T: Eq + Hash + Ord>(left: &[T], right: &[T]) -> f64 {
    let total = left.len() + right.len();
    if total == 0 {
        return 1.0;
    }

    let (a, b) = if left <= right { (left, right) } else { (right, left) };
    let matched = Matcher::new(a, b).matched_len();

    (2.0 * matched as f64 / total as f64).clamp(0.0, 1.0)
}

/// Character-level ratio of two strings.
pub fn text_ratio(left: &str, right: &str) -> f64 {
    if left == right {
        return 1.0;
    }
    let l: Vec<char> = left.chars().collect();
    let r: Vec<char> = right.chars().collect();
    sequence_ratio(&l, &r)
}

/// Ratio over two token lists; 0.0 when neither side produced any token.
pub fn token_ratio(left: &[String], right: &[String]) -> f64 {
    if left.is_empty() && right.is_empty() {
        return 0.0;
    }
    sequence_ratio(left, right)
}

struct Matcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    /// Positions of each element of `b`, popular elements removed.
    b2j: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + Hash> Matcher<'a, T> {
    fn new(a: &'a [T], b: &'a [T]) -> Self {
        let mut b2j: HashMap<&'a T, Vec<usize>> = HashMap::new();
        for (j, item) in b.iter().enumerate() {
            b2j.entry(item).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` inside the given window,
    /// earliest in `a` then in `b` on ties. Returns `(i, j, k)`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);

        // run length of the match ending at (i - 1, j)
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            j2len = next;
        }

        // popular elements never enter b2j; grow the block across them
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_k += 1;
        }
        while best_i + best_k < ahi
            && best_j + best_k < bhi
            && self.a[best_i + best_k] == self.b[best_j + best_k]
        {
            best_k += 1;
        }

        (best_i, best_j, best_k)
    }

    fn matched_len(&self) -> usize {
        let mut matched = 0;
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
        }

        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identical_text_scores_one() {
        assert_eq!(text_ratio("abc", "abc"), 1.0);
        assert_eq!(text_ratio("", ""), 1.0);
    }

    #[test]
    fn disjoint_text_scores_zero() {
        assert_eq!(text_ratio("abc", "xyz"), 0.0);
        assert_eq!(text_ratio("abc", ""), 0.0);
    }

    #[test]
    fn partial_overlap_matches_hand_count() {
        // "ab" then "d": 2*3/8
        assert!(close(text_ratio("abcd", "abxd"), 0.75));
    }

    #[test]
    fn longest_block_wins_over_subsequence() {
        // an LCS would keep "cb" (2/3); the matcher only keeps one "b"
        assert!(close(text_ratio("bcb", "cab"), 1.0 / 3.0));
        assert!(close(text_ratio("cab", "bcb"), 1.0 / 3.0));
        // "a", then one of "b"/"c" in the remainder: 2*2/6
        assert!(close(text_ratio("abc", "acb"), 2.0 / 3.0));
    }

    #[test]
    fn popular_elements_are_junked_in_long_sequences() {
        let short_a = "ab".repeat(10);
        let short_b = format!("x{}", "ab".repeat(10));
        assert!(close(text_ratio(&short_a, &short_b), 40.0 / 41.0));

        // "a" and "b" each occur 100 times in a 201-long sequence
        let long_a = "ab".repeat(100);
        let long_b = format!("x{}", "ab".repeat(100));
        assert_eq!(text_ratio(&long_a, &long_b), 0.0);
    }

    #[test]
    fn ratio_is_symmetric() {
        let pairs = [
            ("def f(x): return x", "def g(y):\nreturn y + 1"),
            ("aaab", "abbb"),
            ("for i in range(3): pass", "while True: break"),
            ("bcb", "cab"),
        ];
        for (a, b) in pairs {
            assert_eq!(text_ratio(a, b), text_ratio(b, a));
        }
    }

    #[test]
    fn empty_token_lists_score_zero() {
        assert_eq!(token_ratio(&[], &[]), 0.0);
        let a = vec!["NAME:x".to_string()];
        assert_eq!(token_ratio(&a, &a), 1.0);
        assert_eq!(token_ratio(&a, &[]), 0.0);
    }
}
