//! Failure taxonomy: classify failure details, break a run down by error
//! category, and measure how categories changed between two runs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::compare::TaskInput;
use crate::types::{Candidate, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    NoError,
    SyntaxError,
    NameError,
    TypeError,
    ValueError,
    AttributeError,
    IndentationError,
    ImportError,
    Timeout,
    AssertionError,
    IndexError,
    KeyError,
    ZeroDivisionError,
    RecursionError,
    MemoryError,
    FileNotFoundError,
    PermissionError,
    Other,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::NoError => f.write_str("No error"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Evaluated top to bottom against the lowercased detail; first match
/// wins, so a detail naming several exceptions lands on the earliest rule.
pub const CATEGORY_RULES: &[(&str, ErrorCategory)] = &[
    ("syntaxerror", ErrorCategory::SyntaxError),
    ("nameerror", ErrorCategory::NameError),
    ("typeerror", ErrorCategory::TypeError),
    ("valueerror", ErrorCategory::ValueError),
    ("attributeerror", ErrorCategory::AttributeError),
    ("indentationerror", ErrorCategory::IndentationError),
    ("importerror", ErrorCategory::ImportError),
    ("timeout", ErrorCategory::Timeout),
    ("assertion", ErrorCategory::AssertionError),
    ("indexerror", ErrorCategory::IndexError),
    ("keyerror", ErrorCategory::KeyError),
    ("zerodivisionerror", ErrorCategory::ZeroDivisionError),
    ("recursionerror", ErrorCategory::RecursionError),
    ("memoryerror", ErrorCategory::MemoryError),
    ("filenotfounderror", ErrorCategory::FileNotFoundError),
    ("permissionerror", ErrorCategory::PermissionError),
];

pub fn categorize_failure(detail: &str) -> ErrorCategory {
    if detail.trim().is_empty() {
        return ErrorCategory::NoError;
    }

    let lower = detail.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(pattern, _)| lower.contains(pattern))
        .map(|(_, category)| *category)
        .unwrap_or(ErrorCategory::Other)
}

/// `None` for passing candidates.
pub fn classify_candidate(candidate: &Candidate) -> Option<ErrorCategory> {
    match &candidate.outcome {
        Outcome::Passed => None,
        Outcome::Timeout => Some(ErrorCategory::Timeout),
        _ => Some(categorize_failure(
            candidate.failure_detail.as_deref().unwrap_or(""),
        )),
    }
}

fn headline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(assert\b.*|[A-Za-z_][\w.]*(?:Error|Exception|Interrupt|Exit)\b.*)$")
            .expect("headline pattern is valid")
    })
}

/// The last line of a failure detail that names an exception or an
/// `assert` statement, for one-line display.
pub fn failure_headline(detail: &str) -> Option<String> {
    let re = headline_re();
    detail
        .lines()
        .rev()
        .find(|line| re.is_match(line))
        .map(|line| line.trim().to_string())
}

/* ============================================================
   Breakdown
   ============================================================ */

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFailures {
    pub task_id: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub timeout: usize,
    pub categories: BTreeMap<ErrorCategory, usize>,
}

impl TaskFailures {
    pub fn error_rate(&self) -> f64 {
        ratio(self.failed + self.timeout, self.total)
    }

    pub fn success_rate(&self) -> f64 {
        ratio(self.passed, self.total)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureBreakdown {
    pub tasks: Vec<TaskFailures>,
    pub categories: BTreeMap<ErrorCategory, usize>,
    pub total_responses: usize,
    pub total_passed: usize,
    pub total_failed: usize,
    pub total_timeout: usize,
    pub all_passed_tasks: usize,
    pub all_failed_tasks: usize,
    pub mixed_tasks: usize,
}

impl FailureBreakdown {
    /// Categories by descending count, ties in taxonomy order.
    pub fn top_categories(&self, n: usize) -> Vec<(ErrorCategory, usize)> {
        let mut ranked: Vec<_> = self.categories.iter().map(|(c, n)| (*c, *n)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    pub fn total_errors(&self) -> usize {
        self.categories.values().sum()
    }
}

pub fn failure_breakdown(tasks: &[TaskInput]) -> FailureBreakdown {
    let mut out = FailureBreakdown::default();

    for (task_id, candidates) in tasks {
        let mut task = TaskFailures {
            task_id: task_id.clone(),
            ..TaskFailures::default()
        };

        for candidate in candidates {
            task.total += 1;
            match candidate.outcome {
                Outcome::Passed => task.passed += 1,
                Outcome::Timeout => task.timeout += 1,
                _ => task.failed += 1,
            }
            if let Some(category) = classify_candidate(candidate) {
                *task.categories.entry(category).or_insert(0) += 1;
                *out.categories.entry(category).or_insert(0) += 1;
            }
        }

        out.total_responses += task.total;
        out.total_passed += task.passed;
        out.total_failed += task.failed;
        out.total_timeout += task.timeout;

        if task.passed == task.total {
            out.all_passed_tasks += 1;
        } else if task.failed == task.total {
            out.all_failed_tasks += 1;
        } else {
            out.mixed_tasks += 1;
        }

        out.tasks.push(task);
    }

    out
}

/* ============================================================
   Correction delta between two runs
   ============================================================ */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDelta {
    pub category: ErrorCategory,
    pub before: usize,
    pub after: usize,
    /// Positive when the later run has fewer errors of this kind.
    pub improvement: i64,
    pub improvement_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionReport {
    pub categories: Vec<CategoryDelta>,
    pub total_before: usize,
    pub total_after: usize,
    pub total_corrected: i64,
    pub correction_rate_pct: f64,
}

impl CorrectionReport {
    pub fn improved(&self) -> Vec<&CategoryDelta> {
        let mut out: Vec<_> = self
            .categories
            .iter()
            .filter(|d| d.improvement > 0 && d.before > 0)
            .collect();
        out.sort_by(|a, b| b.improvement_pct.total_cmp(&a.improvement_pct));
        out
    }

    pub fn worsened(&self) -> Vec<&CategoryDelta> {
        self.categories.iter().filter(|d| d.improvement < 0).collect()
    }
}

pub fn correction_delta(before: &FailureBreakdown, after: &FailureBreakdown) -> CorrectionReport {
    let seen: BTreeSet<ErrorCategory> = before
        .categories
        .keys()
        .chain(after.categories.keys())
        .copied()
        .collect();

    let categories = seen
        .into_iter()
        .map(|category| {
            let b = before.categories.get(&category).copied().unwrap_or(0);
            let a = after.categories.get(&category).copied().unwrap_or(0);
            let improvement = if b > 0 { b as i64 - a as i64 } else { 0 };
            CategoryDelta {
                category,
                before: b,
                after: a,
                improvement,
                improvement_pct: if b > 0 {
                    improvement as f64 / b as f64 * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect();

    let total_before = before.total_errors();
    let total_after = after.total_errors();
    let total_corrected = total_before as i64 - total_after as i64;

    CorrectionReport {
        categories,
        total_before,
        total_after,
        total_corrected,
        correction_rate_pct: if total_before > 0 {
            total_corrected as f64 / total_before as f64 * 100.0
        } else {
            0.0
        },
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(detail: &str) -> Candidate {
        Candidate::new("pass", Outcome::Failed).with_failure_detail(detail)
    }

    #[test]
    fn categorizes_common_tracebacks() {
        assert_eq!(
            categorize_failure("Traceback...\nNameError: name 'x' is not defined"),
            ErrorCategory::NameError
        );
        assert_eq!(
            categorize_failure("Traceback...\n    assert f(2) == 4\nAssertionError"),
            ErrorCategory::AssertionError
        );
        // a bare assert line names no exception
        assert_eq!(categorize_failure("assert f(2) == 4"), ErrorCategory::Other);
        assert_eq!(categorize_failure(""), ErrorCategory::NoError);
        assert_eq!(categorize_failure("   "), ErrorCategory::NoError);
        assert_eq!(categorize_failure("segfault"), ErrorCategory::Other);
    }

    #[test]
    fn first_matching_rule_wins() {
        // mentions both; syntaxerror sits above typeerror
        let detail = "TypeError raised while handling SyntaxError";
        assert_eq!(categorize_failure(detail), ErrorCategory::SyntaxError);
        // timeout sits above assertion
        assert_eq!(
            categorize_failure("AssertionError after timeout"),
            ErrorCategory::Timeout
        );
    }

    #[test]
    fn classification_follows_outcome() {
        assert_eq!(classify_candidate(&Candidate::new("x", Outcome::Passed)), None);
        assert_eq!(
            classify_candidate(&Candidate::new("x", Outcome::Timeout)),
            Some(ErrorCategory::Timeout)
        );
        assert_eq!(
            classify_candidate(&Candidate::new("x", Outcome::Failed)),
            Some(ErrorCategory::NoError)
        );
        assert_eq!(
            classify_candidate(&failed("KeyError: 'a'")),
            Some(ErrorCategory::KeyError)
        );
    }

    #[test]
    fn headline_picks_last_exception_line() {
        let tb = "Traceback (most recent call last):\n  File \"x.py\", line 3\nZeroDivisionError: division by zero\n";
        assert_eq!(
            failure_headline(tb).as_deref(),
            Some("ZeroDivisionError: division by zero")
        );
        assert_eq!(
            failure_headline("    assert candidate(3) == 9").as_deref(),
            Some("assert candidate(3) == 9")
        );
        assert_eq!(failure_headline("nothing useful"), None);
    }

    fn run(tasks: Vec<(&str, Vec<Candidate>)>) -> FailureBreakdown {
        let inputs: Vec<TaskInput> = tasks
            .into_iter()
            .map(|(id, c)| (id.to_string(), c))
            .collect();
        failure_breakdown(&inputs)
    }

    #[test]
    fn breakdown_counts_outcomes_and_categories() {
        let b = run(vec![
            (
                "t0",
                vec![
                    Candidate::new("a", Outcome::Passed),
                    failed("NameError: x"),
                    Candidate::new("c", Outcome::Timeout),
                ],
            ),
            ("t1", vec![Candidate::new("a", Outcome::Passed)]),
            ("t2", vec![failed("TypeError"), failed("NameError")]),
        ]);

        assert_eq!(b.total_responses, 6);
        assert_eq!(b.total_passed, 2);
        assert_eq!(b.total_failed, 3);
        assert_eq!(b.total_timeout, 1);
        assert_eq!(b.categories[&ErrorCategory::NameError], 2);
        assert_eq!(b.categories[&ErrorCategory::Timeout], 1);
        assert_eq!(b.all_passed_tasks, 1);
        assert_eq!(b.all_failed_tasks, 1);
        assert_eq!(b.mixed_tasks, 1);
        assert_eq!(b.total_errors(), 4);

        assert_eq!(b.top_categories(1), vec![(ErrorCategory::NameError, 2)]);
        assert!((b.tasks[0].error_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn correction_delta_tracks_improvements_and_regressions() {
        let before = run(vec![(
            "t0",
            vec![failed("NameError"), failed("NameError"), failed("TypeError")],
        )]);
        let after = run(vec![(
            "t0",
            vec![failed("NameError"), failed("ValueError"), Candidate::new("ok", Outcome::Passed)],
        )]);

        let delta = correction_delta(&before, &after);
        assert_eq!(delta.total_before, 3);
        assert_eq!(delta.total_after, 2);
        assert_eq!(delta.total_corrected, 1);
        assert!((delta.correction_rate_pct - 100.0 / 3.0).abs() < 1e-9);

        let name = delta
            .categories
            .iter()
            .find(|d| d.category == ErrorCategory::NameError)
            .unwrap();
        assert_eq!(name.improvement, 1);
        assert!((name.improvement_pct - 50.0).abs() < 1e-9);

        let value = delta
            .categories
            .iter()
            .find(|d| d.category == ErrorCategory::ValueError)
            .unwrap();
        assert_eq!(value.improvement, 0);
        assert_eq!(value.improvement_pct, 0.0);

        let improved: Vec<_> = delta.improved().iter().map(|d| d.category).collect();
        assert_eq!(improved, vec![ErrorCategory::TypeError, ErrorCategory::NameError]);
        assert!(delta.worsened().is_empty());
    }
}
