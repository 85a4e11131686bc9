use std::fmt;

use serde::{Deserialize, Serialize};

/* ---------- candidates ---------- */

/// Result of running a candidate against the task's checks.
///
/// Anything other than `Passed` counts as a semantic failure. Upstream
/// tags the engine does not know about are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Outcome {
    Passed,
    Failed,
    Timeout,
    Other(String),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
            Outcome::Timeout => "timeout",
            Outcome::Other(tag) => tag,
        }
    }
}

impl From<&str> for Outcome {
    fn from(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "passed" => Outcome::Passed,
            "failed" => Outcome::Failed,
            "timeout" => Outcome::Timeout,
            _ => Outcome::Other(label.trim().to_string()),
        }
    }
}

impl From<String> for Outcome {
    fn from(label: String) -> Self {
        Outcome::from(label.as_str())
    }
}

impl From<Outcome> for String {
    fn from(outcome: Outcome) -> Self {
        outcome.as_str().to_string()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated artifact for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub source_text: String,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_detail: Option<String>,
}

impl Candidate {
    pub fn new(source_text: impl Into<String>, outcome: impl Into<Outcome>) -> Self {
        Self {
            source_text: source_text.into(),
            outcome: outcome.into(),
            failure_detail: None,
        }
    }

    pub fn with_failure_detail(mut self, detail: impl Into<String>) -> Self {
        self.failure_detail = Some(detail.into());
        self
    }
}

/* ---------- structure ---------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub arg_count: usize,
    pub decorator_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub base_count: usize,
}

/// Construct-level fingerprint of one candidate.
///
/// All lists are in breadth-first order over the syntax tree. A candidate
/// that does not parse yields `StructuralSummary::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralSummary {
    pub function_defs: Vec<FunctionDef>,
    pub classes: Vec<ClassDef>,
    pub imports: Vec<String>,
    pub control_flow: Vec<String>,
    pub expressions: Vec<String>,
}

impl StructuralSummary {
    pub fn is_empty(&self) -> bool {
        self.function_defs.is_empty()
            && self.classes.is_empty()
            && self.imports.is_empty()
            && self.control_flow.is_empty()
            && self.expressions.is_empty()
    }
}

/* ---------- pairwise ---------- */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseResult {
    /// Candidate indices, always `pair.0 < pair.1`.
    pub pair: (usize, usize),
    pub exact_match: bool,
    pub similarity_ratio: f64,
    pub token_similarity: f64,
    pub length_diff: usize,
    pub structure_similarity: f64,
    pub function_count_diff: usize,
    pub import_count_diff: usize,
    pub digest_left: String,
    pub digest_right: String,
}

/* ---------- task + corpus ---------- */

/// Outcome agreement across one task's candidates.
///
/// `semantic_consistency` holds when every candidate has the same outcome,
/// whatever it is. `all_passed` and `all_failed` name the two labelled
/// cases only: a task where every candidate timed out is consistent with
/// both flags false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticSummary {
    pub passed_count: usize,
    /// Literal `failed` outcomes; timeouts and other tags are not counted.
    pub failed_count: usize,
    pub total_count: usize,
    pub success_rate: f64,
    pub semantic_consistency: bool,
    pub all_passed: bool,
    /// Every outcome is literally `failed`.
    pub all_failed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub total_candidates: usize,
    pub exact_match_count: usize,
    pub avg_syntax_similarity: f64,
    pub avg_token_similarity: f64,
    pub avg_structure_similarity: f64,
    pub non_determinism_score: f64,
    pub semantic: SemanticSummary,
    pub pairs: Vec<PairwiseResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAnalysis {
    pub task_id: String,
    #[serde(flatten)]
    pub summary: TaskSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_tasks: usize,
    pub avg_non_determinism_score: f64,
    pub avg_success_rate: f64,
    pub avg_structure_similarity: f64,
    pub consistent_task_count: usize,
    pub inconsistent_task_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusReport {
    pub task_analyses: Vec<TaskAnalysis>,
    /// `None` when no task had enough candidates; serialized as `{}`.
    #[serde(with = "empty_map_when_none")]
    pub aggregate_stats: Option<AggregateStats>,
}

impl CorpusReport {
    pub fn total_tasks(&self) -> usize {
        self.task_analyses.len()
    }

    pub fn find_task(&self, task_id: &str) -> Option<&TaskAnalysis> {
        self.task_analyses.iter().find(|t| t.task_id == task_id)
    }
}

mod empty_map_when_none {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::{Map, Value};

    use super::AggregateStats;

    pub fn serialize<S: Serializer>(
        value: &Option<AggregateStats>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(stats) => stats.serialize(s),
            None => Map::new().serialize(s),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<AggregateStats>, D::Error> {
        let raw = Value::deserialize(d)?;
        match &raw {
            Value::Null => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            _ => serde_json::from_value(raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels_round_trip() {
        assert_eq!(Outcome::from("passed"), Outcome::Passed);
        assert_eq!(Outcome::from(" Timeout "), Outcome::Timeout);
        assert_eq!(
            Outcome::from("import_error"),
            Outcome::Other("import_error".to_string())
        );
        assert_eq!(String::from(Outcome::Failed), "failed");
    }

    #[test]
    fn empty_report_serializes_empty_aggregate_map() {
        let report = CorpusReport::default();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["task_analyses"], serde_json::json!([]));
        assert_eq!(json["aggregate_stats"], serde_json::json!({}));

        let back: CorpusReport = serde_json::from_value(json).unwrap();
        assert!(back.aggregate_stats.is_none());
    }

    #[test]
    fn candidate_deserializes_without_detail() {
        let c: Candidate =
            serde_json::from_str(r#"{"source_text":"x = 1","outcome":"failed"}"#).unwrap();
        assert_eq!(c.outcome, Outcome::Failed);
        assert!(c.failure_detail.is_none());
    }
}
