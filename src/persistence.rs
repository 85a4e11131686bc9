//! Reading run results and writing reports.
//!
//! The results document is the one the generation harness writes: a list
//! of tasks, each with the responses produced for it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::compare::TaskInput;
use crate::error::EvalError;
use crate::types::{Candidate, Outcome};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsTask {
    pub task_id: String,
    #[serde(default)]
    pub responses: Vec<ResultsResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsResponse {
    #[serde(default)]
    pub code: String,
    pub test_result: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    /// Sampling configuration label, set by parameter-sweep runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_params: Option<ModelParams>,
}

/// Sampling parameters a response was generated with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i64>,
}

impl From<ResultsResponse> for Candidate {
    fn from(r: ResultsResponse) -> Self {
        Candidate {
            source_text: r.code,
            outcome: r.test_result,
            failure_detail: r.traceback.filter(|t| !t.trim().is_empty()),
        }
    }
}

impl From<ResultsTask> for TaskInput {
    fn from(t: ResultsTask) -> Self {
        (
            t.task_id,
            t.responses.into_iter().map(Candidate::from).collect(),
        )
    }
}

/// Load a results file, or every `*.json` under a directory.
///
/// Tasks from a directory are namespaced by file stem (`exp_1/HumanEval_0`)
/// so runs of the same benchmark do not collide.
pub fn load_results(path: &Path) -> Result<Vec<TaskInput>, EvalError> {
    Ok(load_results_documents(path)?
        .into_iter()
        .map(TaskInput::from)
        .collect())
}

/// Raw results documents, keeping per-response generation settings.
pub fn load_results_documents(path: &Path) -> Result<Vec<ResultsTask>, EvalError> {
    if !path.is_dir() {
        return read_results_file(path);
    }

    let files = json_files_under(path);
    if files.is_empty() {
        return Err(EvalError::NoResults(path.to_path_buf()));
    }

    let mut out = Vec::new();
    for file in files {
        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("results")
            .to_string();
        for mut task in read_results_file(&file)? {
            task.task_id = format!("{stem}/{}", task.task_id);
            out.push(task);
        }
    }

    Ok(out)
}

fn read_results_file(path: &Path) -> Result<Vec<ResultsTask>, EvalError> {
    let raw = fs::read_to_string(path).map_err(|source| EvalError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let tasks: Vec<ResultsTask> =
        serde_json::from_str(&raw).map_err(|source| EvalError::Results {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!(path = %path.display(), tasks = tasks.len(), "loaded results");
    Ok(tasks)
}

/// Sorted `*.json` files under `dir`. Entries that cannot be read are
/// logged and skipped.
fn json_files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    files.sort();
    files
}

pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), EvalError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| EvalError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).map_err(|source| EvalError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), "report written");
    Ok(())
}

/// `reports/analysis_<input file name>`
pub fn default_report_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| if n.ends_with(".json") { n.to_string() } else { format!("{n}.json") })
        .unwrap_or_else(|| "results.json".to_string());

    PathBuf::from("reports").join(format!("analysis_{name}"))
}
