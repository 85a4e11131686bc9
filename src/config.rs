use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

pub const LOG_ENV: &str = "NONDET_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Tasks with fewer candidates are left out of the report. Never
    /// below 2: a single candidate has no pairs.
    #[serde(default = "default_min_candidates")]
    pub min_candidates: usize,
    /// Pairs shown per task in the printed summary.
    #[serde(default = "default_preview_pairs")]
    pub preview_pairs: usize,
    /// Error categories shown in the printed failure breakdown.
    #[serde(default = "default_top_errors")]
    pub top_errors: usize,
    /// Warn when a task has more candidates than this.
    #[serde(default = "default_pair_warning_threshold")]
    pub pair_warning_threshold: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            min_candidates: default_min_candidates(),
            preview_pairs: default_preview_pairs(),
            top_errors: default_top_errors(),
            pair_warning_threshold: default_pair_warning_threshold(),
            log_level: default_log_level(),
        }
    }
}

impl EvalConfig {
    pub fn min_candidates(&self) -> usize {
        self.min_candidates.max(2)
    }

    /// Explicit path must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, EvalError> {
        match path {
            Some(p) => Self::load_from(p),
            None => {
                let default = config_path();
                if default.exists() {
                    Self::load_from(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, EvalError> {
        let raw = fs::read_to_string(path).map_err(|source| EvalError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| EvalError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `NONDET_LOG` wins over the configured level.
    pub fn effective_log_level(&self) -> String {
        std::env::var(LOG_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.log_level.clone())
    }
}

fn default_min_candidates() -> usize {
    2
}

fn default_preview_pairs() -> usize {
    3
}

fn default_top_errors() -> usize {
    5
}

fn default_pair_warning_threshold() -> usize {
    32
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn config_path() -> PathBuf {
    let mut dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.push("nondet-eval");
    dir.push("config.toml");
    dir
}
