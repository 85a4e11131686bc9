//! Errors from the glue around the engine. The engine itself is total.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid results document {}: {source}", .path.display())]
    Results {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no results files found under {}", .0.display())]
    NoResults(PathBuf),

    #[error("task {0} not found")]
    UnknownTask(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn read_error_names_the_path() {
        let err = EvalError::Read {
            path: PathBuf::from("runs/exp_1.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "failed to read runs/exp_1.json: missing");
    }

    #[test]
    fn unknown_task_message() {
        let err = EvalError::UnknownTask("HumanEval_7".into());
        assert_eq!(err.to_string(), "task HumanEval_7 not found");
    }
}
