use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("naming pattern is empty")]
    Empty,
    #[error("unbalanced braces in naming pattern")]
    UnbalancedBraces,
    #[error("unknown placeholder: {{{0}}}")]
    UnknownPlaceholder(String),
    #[error("pattern produced an unusable file name: {0:?}")]
    UnsafeStem(String),
}

#[derive(Debug, Error)]
pub enum MetadataReadError {
    #[error("{tool} is not installed or not on PATH")]
    ToolNotFound { tool: &'static str },
    #[error("{tool} failed on {path}: {message}")]
    ToolFailed {
        tool: &'static str,
        path: PathBuf,
        message: String,
    },
    #[error("could not parse {tool} output: {message}")]
    Parse { tool: &'static str, message: String },
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum MoveError {
    #[error("destination directory does not exist: {0}")]
    Destination(PathBuf),
    #[error("destination already holds {0}")]
    Occupied(PathBuf),
    #[error("file has no name: {0}")]
    NoFileName(PathBuf),
    #[error("move {from} -> {to} failed: {source}")]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
#[error("could not write sidecar {path}: {source}")]
pub struct SidecarWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Why an asset was left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    Metadata(String),
    Collision(PathBuf),
    Cancelled,
}

/// Why an asset was (partially) processed but did not finish cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    Filesystem(String),
    Destination(String),
    Move(String),
    Sidecar(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum UndoFailure {
    Missing(PathBuf),
    Occupied(PathBuf),
    Filesystem(String),
}

impl From<MoveError> for FailureReason {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::Destination(_) => FailureReason::Destination(err.to_string()),
            other => FailureReason::Move(other.to_string()),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Metadata(msg) => write!(f, "metadata: {msg}"),
            SkipReason::Collision(path) => write!(f, "collision: {} exists", path.display()),
            SkipReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Filesystem(msg) => write!(f, "filesystem: {msg}"),
            FailureReason::Destination(msg) => write!(f, "destination: {msg}"),
            FailureReason::Move(msg) => write!(f, "move: {msg}"),
            FailureReason::Sidecar(msg) => write!(f, "sidecar: {msg}"),
        }
    }
}

impl fmt::Display for UndoFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndoFailure::Missing(path) => write!(f, "missing: {}", path.display()),
            UndoFailure::Occupied(path) => write!(f, "occupied: {}", path.display()),
            UndoFailure::Filesystem(msg) => write!(f, "filesystem: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_move_error_maps_to_destination_reason() {
        let reason = FailureReason::from(MoveError::Destination(PathBuf::from("/nope")));
        assert!(matches!(reason, FailureReason::Destination(_)));

        let reason = FailureReason::from(MoveError::Occupied(PathBuf::from("/dst/a.mkv")));
        assert!(matches!(reason, FailureReason::Move(_)));
    }

    #[test]
    fn unknown_placeholder_message_shows_braces() {
        let err = PatternError::UnknownPlaceholder("director".to_string());
        assert_eq!(err.to_string(), "unknown placeholder: {director}");
    }

    #[test]
    fn skip_reason_serializes_with_reason_code() {
        let json = serde_json::to_string(&SkipReason::Cancelled).expect("serialize");
        assert_eq!(json, r#"{"reason":"cancelled"}"#);
    }
}
