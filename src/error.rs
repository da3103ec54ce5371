use std::path::PathBuf;

use thiserror::Error;

/// Every failure the recorder, replayer or CLI can surface.
///
/// None of these are recovered from: they bubble up to [`crate::cli::entry`],
/// which prints the message and exits non-zero.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("`git` not found in PATH")]
    GitNotFound,
    #[error("command failed: `{command}`: {message}")]
    Git { command: String, message: String },
    #[error("could not run `{command}`: {message}")]
    Spawn { command: String, message: String },
    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,
    #[error("unreadable git log entry: {0}")]
    LogParse(String),
    #[error("timestamp {0} is outside the representable date range")]
    DateOutOfRange(i64),
    #[error("cannot read record file {}: {source}", path.display())]
    RecordRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid record file {}: {source}", path.display())]
    RecordParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("cannot write record file {}: {source}", path.display())]
    RecordWrite {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("prompt error: {0}")]
    Prompt(String),
}
