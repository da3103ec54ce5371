use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::RewriteError;

/// Default location of the record file, relative to the repository root.
pub const RECORD_FILE: &str = "commit_record.json";

/// Layout of every `date` field: UTC, whole seconds, no offset suffix.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One commit kept for replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEntry {
    /// Original commit id; only used to fetch the tree to restore.
    pub hash: String,
    /// Message given verbatim to the replayed commit.
    pub message: String,
    /// Replay date and dedup key, formatted with [`DATE_FORMAT`].
    pub date: String,
}

/// The editable document written by `generate` and consumed by `apply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub branch: String,
    /// Replay order, oldest first.
    pub commits: Vec<CommitEntry>,
}

impl HistoryRecord {
    /// Reads and parses a record file.
    ///
    /// # Errors
    ///
    /// * [`RewriteError::RecordRead`] if the file is missing or unreadable.
    /// * [`RewriteError::RecordParse`] if it is not a valid record document.
    pub fn load(path: &Path) -> Result<Self, RewriteError> {
        let body = fs::read_to_string(path).map_err(|source| RewriteError::RecordRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| RewriteError::RecordParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the record as pretty-printed JSON, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), RewriteError> {
        let mut body = serde_json::to_string_pretty(self).map_err(|e| RewriteError::RecordWrite {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;
        body.push('\n');
        fs::write(path, body).map_err(|source| RewriteError::RecordWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Formats a unix timestamp as `YYYY-MM-DD HH:MM:SS` in UTC.
///
/// # Examples
///
/// ```
/// use git_history_rewrite::record::format_date;
///
/// assert_eq!(format_date(0).unwrap(), "1970-01-01 00:00:00");
/// ```
pub fn format_date(timestamp: i64) -> Result<String, RewriteError> {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => Ok(dt.format(DATE_FORMAT).to_string()),
        None => Err(RewriteError::DateOutOfRange(timestamp)),
    }
}

/// Collapses entries that share a `date`.
///
/// Behaves like inserting every entry into an insertion-ordered map keyed by
/// date: a key stays where it first appeared, but holds the last entry
/// written to it.
pub fn dedup_by_date(entries: Vec<CommitEntry>) -> Vec<CommitEntry> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<CommitEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        match slots.get(&entry.date) {
            Some(&idx) => kept[idx] = entry,
            None => {
                slots.insert(entry.date.clone(), kept.len());
                kept.push(entry);
            }
        }
    }

    kept
}
