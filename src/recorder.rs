use std::path::Path;

use console::style;

use crate::error::RewriteError;
use crate::git::{HistoryRepo, LogEntry};
use crate::record::{CommitEntry, HistoryRecord, dedup_by_date, format_date};

/// Captures the current branch's first-parent history into `record_path`.
///
/// Steps:
/// 1. Resolve the checked-out branch (a detached HEAD is fatal).
/// 2. Read its first-parent log, oldest first.
/// 3. Format each timestamp as a UTC second-precision date.
/// 4. Collapse commits sharing a date, keeping the latest one.
/// 5. Write the record, replacing any previous file.
///
/// The written record is also returned.
///
/// # Errors
///
/// Any git failure, an unrepresentable timestamp, or a failed write.
pub fn generate_record<R: HistoryRepo + ?Sized>(
    repo: &R,
    record_path: &Path,
) -> Result<HistoryRecord, RewriteError> {
    let branch = repo.current_branch()?;
    println!("Current branch: {}", style(&branch).cyan().bold());

    let log = repo.first_parent_log(&branch)?;
    println!("Read {} commits from {}", log.len(), branch);

    let record = build_record(branch, log)?;
    println!("{} commits left after merging same-second commits", record.commits.len());

    record.save(record_path)?;
    println!(
        "{}",
        style(format!("Commit record written to {}", record_path.display())).green()
    );

    Ok(record)
}

/// Turns raw log entries into a deduplicated record for `branch`.
pub fn build_record(branch: String, log: Vec<LogEntry>) -> Result<HistoryRecord, RewriteError> {
    let entries = log
        .into_iter()
        .map(|e| {
            Ok(CommitEntry {
                date: format_date(e.timestamp)?,
                hash: e.hash,
                message: e.message,
            })
        })
        .collect::<Result<Vec<_>, RewriteError>>()?;

    Ok(HistoryRecord {
        branch,
        commits: dedup_by_date(entries),
    })
}
