use std::fs;
use std::path::{Component, Path, PathBuf};

use console::style;

use crate::error::RewriteError;
use crate::git::HistoryRepo;
use crate::record::HistoryRecord;

/// Prefix of the temporary branch the history is rebuilt on.
const TEMP_PREFIX: &str = "temp-";

/// The record file, when it lives inside the working tree being rewritten.
///
/// Replay checks out whole historical trees, which may contain (and thereby
/// overwrite) a file at the same path. Holding the file's bytes lets the
/// replayer put the user's copy back after every checkout and keep it out of
/// every replayed commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInRepo {
    /// Location on disk, as given.
    pub path: PathBuf,
    /// Path relative to the repository root, `/`-separated.
    pub repo_path: String,
    /// File contents at the time `apply` started.
    pub contents: Vec<u8>,
}

impl RecordInRepo {
    /// Snapshots `record_path` if it lies inside the repository at `root`.
    ///
    /// Both paths are resolved (symlinks and `..` included) before comparing,
    /// so `<root>/../record.json` counts as outside.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(_))` for a record file inside the repository.
    /// * `Ok(None)` when the record lives elsewhere.
    /// * `Err(RewriteError::RecordRead)` if the file cannot be read.
    pub fn capture(root: &Path, record_path: &Path) -> Result<Option<Self>, RewriteError> {
        let Some(repo_path) = repo_relative(root, record_path) else {
            return Ok(None);
        };
        let contents = fs::read(record_path).map_err(|source| RewriteError::RecordRead {
            path: record_path.to_path_buf(),
            source,
        })?;
        Ok(Some(RecordInRepo {
            path: record_path.to_path_buf(),
            repo_path,
            contents,
        }))
    }

    /// Drops the record from the index and rewrites the captured bytes.
    fn shield<R: HistoryRepo + ?Sized>(&self, repo: &R) -> Result<(), RewriteError> {
        repo.untrack(std::slice::from_ref(&self.repo_path))?;
        fs::write(&self.path, &self.contents).map_err(|source| RewriteError::RecordWrite {
            path: self.path.clone(),
            source,
        })
    }
}

/// Rebuilds `record.branch` from the record's commits.
///
/// Steps:
/// 1. Create a uniquely named orphan branch (`temp-<now_millis>`).
/// 2. Remove all tracked content.
/// 3. For each entry, in stored order: restore the tree of `hash`, stage,
///    and commit with the entry's `date` and `message`.
/// 4. Delete the original branch and rename the new one to its name.
///
/// When `kept` is given, that file is removed from the index and restored
/// from its snapshot after every checkout, so it is never committed and the
/// user's edits survive.
///
/// There is no rollback: if a step fails, the temporary branch stays checked
/// out and the original branch is left as it was.
///
/// # Returns
///
/// The name the temporary branch had.
pub fn replay<R: HistoryRepo + ?Sized>(
    repo: &R,
    record: &HistoryRecord,
    kept: Option<&RecordInRepo>,
    now_millis: i64,
) -> Result<String, RewriteError> {
    println!(
        "Applying {} commits to branch {}",
        record.commits.len(),
        style(&record.branch).cyan().bold()
    );

    let temp = unique_branch_name(repo, now_millis)?;
    repo.checkout_orphan(&temp)?;
    repo.remove_all_tracked()?;
    if let Some(kept) = kept {
        kept.shield(repo)?;
    }

    for (i, commit) in record.commits.iter().enumerate() {
        repo.checkout_tree(&commit.hash)?;
        if let Some(kept) = kept {
            kept.shield(repo)?;
        }
        repo.stage_all()?;
        repo.commit_with_date(&commit.date, &commit.message)?;
        println!(
            "  [{}/{}] {} {}",
            i + 1,
            record.commits.len(),
            style(&commit.date).dim(),
            first_line(&commit.message)
        );
    }

    repo.delete_branch(&record.branch)?;
    repo.rename_current_branch(&record.branch)?;

    println!(
        "{}",
        style(format!("✅ Rewrote the history of {}.", record.branch))
            .green()
            .bold()
    );
    Ok(temp)
}

/// `temp-<millis>`, with a numeric suffix if that branch already exists.
pub(crate) fn unique_branch_name<R: HistoryRepo + ?Sized>(
    repo: &R,
    now_millis: i64,
) -> Result<String, RewriteError> {
    let base = format!("{TEMP_PREFIX}{now_millis}");
    if !repo.branch_exists(&base)? {
        return Ok(base);
    }
    let mut n = 1u32;
    loop {
        let candidate = format!("{base}-{n}");
        if !repo.branch_exists(&candidate)? {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// `path` relative to `root` as a `/`-separated string, or `None` when it is
/// not strictly inside `root`.
pub(crate) fn repo_relative(root: &Path, path: &Path) -> Option<String> {
    let root = resolve(root);
    let path = resolve(path);
    let rel = path.strip_prefix(&root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Canonical form of `path`, or its lexically normalized form when it does
/// not exist.
fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| normalize(path))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}
