//! Throwaway git repositories for tests that need a real `git`.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use crate::error::RewriteError;
use crate::git::{HistoryRepo, LogEntry};

pub(crate) fn git_available() -> bool {
    which::which("git").is_ok()
}

pub(crate) struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Empty repository with `main` as the unborn branch and a local identity.
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let repo = TestRepo { dir };
        repo.git(&["init", "-q"]);
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        repo.git(&["config", "user.name", "Test User"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Runs git in the repository, panicking on failure, and returns stdout.
    pub(crate) fn git(&self, args: &[&str]) -> String {
        self.git_at(args, None)
    }

    fn git_at(&self, args: &[&str], timestamp: Option<i64>) -> String {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(self.path());
        if let Some(ts) = timestamp {
            let stamp = format!("@{ts} +0000");
            cmd.env("GIT_AUTHOR_DATE", &stamp);
            cmd.env("GIT_COMMITTER_DATE", &stamp);
        }
        let out = cmd.output().expect("failed to spawn git");
        assert!(
            out.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&out.stderr)
        );
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    /// Writes `name`, commits everything at `timestamp` and returns the hash.
    pub(crate) fn commit_file(
        &self,
        name: &str,
        body: &str,
        message: &str,
        timestamp: i64,
    ) -> String {
        fs::write(self.path().join(name), body).expect("failed to write file");
        self.commit_all(message, timestamp)
    }

    /// Deletes `name`, commits at `timestamp` and returns the hash.
    pub(crate) fn remove_file(&self, name: &str, message: &str, timestamp: i64) -> String {
        fs::remove_file(self.path().join(name)).expect("failed to remove file");
        self.commit_all(message, timestamp)
    }

    pub(crate) fn commit_all(&self, message: &str, timestamp: i64) -> String {
        self.git(&["add", "--all"]);
        self.git_at(
            &["commit", "-q", "--allow-empty", "-m", message],
            Some(timestamp),
        );
        self.git(&["rev-parse", "HEAD"])
    }

    pub(crate) fn merge(&self, branch: &str, message: &str, timestamp: i64) -> String {
        self.git_at(&["merge", "-q", "--no-ff", "-m", message, branch], Some(timestamp));
        self.git(&["rev-parse", "HEAD"])
    }

    /// Tree id of a revision.
    pub(crate) fn tree_of(&self, rev: &str) -> String {
        let spec = format!("{rev}^{{tree}}");
        self.git(&["rev-parse", spec.as_str()])
    }
}

/// In-memory [`HistoryRepo`] that records every mutating call.
pub(crate) struct FakeRepo {
    pub(crate) branch: Option<String>,
    pub(crate) log: Vec<LogEntry>,
    pub(crate) branches: RefCell<Vec<String>>,
    pub(crate) calls: RefCell<Vec<String>>,
    /// Calls starting with this text fail with a git error.
    pub(crate) fail_on: Option<String>,
}

impl FakeRepo {
    pub(crate) fn on_branch(branch: &str, log: Vec<LogEntry>) -> Self {
        FakeRepo {
            branch: Some(branch.to_string()),
            log,
            branches: RefCell::new(vec![branch.to_string()]),
            calls: RefCell::new(Vec::new()),
            fail_on: None,
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) -> Result<(), RewriteError> {
        let failing = matches!(&self.fail_on, Some(prefix) if call.starts_with(prefix.as_str()));
        self.calls.borrow_mut().push(call.clone());
        if failing {
            return Err(RewriteError::Git {
                command: call,
                message: String::from("simulated failure"),
            });
        }
        Ok(())
    }
}

impl HistoryRepo for FakeRepo {
    fn current_branch(&self) -> Result<String, RewriteError> {
        self.branch.clone().ok_or(RewriteError::DetachedHead)
    }

    fn first_parent_log(&self, _branch: &str) -> Result<Vec<LogEntry>, RewriteError> {
        Ok(self.log.clone())
    }

    fn branch_exists(&self, name: &str) -> Result<bool, RewriteError> {
        Ok(self.branches.borrow().iter().any(|b| b == name))
    }

    fn checkout_orphan(&self, name: &str) -> Result<(), RewriteError> {
        self.record(format!("orphan {name}"))?;
        self.branches.borrow_mut().push(name.to_string());
        Ok(())
    }

    fn remove_all_tracked(&self) -> Result<(), RewriteError> {
        self.record(String::from("rm"))
    }

    fn checkout_tree(&self, hash: &str) -> Result<(), RewriteError> {
        self.record(format!("tree {hash}"))
    }

    fn untrack(&self, paths: &[String]) -> Result<(), RewriteError> {
        self.record(format!("untrack {}", paths.join(",")))
    }

    fn stage_all(&self) -> Result<(), RewriteError> {
        self.record(String::from("add"))
    }

    fn commit_with_date(&self, date: &str, message: &str) -> Result<(), RewriteError> {
        self.record(format!("commit {date} {message}"))
    }

    fn delete_branch(&self, name: &str) -> Result<(), RewriteError> {
        self.record(format!("delete {name}"))
    }

    fn rename_current_branch(&self, name: &str) -> Result<(), RewriteError> {
        self.record(format!("rename {name}"))
    }
}
