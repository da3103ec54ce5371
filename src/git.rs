use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::error::RewriteError;

/// Field separator inside one log record (ASCII unit separator).
const FIELD_SEP: char = '\u{1f}';

/// `git log` format: hash, committer timestamp, then the raw message, which
/// runs to the end of the record so it may hold any character.
const LOG_FORMAT: &str = "--format=%H%x1f%ct%x1f%B";

/// One first-parent commit as reported by `git log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub hash: String,
    pub message: String,
    pub timestamp: i64,
}

/// The version-control operations the recorder and replayer rely on.
///
/// [`Git`] is the real implementation; tests substitute a recording fake.
/// Every method runs to completion before returning, and any failure is
/// reported as a [`RewriteError`].
pub trait HistoryRepo {
    /// Name of the checked-out branch. Fails on a detached HEAD.
    fn current_branch(&self) -> Result<String, RewriteError>;

    /// First-parent history of `branch`, oldest first.
    fn first_parent_log(&self, branch: &str) -> Result<Vec<LogEntry>, RewriteError>;

    /// Whether a local branch called `name` exists.
    fn branch_exists(&self, name: &str) -> Result<bool, RewriteError>;

    /// Switches to a new parentless branch named `name`.
    fn checkout_orphan(&self, name: &str) -> Result<(), RewriteError>;

    /// Removes every tracked file from the index and the working tree.
    fn remove_all_tracked(&self) -> Result<(), RewriteError>;

    /// Makes index and working tree match the tree of `hash` exactly.
    fn checkout_tree(&self, hash: &str) -> Result<(), RewriteError>;

    /// Drops `paths` (relative to the repository root) from the index,
    /// leaving the working tree alone. Paths that are not tracked are ignored.
    fn untrack(&self, paths: &[String]) -> Result<(), RewriteError>;

    /// Stages modifications and deletions of tracked files.
    ///
    /// Untracked files are never picked up, so stray files in the working
    /// tree do not leak into replayed commits.
    fn stage_all(&self) -> Result<(), RewriteError>;

    /// Commits the index with author and committer date set to `date` (UTC).
    fn commit_with_date(&self, date: &str, message: &str) -> Result<(), RewriteError>;

    /// Force-deletes the local branch `name`.
    fn delete_branch(&self, name: &str) -> Result<(), RewriteError>;

    /// Renames the current branch to `name`.
    fn rename_current_branch(&self, name: &str) -> Result<(), RewriteError>;
}

/// A repository driven through the `git` executable.
///
/// Every command runs with `workdir` as its current directory, so the process
/// working directory is never consulted.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    /// Creates a handle whose commands all run inside `workdir`.
    ///
    /// No git command is run here; a directory outside any repository only
    /// fails on first use.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Ignored because it requires a Git repository.
    /// use git_history_rewrite::git::{Git, HistoryRepo};
    ///
    /// let git = Git::new("/path/to/repo");
    /// println!("on {}", git.current_branch()?);
    /// ```
    pub fn new(workdir: impl AsRef<Path>) -> Self {
        Self {
            workdir: workdir.as_ref().to_path_buf(),
        }
    }

    /// The directory commands run in.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Absolute path of the repository root (`git rev-parse --show-toplevel`).
    pub fn show_toplevel(&self) -> Result<PathBuf, RewriteError> {
        self.run(&["rev-parse", "--show-toplevel"], &[])
            .map(PathBuf::from)
    }

    fn command(&self, args: &[&str], envs: &[(&str, &str)]) -> Command {
        let mut cmd = Command::new("git");
        cmd.args(args);
        cmd.envs(envs.iter().copied());
        cmd.current_dir(&self.workdir);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }

    /// Runs git and hands back its raw output, whatever the exit status.
    ///
    /// # Returns
    ///
    /// * `Ok(Output)` once the process has finished.
    /// * `Err(RewriteError::Spawn)` if `git` could not be started.
    fn spawn(&self, args: &[&str], envs: &[(&str, &str)]) -> Result<Output, RewriteError> {
        self.command(args, envs)
            .output()
            .map_err(|e| RewriteError::Spawn {
                command: display_command(args),
                message: e.to_string(),
            })
    }

    /// Runs git and returns its trimmed standard output.
    ///
    /// # Parameters
    ///
    /// * `args` – Arguments after `git`.
    /// * `envs` – Extra environment variables for this invocation only.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` with trimmed `stdout` on a zero exit status.
    /// * `Err(RewriteError::Git)` naming the command and carrying its trimmed
    ///   `stderr` (or the exit status when stderr is empty) otherwise.
    fn run(&self, args: &[&str], envs: &[(&str, &str)]) -> Result<String, RewriteError> {
        let out = self.spawn(args, envs)?;
        if out.status.success() {
            Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
        } else {
            Err(RewriteError::Git {
                command: display_command(args),
                message: failure_message(&out),
            })
        }
    }
}

impl HistoryRepo for Git {
    /// Runs `git rev-parse --abbrev-ref HEAD`.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` with the branch name.
    /// * `Err(RewriteError::DetachedHead)` when git answers `HEAD`.
    /// * `Err(RewriteError::Git)` on an unborn branch or outside a repository.
    fn current_branch(&self) -> Result<String, RewriteError> {
        let branch = self.run(&["rev-parse", "--abbrev-ref", "HEAD"], &[])?;
        if branch == "HEAD" {
            return Err(RewriteError::DetachedHead);
        }
        Ok(branch)
    }

    /// Runs `git log --first-parent --reverse -z` with a separator-safe
    /// format and parses the result with [`parse_log`].
    fn first_parent_log(&self, branch: &str) -> Result<Vec<LogEntry>, RewriteError> {
        let raw = self.run(
            &["log", "--first-parent", "--reverse", "-z", LOG_FORMAT, branch, "--"],
            &[],
        )?;
        parse_log(&raw)
    }

    /// Runs `git rev-parse --verify --quiet refs/heads/<name>`.
    ///
    /// A non-zero exit means "no such branch" and is not an error.
    fn branch_exists(&self, name: &str) -> Result<bool, RewriteError> {
        let refname = format!("refs/heads/{name}");
        let out = self.spawn(&["rev-parse", "--verify", "--quiet", refname.as_str()], &[])?;
        Ok(out.status.success())
    }

    fn checkout_orphan(&self, name: &str) -> Result<(), RewriteError> {
        self.run(&["checkout", "--quiet", "--orphan", name], &[])
            .map(|_| ())
    }

    fn remove_all_tracked(&self) -> Result<(), RewriteError> {
        self.run(&["rm", "-r", "-f", "--quiet", "--ignore-unmatch", "--", "."], &[])
            .map(|_| ())
    }

    fn checkout_tree(&self, hash: &str) -> Result<(), RewriteError> {
        // `read-tree -u --reset` also drops files the target tree lacks,
        // which `checkout <hash> -- .` would leave behind.
        self.run(&["read-tree", "-u", "--reset", hash], &[])
            .map(|_| ())
    }

    fn untrack(&self, paths: &[String]) -> Result<(), RewriteError> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["rm", "--cached", "--quiet", "--ignore-unmatch", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args, &[]).map(|_| ())
    }

    fn stage_all(&self) -> Result<(), RewriteError> {
        self.run(&["add", "--update", "--", "."], &[]).map(|_| ())
    }

    /// Runs `git commit` with `--date` and `GIT_COMMITTER_DATE` set to
    /// `"<date> +0000"`.
    ///
    /// The message is kept byte for byte (`--cleanup=verbatim`), empty trees
    /// and empty messages are accepted, and commit hooks are skipped.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Ignored because it requires a Git repository with staged content.
    /// git.commit_with_date("2023-11-14 22:13:20", "Initial import")?;
    /// ```
    fn commit_with_date(&self, date: &str, message: &str) -> Result<(), RewriteError> {
        let stamp = format!("{date} +0000");
        let date_arg = format!("--date={stamp}");
        self.run(
            &[
                "commit",
                "--quiet",
                "--no-verify",
                "--allow-empty",
                "--allow-empty-message",
                "--cleanup=verbatim",
                date_arg.as_str(),
                "-m",
                message,
            ],
            &[("GIT_COMMITTER_DATE", stamp.as_str())],
        )
        .map(|_| ())
    }

    /// Runs `git branch -D <name>`; fails if `name` is checked out.
    fn delete_branch(&self, name: &str) -> Result<(), RewriteError> {
        self.run(&["branch", "-D", name], &[]).map(|_| ())
    }

    fn rename_current_branch(&self, name: &str) -> Result<(), RewriteError> {
        self.run(&["branch", "-m", name], &[]).map(|_| ())
    }
}

/// Splits `git log -z` output into entries.
///
/// Records are NUL-terminated; within a record the first two fields are
/// separated by `0x1f` and everything after the second separator is the
/// message, with git's trailing newline removed.
pub(crate) fn parse_log(raw: &str) -> Result<Vec<LogEntry>, RewriteError> {
    raw.split('\0')
        .map(|record| record.trim_start_matches('\n'))
        .filter(|record| !record.is_empty())
        .map(parse_record)
        .collect()
}

fn parse_record(record: &str) -> Result<LogEntry, RewriteError> {
    let mut fields = record.splitn(3, FIELD_SEP);
    let (Some(hash), Some(ts), Some(message)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(RewriteError::LogParse(record.to_string()));
    };

    let timestamp = ts
        .trim()
        .parse::<i64>()
        .map_err(|_| RewriteError::LogParse(format!("bad timestamp `{ts}` for {hash}")))?;

    Ok(LogEntry {
        hash: hash.trim().to_string(),
        message: message.trim_end_matches('\n').to_string(),
        timestamp,
    })
}

fn display_command(args: &[&str]) -> String {
    let mut s = String::from("git");
    for a in args {
        s.push(' ');
        if a.is_empty() || a.contains(char::is_whitespace) {
            s.push('"');
            s.push_str(a);
            s.push('"');
        } else {
            s.push_str(a);
        }
    }
    s
}

fn failure_message(out: &Output) -> String {
    let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    match out.status.code() {
        Some(code) => format!("exited with status {code}"),
        None => String::from("terminated by signal"),
    }
}
