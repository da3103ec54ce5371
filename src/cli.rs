use crate::banner::print_banner;
use crate::error::RewriteError;
use crate::git::Git;
use crate::record::{HistoryRecord, RECORD_FILE};
use crate::replayer::RecordInRepo;
use crate::{prompt, recorder, replayer};

use console::{Term, style};
use std::{
    env,
    path::{Path, PathBuf},
};

/// Which phase to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Generate,
    Apply,
}

/// Settings for a `generate` or `apply` run.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    mode: Mode,
    /// `-C <dir>`; defaults to the current directory.
    repo: Option<PathBuf>,
    /// `--record <path>`; relative paths resolve against the repository root.
    record: Option<PathBuf>,
    /// `--yes`: skip the confirmation before `apply`.
    yes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Invocation {
    Help,
    Version,
    Usage,
    Run(Options),
}

/// Interprets the arguments that follow the program name.
///
/// Anything that is not a well-formed `generate`/`apply` invocation falls
/// back to [`Invocation::Usage`], which is not an error.
fn parse_args(args: &[String]) -> Invocation {
    if args.iter().any(|a| a == "--help" || a == "-h") {
        return Invocation::Help;
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        return Invocation::Version;
    }

    let mode = match args.first().map(String::as_str) {
        Some("generate") => Mode::Generate,
        Some("apply") => Mode::Apply,
        _ => return Invocation::Usage,
    };

    let mut opts = Options {
        mode,
        repo: None,
        record: None,
        yes: false,
    };

    let mut rest = args[1..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "-C" | "--repo" => match rest.next() {
                Some(v) => opts.repo = Some(PathBuf::from(v)),
                None => return Invocation::Usage,
            },
            "--record" => match rest.next() {
                Some(v) => opts.record = Some(PathBuf::from(v)),
                None => return Invocation::Usage,
            },
            "-y" | "--yes" if mode == Mode::Apply => opts.yes = true,
            _ => return Invocation::Usage,
        }
    }

    Invocation::Run(opts)
}

/// Verifies git is available and returns a handle on the repository root.
fn verify_environment(repo: Option<&Path>) -> Result<Git, RewriteError> {
    if which::which("git").is_err() {
        return Err(RewriteError::GitNotFound);
    }

    let start = Git::new(repo.unwrap_or_else(|| Path::new(".")));
    let root = start.show_toplevel()?;
    Ok(Git::new(root))
}

/// Location of the record file for a repository rooted at `root`.
fn resolve_record_path(root: &Path, record: Option<&Path>) -> PathBuf {
    match record {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => root.join(p),
        None => root.join(RECORD_FILE),
    }
}

/// Whether `apply` should stop and ask before rewriting.
///
/// Never without a terminal to answer on: the prompt could only fail there.
fn needs_confirmation(yes: bool, interactive: bool) -> bool {
    !yes && interactive
}

/// The two-line usage text shown for a missing or unknown mode.
fn usage_text() -> &'static str {
    "\
Usage: git-history-rewrite [generate|apply]
generate: write the commit record file; apply [--yes]: replay the edited record"
}

/// Prints usage information to stdout.
fn print_help() {
    println!(
        "\
git-history-rewrite {}

Rewrite the commit dates and order of a branch through an editable record.

USAGE:
    git-history-rewrite generate [OPTIONS]
    git-history-rewrite apply [OPTIONS]

MODES:
    generate         Record the current branch's first-parent history
                     (commits in the same second are merged, the latest wins)
    apply            Rebuild the recorded branch from the (edited) record

OPTIONS:
    -C, --repo <dir>     Repository to operate on (default: current directory)
    --record <path>      Record file (default: {} in the repository root)
    -y, --yes            apply: do not ask for confirmation
                         (never asked without a terminal)
    -h, --help           Print help information
    -V, --version        Print version information",
        env!("CARGO_PKG_VERSION"),
        RECORD_FILE
    );
}

fn run_generate(git: &Git, record_path: &Path) -> Result<i32, RewriteError> {
    recorder::generate_record(git, record_path)?;
    Ok(0)
}

fn run_apply(git: &Git, record_path: &Path, yes: bool) -> Result<i32, RewriteError> {
    let record = HistoryRecord::load(record_path)?;
    let kept = RecordInRepo::capture(git.workdir(), record_path)?;

    print_banner(&record.branch, record.commits.len(), record_path);

    if needs_confirmation(yes, Term::stderr().is_term()) {
        let mut confirm_prompter = prompt::DialoguerConfirmPrompter;
        let confirmed =
            prompt::confirm_apply(&mut confirm_prompter, &record.branch, record.commits.len())
                .map_err(RewriteError::Prompt)?;
        if !confirmed {
            println!(
                "{}",
                style("Canceled by user. No changes made.").yellow().bold()
            );
            return Ok(0);
        }
    }

    let now_millis = chrono::Utc::now().timestamp_millis();
    replayer::replay(git, &record, kept.as_ref(), now_millis)?;
    Ok(0)
}

fn run(opts: &Options) -> Result<i32, RewriteError> {
    let git = verify_environment(opts.repo.as_deref())?;
    let record_path = resolve_record_path(git.workdir(), opts.record.as_deref());

    match opts.mode {
        Mode::Generate => run_generate(&git, &record_path),
        Mode::Apply => run_apply(&git, &record_path, opts.yes),
    }
}

/// Main CLI entry point for `git-history-rewrite`.
///
/// Dispatches on the first argument:
/// * `generate` records the current branch into the record file.
/// * `apply` confirms (on a terminal, unless `--yes`), then replays the
///   record onto the branch.
/// * anything else prints usage and succeeds without touching a repository.
///
/// # Exit Codes
///
/// * `0` – Success, usage output, or a declined confirmation.
/// * Non-zero – Any git, record or prompt failure. The diagnostic is printed
///   to stderr before returning `Err(())`.
pub fn entry() -> Result<i32, ()> {
    let args: Vec<String> = env::args().skip(1).collect();

    match parse_args(&args) {
        Invocation::Help => {
            print_help();
            Ok(0)
        }
        Invocation::Version => {
            println!("git-history-rewrite {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Invocation::Usage => {
            println!("{}", usage_text());
            Ok(0)
        }
        Invocation::Run(opts) => match run(&opts) {
            Ok(code) => Ok(code),
            Err(e) => {
                eprintln!("{}", style(format!("❌ Error: {}", e)).red().bold());
                Err(())
            }
        },
    }
}
