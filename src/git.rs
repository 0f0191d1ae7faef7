use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

/// Errors raised while running `git` or `git-filter-repo`.
#[derive(Debug, Error)]
pub enum GitError {
    /// The program could not be started at all.
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran with captured output and exited non-zero.
    #[error("`{command}` failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The command ran attached to the terminal and exited non-zero.
    #[error("`{command}` exited with status {code:?}")]
    Exited { command: String, code: Option<i32> },

    /// The command succeeded but printed something we could not interpret.
    #[error("unexpected output from `{command}`: {output}")]
    UnexpectedOutput { command: String, output: String },

    /// A required binary is not installed.
    #[error("`{0}` not found in PATH")]
    ToolMissing(String),
}

/// Short human-readable form of a command: the program and its subcommand.
///
/// Later arguments are omitted; the `filter-repo` callback alone spans a
/// dozen lines.
fn describe(cmd: &Command) -> String {
    let program = cmd.get_program().to_string_lossy().into_owned();
    match cmd.get_args().next() {
        Some(sub) => format!("{} {}", program, sub.to_string_lossy()),
        None => program,
    }
}

/// Runs a command attached to the terminal and returns only its exit status.
///
/// # Returns
///
/// * `Ok(())` if the command exits with status `0`.
/// * `Err(GitError::Exited)` if it exits non-zero.
/// * `Err(GitError::Spawn)` if the process fails to start.
fn run_status(mut cmd: Command) -> Result<(), GitError> {
    let command = describe(&cmd);
    debug!(command = %command, cwd = ?cmd.get_current_dir(), "running");

    let status = cmd.status().map_err(|source| GitError::Spawn {
        command: command.clone(),
        source,
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(GitError::Exited {
            command,
            code: status.code(),
        })
    }
}

/// Runs a command and returns its standard output on success, or its
/// trimmed standard error inside [`GitError::CommandFailed`] on failure.
///
/// Output is returned untouched; callers trim when the value is a single
/// token.
fn run_output(mut cmd: Command) -> Result<String, GitError> {
    let command = describe(&cmd);
    debug!(command = %command, cwd = ?cmd.get_current_dir(), "running");

    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    let out = cmd.output().map_err(|source| GitError::Spawn {
        command: command.clone(),
        source,
    })?;

    if out.status.success() {
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    } else {
        Err(GitError::CommandFailed {
            command,
            code: out.status.code(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        })
    }
}

/// A `git` command rooted at `repo`.
fn git_in(repo: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(repo);
    cmd.stdin(Stdio::null());
    cmd
}

/// Treats a failed command as "absent" while still surfacing spawn errors.
fn optional(res: Result<String, GitError>) -> Result<Option<String>, GitError> {
    match res {
        Ok(s) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                Ok(Some(s.to_string()))
            }
        }
        Err(GitError::CommandFailed { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Verifies that `tool` is on `PATH` and returns its location.
///
/// # Examples
///
/// ```ignore
/// // Ignored because it depends on the machine's PATH.
/// use gitkit::git::require_tool;
///
/// let git = require_tool("git")?;
/// println!("using {}", git.display());
/// ```
pub fn require_tool(tool: &str) -> Result<PathBuf, GitError> {
    which::which(tool).map_err(|_| GitError::ToolMissing(tool.to_string()))
}

/// Runs `git log --all` with the given pretty format and returns raw stdout.
///
/// # Parameters
///
/// * `repo` — Repository working directory.
/// * `format` — A `--format` string, e.g. [`crate::identity::LOG_FORMAT`].
///
/// # Returns
///
/// * `Ok(String)` with one line per commit reachable from any ref. A
///   repository without commits yields an empty string.
/// * `Err(GitError)` if `git log` fails.
pub fn log_all(repo: &Path, format: &str) -> Result<String, GitError> {
    let mut cmd = git_in(repo);
    cmd.arg("log")
        .arg("--all")
        .arg(format!("--format={}", format));
    run_output(cmd)
}

/// Counts commits reachable from any ref via `git rev-list --all --count`.
pub fn commit_count(repo: &Path) -> Result<usize, GitError> {
    let mut cmd = git_in(repo);
    cmd.arg("rev-list").arg("--all").arg("--count");
    let out = run_output(cmd)?;
    let trimmed = out.trim();

    trimmed
        .parse::<usize>()
        .map_err(|_| GitError::UnexpectedOutput {
            command: String::from("git rev-list"),
            output: trimmed.to_string(),
        })
}

/// Returns the URL of remote `name`, or `None` if the remote does not exist.
///
/// # Examples
///
/// ```ignore
/// // Ignored because it requires a Git repository.
/// use std::path::Path;
/// use gitkit::git::remote_url;
///
/// if let Some(url) = remote_url(Path::new("."), "origin")? {
///     println!("origin -> {}", url);
/// }
/// ```
pub fn remote_url(repo: &Path, name: &str) -> Result<Option<String>, GitError> {
    let mut cmd = git_in(repo);
    cmd.arg("remote").arg("get-url").arg(name);
    optional(run_output(cmd))
}

/// Adds remote `name` pointing at `url`.
pub fn remote_add(repo: &Path, name: &str, url: &str) -> Result<(), GitError> {
    let mut cmd = git_in(repo);
    cmd.arg("remote").arg("add").arg(name).arg(url);
    run_output(cmd).map(|_| ())
}

/// Returns the branch `HEAD` points at, or `None` when `HEAD` is detached.
///
/// Uses `git symbolic-ref --quiet --short HEAD`, which exits non-zero
/// without printing anything when `HEAD` is not a symbolic ref. An unborn
/// branch (fresh `git init`) still reports its name.
pub fn current_branch(repo: &Path) -> Result<Option<String>, GitError> {
    let mut cmd = git_in(repo);
    cmd.arg("symbolic-ref").arg("--quiet").arg("--short").arg("HEAD");
    optional(run_output(cmd))
}

/// Force-pushes `branch` to `remote`.
///
/// Output is inherited so the user sees git's progress and any rejection
/// message directly.
///
/// # Notes
///
/// * This overwrites the remote branch; it is meant to publish history that
///   was just rewritten.
pub fn push_force(repo: &Path, remote: &str, branch: &str) -> Result<(), GitError> {
    let mut cmd = git_in(repo);
    cmd.arg("push").arg("--force").arg(remote).arg(branch);
    cmd.stdout(Stdio::inherit());
    cmd.stderr(Stdio::inherit());
    run_status(cmd)
}

/// Rewrites every commit of `repo` through `git filter-repo`.
///
/// This runs:
///
/// ```text
/// git filter-repo --force --commit-callback <callback>
/// ```
///
/// `--force` is required because the repositories being rewritten are
/// working clones, not fresh ones. `git-filter-repo` removes the `origin`
/// remote afterwards; callers restore it with [`remote_add`].
///
/// # Parameters
///
/// * `repo` – Repository working directory.
/// * `callback` – Python body rendered by [`crate::callback::render`].
///
/// # Returns
///
/// * `Ok(())` if the rewrite completed.
/// * `Err(GitError::Exited)` if `git filter-repo` exited non-zero.
pub fn filter_repo(repo: &Path, callback: &str) -> Result<(), GitError> {
    let mut cmd = git_in(repo);
    cmd.arg("filter-repo")
        .arg("--force")
        .arg("--commit-callback")
        .arg(callback);
    cmd.stdout(Stdio::inherit());
    cmd.stderr(Stdio::inherit());
    run_status(cmd)
}

/// Runs `git config --get <key>` from the current directory.
///
/// Missing keys, an unavailable `git`, or an empty value all yield `None`;
/// the result is only used as a prompt default.
///
/// # Examples
///
/// ```ignore
/// // Ignored because it depends on the user's git configuration.
/// use gitkit::git::config_get;
///
/// match config_get("user.email") {
///     Some(email) => println!("default email: {}", email),
///     None => println!("no user.email configured"),
/// }
/// ```
pub fn config_get(key: &str) -> Option<String> {
    let mut cmd = Command::new("git");
    cmd.arg("config").arg("--get").arg(key);
    cmd.stdin(Stdio::null());
    optional(run_output(cmd)).ok().flatten()
}

/// Returns `true` when `dir` holds a `.git` directory or a `.git` file
/// (worktrees and submodules use a file).
pub fn has_git_entry(dir: &Path) -> bool {
    let entry = dir.join(".git");
    entry.is_dir() || entry.is_file()
}
