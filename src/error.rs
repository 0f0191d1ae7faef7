use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::git::GitError;
use crate::github::GitHubError;
use crate::identity::{ParseError, RuleError};

/// Top-level error for every `gitkit` command.
///
/// Each module owns a narrower error type; this enum wraps them so command
/// runners can propagate with `?` and the binary can print a single line.
#[derive(Debug, Error)]
pub enum Error {
    /// A git command failed outside of any particular repository.
    #[error(transparent)]
    Git(#[from] GitError),

    /// A git command failed while processing a repository.
    #[error("{}: {}", .path.display(), .source)]
    Repo {
        path: PathBuf,
        #[source]
        source: GitError,
    },

    /// `git log` produced output that could not be parsed.
    #[error("{}: {}", .path.display(), .source)]
    History {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// The rewrite rule failed validation.
    #[error("invalid rewrite rule: {0}")]
    Rule(#[from] RuleError),

    /// The GitHub API could not be queried.
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    /// The scan root does not exist or is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Walking the scan root failed.
    #[error("cannot scan for repositories: {0}")]
    Walk(#[from] walkdir::Error),

    /// An interactive prompt failed.
    #[error("prompt error: {0}")]
    Prompt(String),
}

/// Attaches the repository being processed to a [`GitError`].
pub trait InRepo<T> {
    fn in_repo(self, path: &Path) -> Result<T, Error>;
}

impl<T> InRepo<T> for Result<T, GitError> {
    fn in_repo(self, path: &Path) -> Result<T, Error> {
        self.map_err(|source| Error::Repo {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_errors_name_the_repository() {
        let res: Result<(), GitError> = Err(GitError::Exited {
            command: String::from("git push"),
            code: Some(1),
        });
        let err = res.in_repo(Path::new("/work/alpha")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("/work/alpha: "), "got: {msg}");
        assert!(msg.contains("git push"));
    }

    #[test]
    fn rule_errors_are_prefixed() {
        let err = Error::from(RuleError::NoOldEmails);
        assert_eq!(
            err.to_string(),
            "invalid rewrite rule: at least one old email is required"
        );
    }
}
