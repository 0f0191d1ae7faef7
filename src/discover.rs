use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Error;
use crate::git::has_git_entry;

/// Finds the repositories under `root`.
///
/// Without `recursive`, only the immediate subdirectories of `root` are
/// candidates. With `recursive`, the whole tree is searched, but the walk
/// never descends into a repository once one is found (nested checkouts
/// and `.git` internals are not reported). `root` itself is never a
/// candidate. A symlink to a directory is a candidate like any other
/// directory, but the walk does not descend through it.
///
/// Directories below `root` that cannot be read are logged and skipped.
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` sorted by path, each repository exactly once.
/// * `Err(Error::NotADirectory)` if `root` is missing or not a directory.
/// * `Err(Error::Walk)` if `root` itself cannot be read.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use gitkit::discover::discover;
///
/// for repo in discover(Path::new("."), false).unwrap() {
///     println!("{}", repo.display());
/// }
/// ```
pub fn discover(root: &Path, recursive: bool) -> Result<Vec<PathBuf>, Error> {
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let mut walker = WalkDir::new(root).min_depth(1).follow_links(false);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut repos = Vec::new();
    let mut it = walker.into_iter();
    while let Some(entry) = it.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(err.into()),
            Err(err) => {
                warn!(error = %err, "skipping unreadable path");
                continue;
            }
        };
        // Only real directories are entered; linked ones are candidates too.
        let entered = entry.file_type().is_dir();
        if !entered && !(entry.path_is_symlink() && entry.path().is_dir()) {
            continue;
        }
        let is_repo = entry.file_name() != ".git" && has_git_entry(entry.path());
        if entered && (is_repo || entry.file_name() == ".git") {
            it.skip_current_dir();
        }
        if is_repo {
            debug!(path = %entry.path().display(), "found repository");
            repos.push(entry.into_path());
        }
    }

    repos.sort();
    Ok(repos)
}

/// Display label for `repo`: its path relative to the scan root when
/// possible.
pub fn label(root: &Path, repo: &Path) -> String {
    match repo.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
        _ => repo.display().to_string(),
    }
}
