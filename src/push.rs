//! Force-push the current branch of every repository.

use std::path::{Path, PathBuf};

use console::style;
use tracing::warn;

use crate::discover::label;
use crate::error::{Error, InRepo};
use crate::git;

const ORIGIN: &str = "origin";

/// What `push` did (or would do) for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed(String),
    WouldPush(String),
    Detached,
    NoOrigin,
}

/// Decides the action from the repository state.
pub(crate) fn plan(branch: Option<String>, has_origin: bool, dry_run: bool) -> PushOutcome {
    match branch {
        None => PushOutcome::Detached,
        Some(_) if !has_origin => PushOutcome::NoOrigin,
        Some(b) if dry_run => PushOutcome::WouldPush(b),
        Some(b) => PushOutcome::Pushed(b),
    }
}

fn push_repo(repo: &Path, dry_run: bool) -> Result<PushOutcome, Error> {
    let branch = git::current_branch(repo).in_repo(repo)?;
    let has_origin = git::remote_url(repo, ORIGIN).in_repo(repo)?.is_some();

    let outcome = plan(branch, has_origin, dry_run);
    if let PushOutcome::Pushed(b) = &outcome {
        git::push_force(repo, ORIGIN, b).in_repo(repo)?;
    }
    Ok(outcome)
}

/// Force-pushes each repository's current branch to `origin`.
///
/// Detached `HEAD`s and repositories without `origin` are skipped. The first
/// failing push aborts the run.
pub fn run(root: &Path, repos: &[PathBuf], dry_run: bool) -> Result<i32, Error> {
    let mut pushed = 0usize;
    let mut skipped = 0usize;

    for repo in repos {
        let name = label(root, repo);
        println!("{}", style(format!("==> {}", name)).bold());

        match push_repo(repo, dry_run)? {
            PushOutcome::Pushed(b) => {
                pushed += 1;
                println!("  {}", style(format!("force-pushed {} to {}", b, ORIGIN)).green());
            }
            PushOutcome::WouldPush(b) => {
                pushed += 1;
                println!(
                    "  {}",
                    style(format!("would run: git push --force {} {}", ORIGIN, b)).cyan()
                );
            }
            PushOutcome::Detached => {
                skipped += 1;
                println!("  {}", style("skipped: HEAD is detached").yellow());
            }
            PushOutcome::NoOrigin => {
                skipped += 1;
                warn!(repo = %repo.display(), "no origin remote");
                println!("  {}", style("skipped: no `origin` remote").yellow());
            }
        }
    }

    println!();
    println!(
        "{}",
        style(format!("{} pushed, {} skipped.", pushed, skipped))
            .green()
            .bold()
    );
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_head_is_skipped_first() {
        assert_eq!(plan(None, true, false), PushOutcome::Detached);
        assert_eq!(plan(None, false, true), PushOutcome::Detached);
    }

    #[test]
    fn missing_origin_is_skipped() {
        assert_eq!(
            plan(Some(String::from("main")), false, false),
            PushOutcome::NoOrigin
        );
    }

    #[test]
    fn dry_run_only_plans() {
        assert_eq!(
            plan(Some(String::from("main")), true, true),
            PushOutcome::WouldPush(String::from("main"))
        );
        assert_eq!(
            plan(Some(String::from("dev")), true, false),
            PushOutcome::Pushed(String::from("dev"))
        );
    }
}
