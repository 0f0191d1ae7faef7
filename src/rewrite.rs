//! Bulk identity rewrite through `git filter-repo`.

use std::path::{Path, PathBuf};

use console::style;
use tracing::{debug, warn};

use crate::banner::print_banner;
use crate::callback;
use crate::discover::label;
use crate::error::{Error, InRepo};
use crate::git;
use crate::identity::{RewriteRule, read_history};
use crate::prompt::{self, ConfirmPrompter, StringPrompter};

const ORIGIN: &str = "origin";

/// Switches for a rewrite run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteOptions {
    /// Only count matching commits.
    pub dry_run: bool,
    /// Skip the confirmation prompt.
    pub assume_yes: bool,
}

/// What happened to one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoOutcome {
    /// No commit matched; the repository was left alone.
    Untouched,
    /// Dry run: `matched` commits would be rewritten.
    Planned { matched: usize },
    /// History was rewritten.
    Rewritten {
        matched: usize,
        total: usize,
        remaining: usize,
    },
}

/// Totals printed at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub rewritten_repos: usize,
    pub untouched_repos: usize,
    pub commits: usize,
    pub leftovers: usize,
}

impl Summary {
    pub fn record(&mut self, outcome: &RepoOutcome) {
        match outcome {
            RepoOutcome::Untouched => self.untouched_repos += 1,
            RepoOutcome::Planned { matched } => {
                self.rewritten_repos += 1;
                self.commits += matched;
            }
            RepoOutcome::Rewritten {
                matched, remaining, ..
            } => {
                self.rewritten_repos += 1;
                self.commits += matched;
                self.leftovers += remaining;
            }
        }
    }
}

/// Fills in a missing new name or email from prompts.
///
/// Values given on the command line are used as-is. Missing ones are asked
/// for, defaulting to `git config user.name` / `user.email`.
pub fn resolve_identity<P: StringPrompter>(
    name: Option<String>,
    email: Option<String>,
    prompter: &mut P,
) -> Result<(String, String), Error> {
    let name = match name {
        Some(n) => n,
        None => {
            let default = git::config_get("user.name").unwrap_or_default();
            prompt::ask(prompter, "name", &default).map_err(Error::Prompt)?
        }
    };
    let email = match email {
        Some(e) => e,
        None => {
            let default = git::config_get("user.email").unwrap_or_default();
            prompt::ask(prompter, "email", &default).map_err(Error::Prompt)?
        }
    };
    Ok((name, email))
}

/// Rewrites one repository (or counts, in a dry run).
fn rewrite_repo(
    rule: &RewriteRule,
    callback: &str,
    repo: &Path,
    dry_run: bool,
) -> Result<RepoOutcome, Error> {
    let before = read_history(repo)?;
    let matched = rule.count_touched(&before);
    debug!(repo = %repo.display(), matched, total = before.len(), "counted matches");

    if matched == 0 {
        return Ok(RepoOutcome::Untouched);
    }
    if dry_run {
        return Ok(RepoOutcome::Planned { matched });
    }

    // filter-repo removes `origin`; remember it to put it back.
    let origin = git::remote_url(repo, ORIGIN).in_repo(repo)?;

    git::filter_repo(repo, callback).in_repo(repo)?;

    if let Some(url) = origin {
        if git::remote_url(repo, ORIGIN).in_repo(repo)?.is_none() {
            git::remote_add(repo, ORIGIN, &url).in_repo(repo)?;
            debug!(repo = %repo.display(), url = %url, "restored origin");
        }
    }

    let total = git::commit_count(repo).in_repo(repo)?;
    let remaining = rule.count_touched(&read_history(repo)?);
    Ok(RepoOutcome::Rewritten {
        matched,
        total,
        remaining,
    })
}

fn print_outcome(name: &str, outcome: &RepoOutcome) {
    match outcome {
        RepoOutcome::Untouched => {
            println!("{} {}", style(name).bold(), style("no matching commits").dim());
        }
        RepoOutcome::Planned { matched } => {
            println!(
                "{} {}",
                style(name).bold(),
                style(format!("would rewrite {} commits", matched)).cyan()
            );
        }
        RepoOutcome::Rewritten {
            matched,
            total,
            remaining,
        } => {
            println!(
                "{} {}",
                style(name).bold(),
                style(format!("rewrote {} of {} commits", matched, total)).green()
            );
            if *remaining > 0 {
                warn!(repo = name, remaining, "commits still match after rewrite");
                println!(
                    "  {}",
                    style(format!("{} commits still match the old identity", remaining))
                        .yellow()
                        .bold()
                );
            }
        }
    }
}

/// Runs the rewrite over `repos`.
///
/// Shows the plan banner, asks for confirmation unless
/// [`RewriteOptions::assume_yes`] or a dry run, requires `git-filter-repo`
/// for a real run, then processes the repositories in order. The first
/// failing repository aborts the run.
///
/// # Exit Codes
///
/// * `0` – Completed, declined at the prompt, or dry run.
pub fn run<C: ConfirmPrompter>(
    rule: &RewriteRule,
    root: &Path,
    repos: &[PathBuf],
    opts: RewriteOptions,
    confirm: &mut C,
) -> Result<i32, Error> {
    print_banner(rule, repos.len(), opts.dry_run);

    if !opts.dry_run && !opts.assume_yes {
        let go = prompt::confirm_rewrite(confirm, repos.len()).map_err(Error::Prompt)?;
        if !go {
            println!(
                "{}",
                style("Canceled by user. No changes made.").yellow().bold()
            );
            return Ok(0);
        }
    }
    if !opts.dry_run {
        git::require_tool("git-filter-repo")?;
    }

    let body = callback::render(rule);
    let mut summary = Summary::default();
    for repo in repos {
        let name = label(root, repo);
        let outcome = rewrite_repo(rule, &body, repo, opts.dry_run)?;
        print_outcome(&name, &outcome);
        summary.record(&outcome);
    }

    println!();
    let verb = if opts.dry_run { "would rewrite" } else { "rewrote" };
    println!(
        "{}",
        style(format!(
            "✅ {} {} commits in {} repositories ({} untouched).",
            verb, summary.commits, summary.rewritten_repos, summary.untouched_repos
        ))
        .green()
        .bold()
    );
    if summary.leftovers > 0 {
        println!(
            "{}",
            style(format!(
                "{} commits still carry an old identity; check the output above.",
                summary.leftovers
            ))
            .yellow()
            .bold()
        );
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPrompter {
        answers: Vec<String>,
        asked: Vec<String>,
    }

    impl StringPrompter for FixedPrompter {
        fn prompt(&mut self, prompt: &str, _default: &str) -> Result<String, String> {
            self.asked.push(prompt.to_string());
            if self.answers.is_empty() {
                Err(String::from("no more answers"))
            } else {
                Ok(self.answers.remove(0))
            }
        }
    }

    #[derive(Default)]
    struct Declines {
        asked: Vec<String>,
    }

    impl ConfirmPrompter for Declines {
        fn confirm(&mut self, prompt: &str, _default: bool) -> Result<bool, String> {
            self.asked.push(prompt.to_string());
            Ok(false)
        }
    }

    #[test]
    fn resolve_identity_keeps_flags_without_prompting() {
        let mut p = FixedPrompter {
            answers: vec![],
            asked: vec![],
        };
        let got = resolve_identity(
            Some(String::from("Jane")),
            Some(String::from("jane@example.com")),
            &mut p,
        )
        .expect("resolve");
        assert_eq!(got, (String::from("Jane"), String::from("jane@example.com")));
        assert!(p.asked.is_empty());
    }

    #[test]
    fn resolve_identity_prompts_for_missing_values() {
        let mut p = FixedPrompter {
            answers: vec![String::from(" jane@example.com ")],
            asked: vec![],
        };
        let got = resolve_identity(Some(String::from("Jane")), None, &mut p).expect("resolve");
        assert_eq!(got.1, "jane@example.com");
        assert_eq!(p.asked, vec![String::from("New author email")]);
    }

    #[test]
    fn resolve_identity_surfaces_prompt_failures() {
        let mut p = FixedPrompter {
            answers: vec![],
            asked: vec![],
        };
        match resolve_identity(None, None, &mut p) {
            Err(Error::Prompt(msg)) => assert_eq!(msg, "no more answers"),
            other => panic!("expected prompt error, got {other:?}"),
        }
    }

    #[test]
    fn summary_tracks_outcomes() {
        let mut s = Summary::default();
        s.record(&RepoOutcome::Untouched);
        s.record(&RepoOutcome::Planned { matched: 3 });
        s.record(&RepoOutcome::Rewritten {
            matched: 5,
            total: 40,
            remaining: 1,
        });
        assert_eq!(
            s,
            Summary {
                rewritten_repos: 2,
                untouched_repos: 1,
                commits: 8,
                leftovers: 1,
            }
        );
    }

    #[test]
    fn declining_makes_no_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rule = RewriteRule::new("New", "new@x", &[String::from("old@x")], None, &[])
            .expect("rule");
        let repos = vec![dir.path().join("never-touched")];
        let mut confirm = Declines::default();
        let code =
            run(&rule, dir.path(), &repos, RewriteOptions::default(), &mut confirm).expect("run");
        assert_eq!(code, 0);
        assert_eq!(
            confirm.asked,
            vec![String::from("Rewrite history of 1 repository?")]
        );
        assert!(!repos[0].exists());
    }

    #[test]
    fn assume_yes_skips_the_prompt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rule = RewriteRule::new("New", "new@x", &[String::from("old@x")], None, &[])
            .expect("rule");
        let repos = vec![dir.path().join("not-a-repo")];
        let opts = RewriteOptions {
            dry_run: false,
            assume_yes: true,
        };
        let mut confirm = Declines::default();
        // Fails on the missing tool or the missing repository, never at the prompt.
        assert!(run(&rule, dir.path(), &repos, opts, &mut confirm).is_err());
        assert!(confirm.asked.is_empty());
    }
}
