//! Finds the email addresses attached to the authenticated user's GitHub
//! contributions: commits they authored and commits of pull requests they
//! opened, across their own repositories and organization repositories
//! they can push to.

use std::collections::BTreeSet;

use console::style;
use tracing::debug;

use crate::error::Error;
use crate::github::{GitHubApi, GitHubError, Repository};

/// Collects pages from `fetch(1)`, `fetch(2)`, ... until an empty page.
fn paginate<T, F>(mut fetch: F) -> Result<Vec<T>, GitHubError>
where
    F: FnMut(u32) -> Result<Vec<T>, GitHubError>,
{
    let mut all = Vec::new();
    for page in 1u32.. {
        let batch = fetch(page)?;
        if batch.is_empty() {
            break;
        }
        all.extend(batch);
    }
    Ok(all)
}

/// Like [`paginate`], but `Ok(None)` (no access) also ends the listing.
fn paginate_optional<T, F>(mut fetch: F) -> Result<Vec<T>, GitHubError>
where
    F: FnMut(u32) -> Result<Option<Vec<T>>, GitHubError>,
{
    let mut all = Vec::new();
    for page in 1u32.. {
        match fetch(page)? {
            Some(batch) if !batch.is_empty() => all.extend(batch),
            _ => break,
        }
    }
    Ok(all)
}

/// Repositories the user owns.
pub fn owned_repos<A: GitHubApi>(api: &A) -> Result<Vec<Repository>, GitHubError> {
    paginate(|page| api.user_repos(page))
}

/// Repositories of the user's organizations that the user can push to.
pub fn org_repos<A: GitHubApi>(api: &A) -> Result<Vec<Repository>, GitHubError> {
    let mut repos = Vec::new();
    for org in api.user_orgs()? {
        let all = paginate(|page| api.org_repos(&org.login, page))?;
        debug!(org = %org.login, total = all.len(), "listed organization repositories");
        repos.extend(all.into_iter().filter(Repository::can_push));
    }
    Ok(repos)
}

/// Emails on `login`'s commits and on the commits of `login`'s pull
/// requests in `repo`.
pub fn contribution_emails<A: GitHubApi>(
    api: &A,
    repo: &Repository,
    login: &str,
) -> Result<BTreeSet<String>, GitHubError> {
    let mut emails = BTreeSet::new();

    let commits = paginate_optional(|page| api.commits(repo, login, page))?;
    for commit in &commits {
        emails.extend(commit.emails().map(str::to_string));
    }

    let pulls = paginate_optional(|page| api.pulls(repo, page))?;
    let mine = pulls
        .iter()
        .filter(|pr| pr.user.as_ref().is_some_and(|u| u.login == login));
    for pr in mine {
        if let Some(pr_commits) = api.pull_commits(repo, pr.number)? {
            for commit in &pr_commits {
                emails.extend(commit.emails().map(str::to_string));
            }
        }
    }

    Ok(emails)
}

/// Result of a full scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EmailReport {
    pub login: String,
    pub owned_count: usize,
    pub org_count: usize,
    /// Repositories with at least one email, in scan order.
    pub per_repo: Vec<(String, BTreeSet<String>)>,
}

impl EmailReport {
    /// Every distinct email across all repositories, sorted.
    pub fn all_emails(&self) -> BTreeSet<&str> {
        self.per_repo
            .iter()
            .flat_map(|(_, emails)| emails.iter().map(String::as_str))
            .collect()
    }
}

/// Scans every reachable repository, printing progress as it goes.
pub fn scan<A: GitHubApi>(api: &A) -> Result<EmailReport, GitHubError> {
    let user = api.authenticated_user()?;
    println!("Authenticated as: {}", style(&user.login).bold());

    println!();
    println!("Fetching your repositories...");
    let owned = owned_repos(api)?;
    println!("Found {} repositories owned by you", owned.len());

    println!();
    println!("Fetching organization repositories...");
    let orgs = org_repos(api)?;
    println!(
        "Found {} organization repositories where you have push access",
        orgs.len()
    );

    let mut report = EmailReport {
        login: user.login.clone(),
        owned_count: owned.len(),
        org_count: orgs.len(),
        per_repo: Vec::new(),
    };

    let all: Vec<Repository> = owned.into_iter().chain(orgs).collect();
    println!();
    println!("Analyzing contributions across {} repositories...", all.len());
    for (i, repo) in all.iter().enumerate() {
        let full = repo.full_name();
        println!(
            "{} Checking {}...",
            style(format!("[{}/{}]", i + 1, all.len())).dim(),
            full
        );
        let emails = contribution_emails(api, repo, &user.login)?;
        if !emails.is_empty() {
            report.per_repo.push((full, emails));
        }
    }

    Ok(report)
}

pub fn print_report(report: &EmailReport) {
    let all = report.all_emails();
    let rule = "=".repeat(60);

    println!();
    println!("{}", rule);
    println!(
        "{}",
        style(format!(
            "Found {} unique email addresses across {} repositories:",
            all.len(),
            report.per_repo.len()
        ))
        .green()
        .bold()
    );
    println!("{}", rule);
    for email in &all {
        println!("{}", email);
    }

    println!();
    println!("Repository breakdown:");
    for (repo, emails) in &report.per_repo {
        println!();
        println!("{}:", style(repo).bold());
        for email in emails {
            println!("  - {}", email);
        }
    }
}

/// `gitkit emails` entry.
pub fn run<A: GitHubApi>(api: &A) -> Result<i32, Error> {
    let report = scan(api)?;
    print_report(&report);
    Ok(0)
}
