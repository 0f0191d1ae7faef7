//! Read-only identity audits: `check` and `report`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use console::style;

use crate::discover::label;
use crate::error::Error;
use crate::identity::{Identity, read_history, tally};

/// Identities whose name contains `needle`, ignoring case.
pub(crate) fn name_hits(counts: Vec<(Identity, usize)>, needle: &str) -> Vec<(Identity, usize)> {
    let needle = needle.trim().to_lowercase();
    counts
        .into_iter()
        .filter(|(ident, _)| ident.name.to_lowercase().contains(&needle))
        .collect()
}

fn print_counts(counts: &[(Identity, usize)]) {
    for (ident, n) in counts {
        println!("  {:>6}  {}", n, ident);
    }
}

/// Prints, per repository, the identities used under a name.
///
/// Answers "which emails did I commit with, where?".
pub fn check(name: &str, root: &Path, repos: &[PathBuf]) -> Result<(), Error> {
    let mut hit_repos = 0usize;

    for repo in repos {
        let records = read_history(repo)?;
        let hits = name_hits(tally(&records), name);

        println!("{}", style(label(root, repo)).bold());
        if hits.is_empty() {
            println!("  {}", style("no matching commits").dim());
        } else {
            hit_repos += 1;
            print_counts(&hits);
        }
    }

    println!();
    println!(
        "{}",
        style(format!(
            "`{}` appears in {} of {} repositories.",
            name,
            hit_repos,
            repos.len()
        ))
        .green()
        .bold()
    );
    Ok(())
}

/// Distinct emails across every tallied identity, lowercased.
pub(crate) fn distinct_emails<'a, I>(identities: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a Identity>,
{
    identities
        .into_iter()
        .map(|i| i.email.to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Prints every identity of every repository with commit counts, then the
/// distinct emails across all of them.
pub fn report(root: &Path, repos: &[PathBuf]) -> Result<(), Error> {
    let mut everyone: Vec<Identity> = Vec::new();

    for repo in repos {
        let records = read_history(repo)?;
        let counts = tally(&records);

        println!(
            "{} {}",
            style(label(root, repo)).bold(),
            style(format!("({} commits)", records.len())).dim()
        );
        if counts.is_empty() {
            println!("  {}", style("no commits").dim());
        }
        print_counts(&counts);
        everyone.extend(counts.into_iter().map(|(ident, _)| ident));
    }

    let emails = distinct_emails(&everyone);
    println!();
    println!(
        "{}",
        style(format!(
            "{} distinct emails across {} repositories:",
            emails.len(),
            repos.len()
        ))
        .green()
        .bold()
    );
    for email in &emails {
        println!("  {}", email);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_hits_is_case_insensitive_substring() {
        let counts = vec![
            (Identity::new("Jane Doe", "jane@home.example"), 4),
            (Identity::new("JANE", "jane@work.example"), 2),
            (Identity::new("Bob", "bob@example.com"), 9),
        ];
        let hits = name_hits(counts, " jane ");
        assert_eq!(
            hits,
            vec![
                (Identity::new("Jane Doe", "jane@home.example"), 4),
                (Identity::new("JANE", "jane@work.example"), 2),
            ]
        );
    }

    #[test]
    fn name_hits_without_match_is_empty() {
        let counts = vec![(Identity::new("Bob", "bob@example.com"), 1)];
        assert!(name_hits(counts, "alice").is_empty());
    }

    #[test]
    fn distinct_emails_folds_case_and_skips_blanks() {
        let ids = vec![
            Identity::new("A", "A@Example.com"),
            Identity::new("B", "a@example.com"),
            Identity::new("C", ""),
            Identity::new("D", "d@example.com"),
        ];
        let emails = distinct_emails(&ids);
        assert_eq!(
            emails.into_iter().collect::<Vec<_>>(),
            vec!["a@example.com", "d@example.com"]
        );
    }
}
