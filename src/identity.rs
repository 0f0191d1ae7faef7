use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::error::{Error, InRepo};
use crate::git;

/// `git log` format: hash, author name/email, committer name/email,
/// separated by ASCII unit separators.
pub const LOG_FORMAT: &str = "%H%x1f%an%x1f%ae%x1f%cn%x1f%ce";

const FIELD_SEP: char = '\u{1f}';
const FIELD_COUNT: usize = 5;

/// A name + email pair as recorded on a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// One commit's identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub id: String,
    pub author: Identity,
    pub committer: Identity,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed log line {line}: expected 5 fields, found {found}")]
    Malformed { line: usize, found: usize },
}

/// Parses output produced with [`LOG_FORMAT`].
///
/// Blank lines are ignored. Any other line must carry exactly five fields.
pub fn parse_log(output: &str) -> Result<Vec<CommitRecord>, ParseError> {
    output
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_line(idx + 1, line))
        .collect()
}

fn parse_line(line_no: usize, line: &str) -> Result<CommitRecord, ParseError> {
    let fields: Vec<&str> = line.split(FIELD_SEP).collect();
    if fields.len() != FIELD_COUNT {
        return Err(ParseError::Malformed {
            line: line_no,
            found: fields.len(),
        });
    }

    Ok(CommitRecord {
        id: fields[0].to_string(),
        author: Identity::new(fields[1], fields[2]),
        committer: Identity::new(fields[3], fields[4]),
    })
}

/// Reads every commit reachable from any ref in `repo`.
pub fn read_history(repo: &Path) -> Result<Vec<CommitRecord>, Error> {
    let raw = git::log_all(repo, LOG_FORMAT).in_repo(repo)?;
    parse_log(&raw).map_err(|source| Error::History {
        path: repo.to_path_buf(),
        source,
    })
}

/// Distinct identities with the number of commits they appear on.
///
/// A commit whose author and committer are the same identity counts once.
/// Sorted by count (highest first), then by name and email.
pub fn tally(records: &[CommitRecord]) -> Vec<(Identity, usize)> {
    let mut counts: HashMap<&Identity, usize> = HashMap::new();
    for rec in records {
        *counts.entry(&rec.author).or_insert(0) += 1;
        if rec.committer != rec.author {
            *counts.entry(&rec.committer).or_insert(0) += 1;
        }
    }

    let mut out: Vec<(Identity, usize)> = counts
        .into_iter()
        .map(|(ident, n)| (ident.clone(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("new author name must not be empty")]
    EmptyName,
    #[error("new author email must not be empty")]
    EmptyEmail,
    #[error("at least one old email is required")]
    NoOldEmails,
}

/// Which commits to rewrite and what to write instead.
///
/// Old emails are stored lowercased and matched ASCII-case-insensitively,
/// the same folding Python's `bytes.lower()` applies inside the
/// `git filter-repo` callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    new: Identity,
    old_emails: Vec<String>,
    old_name: Option<String>,
    trailers: Vec<String>,
}

impl RewriteRule {
    /// Validates and normalises the rule.
    ///
    /// * `old_emails` entries may hold several addresses separated by commas
    ///   or whitespace; duplicates and blanks are dropped.
    /// * A blank `old_name` means "any name".
    /// * `trailers` are line prefixes (e.g. `Signed-off-by:`) stripped from
    ///   the message of every rewritten commit.
    pub fn new(
        name: &str,
        email: &str,
        old_emails: &[String],
        old_name: Option<&str>,
        trailers: &[String],
    ) -> Result<Self, RuleError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(RuleError::EmptyName);
        }
        if email.is_empty() {
            return Err(RuleError::EmptyEmail);
        }

        let mut emails: Vec<String> = Vec::new();
        for raw in old_emails {
            for part in raw.split(|c: char| c == ',' || c.is_whitespace()) {
                let part = part.trim().to_ascii_lowercase();
                if !part.is_empty() && !emails.contains(&part) {
                    emails.push(part);
                }
            }
        }
        if emails.is_empty() {
            return Err(RuleError::NoOldEmails);
        }

        let old_name = old_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_ascii_lowercase);

        let mut prefixes: Vec<String> = Vec::new();
        for t in trailers {
            let t = t.trim().to_ascii_lowercase();
            if !t.is_empty() && !prefixes.contains(&t) {
                prefixes.push(t);
            }
        }

        Ok(Self {
            new: Identity::new(name, email),
            old_emails: emails,
            old_name,
            trailers: prefixes,
        })
    }

    pub fn new_identity(&self) -> &Identity {
        &self.new
    }

    pub fn old_emails(&self) -> &[String] {
        &self.old_emails
    }

    pub fn old_name(&self) -> Option<&str> {
        self.old_name.as_deref()
    }

    pub fn trailers(&self) -> &[String] {
        &self.trailers
    }

    /// Whether `ident` would be replaced.
    pub fn matches(&self, ident: &Identity) -> bool {
        let email_hit = self
            .old_emails
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&ident.email));
        let name_hit = self
            .old_name
            .as_deref()
            .is_none_or(|n| n.eq_ignore_ascii_case(&ident.name));
        email_hit && name_hit
    }

    /// Whether the commit's author or committer would be replaced.
    pub fn touches(&self, record: &CommitRecord) -> bool {
        self.matches(&record.author) || self.matches(&record.committer)
    }

    /// Number of records this rule would rewrite.
    pub fn count_touched(&self, records: &[CommitRecord]) -> usize {
        records.iter().filter(|r| self.touches(r)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, author: (&str, &str), committer: (&str, &str)) -> CommitRecord {
        CommitRecord {
            id: id.to_string(),
            author: Identity::new(author.0, author.1),
            committer: Identity::new(committer.0, committer.1),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_log_lines() {
        let out = "abc\u{1f}Ann\u{1f}ann@x.io\u{1f}Bob\u{1f}bob@x.io\n\
                   def\u{1f}Ann Lee\u{1f}ann@y.io\u{1f}Ann Lee\u{1f}ann@y.io\n";
        let records = parse_log(out).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "abc");
        assert_eq!(records[0].committer, Identity::new("Bob", "bob@x.io"));
        assert_eq!(records[1].author.name, "Ann Lee");
    }

    #[test]
    fn empty_fields_survive_parsing() {
        let records = parse_log("abc\u{1f}\u{1f}\u{1f}Bob\u{1f}bob@x.io").expect("parse");
        assert_eq!(records[0].author, Identity::new("", ""));
    }

    #[test]
    fn blank_output_is_empty_history() {
        assert_eq!(parse_log("").expect("parse"), Vec::new());
        assert_eq!(parse_log("\n\n").expect("parse"), Vec::new());
    }

    #[test]
    fn malformed_line_reports_position() {
        let out = "abc\u{1f}A\u{1f}a@x\u{1f}B\u{1f}b@x\nnot a record\n";
        assert_eq!(
            parse_log(out),
            Err(ParseError::Malformed { line: 2, found: 1 })
        );
    }

    #[test]
    fn tally_counts_same_author_and_committer_once() {
        let records = vec![
            rec("1", ("Ann", "ann@x"), ("Ann", "ann@x")),
            rec("2", ("Ann", "ann@x"), ("Bot", "bot@x")),
            rec("3", ("Cy", "cy@x"), ("Bot", "bot@x")),
        ];
        let t = tally(&records);
        assert_eq!(
            t,
            vec![
                (Identity::new("Ann", "ann@x"), 2),
                (Identity::new("Bot", "bot@x"), 2),
                (Identity::new("Cy", "cy@x"), 1),
            ]
        );
    }

    #[test]
    fn rule_requires_new_identity_and_old_emails() {
        let old = strings(&["old@x"]);
        assert_eq!(
            RewriteRule::new(" ", "n@x", &old, None, &[]),
            Err(RuleError::EmptyName)
        );
        assert_eq!(
            RewriteRule::new("New", "", &old, None, &[]),
            Err(RuleError::EmptyEmail)
        );
        assert_eq!(
            RewriteRule::new("New", "n@x", &strings(&[" , "]), None, &[]),
            Err(RuleError::NoOldEmails)
        );
    }

    #[test]
    fn rule_normalises_old_emails() {
        let rule = RewriteRule::new(
            " New ",
            " n@x ",
            &strings(&["A@X.io, b@x.io", "a@x.io", "c@x.io d@x.io"]),
            Some("  "),
            &strings(&["Signed-off-by:", " signed-off-by: ", ""]),
        )
        .expect("rule");

        assert_eq!(rule.new_identity(), &Identity::new("New", "n@x"));
        assert_eq!(rule.old_emails(), ["a@x.io", "b@x.io", "c@x.io", "d@x.io"]);
        assert_eq!(rule.old_name(), None);
        assert_eq!(rule.trailers(), ["signed-off-by:"]);
    }

    #[test]
    fn email_match_ignores_case() {
        let rule =
            RewriteRule::new("New", "n@x", &strings(&["old@x.io"]), None, &[]).expect("rule");
        assert!(rule.matches(&Identity::new("Whoever", "OLD@X.IO")));
        assert!(!rule.matches(&Identity::new("Whoever", "other@x.io")));
    }

    #[test]
    fn old_name_narrows_the_match() {
        let rule = RewriteRule::new("New", "n@x", &strings(&["old@x.io"]), Some("Ann"), &[])
            .expect("rule");
        assert!(rule.matches(&Identity::new("ann", "old@x.io")));
        assert!(!rule.matches(&Identity::new("Bob", "old@x.io")));
    }

    #[test]
    fn touches_author_or_committer() {
        let rule = RewriteRule::new("New", "n@x", &strings(&["old@x"]), None, &[]).expect("rule");
        let records = vec![
            rec("1", ("A", "old@x"), ("B", "b@x")),
            rec("2", ("A", "a@x"), ("B", "Old@X")),
            rec("3", ("A", "a@x"), ("B", "b@x")),
        ];
        assert!(rule.touches(&records[0]));
        assert!(rule.touches(&records[1]));
        assert!(!rule.touches(&records[2]));
        assert_eq!(rule.count_touched(&records), 2);
    }
}
