//! Renders the commit callback handed to `git filter-repo`.
//!
//! `git filter-repo --commit-callback <body>` compiles `<body>` as the body
//! of a Python function receiving `commit`, whose identity fields and
//! message are `bytes`. Every user-supplied string is therefore emitted as
//! an escaped bytes literal.

use std::fmt::Write;

use crate::identity::RewriteRule;

/// Formats `s` as a Python bytes literal (`b"..."`) of its UTF-8 encoding.
///
/// Printable ASCII is copied through; quotes and backslashes are escaped,
/// everything else becomes `\xNN`.
pub(crate) fn bytes_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 3);
    out.push_str("b\"");
    for &b in s.as_bytes() {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            0x20..=0x7e => out.push(b as char),
            _ => {
                let _ = write!(out, "\\x{:02x}", b);
            }
        }
    }
    out.push('"');
    out
}

fn tuple_literal(items: &[String]) -> String {
    if items.is_empty() {
        return String::from("()");
    }
    let parts: Vec<String> = items.iter().map(|s| bytes_literal(s)).collect();
    format!("({},)", parts.join(", "))
}

fn set_literal(items: &[String]) -> String {
    let parts: Vec<String> = items.iter().map(|s| bytes_literal(s)).collect();
    format!("{{{}}}", parts.join(", "))
}

fn swap_block(role: &str) -> String {
    format!(
        "if commit.{role}_email.lower() in old_emails and \
         (old_name is None or commit.{role}_name.lower() == old_name):\n    \
         commit.{role}_name = new_name\n    \
         commit.{role}_email = new_email\n    \
         changed = True\n"
    )
}

/// Builds the callback body for `rule`.
///
/// The callback replaces author and committer independently. Trailer lines
/// are removed only from commits where at least one identity changed, and
/// the message is normalised to end with a single newline.
pub fn render(rule: &RewriteRule) -> String {
    let new = rule.new_identity();
    let old_name = match rule.old_name() {
        Some(n) => bytes_literal(n),
        None => String::from("None"),
    };

    let mut body = String::new();
    body.push_str(&format!("old_emails = {}\n", set_literal(rule.old_emails())));
    body.push_str(&format!("old_name = {}\n", old_name));
    body.push_str(&format!("new_name = {}\n", bytes_literal(&new.name)));
    body.push_str(&format!("new_email = {}\n", bytes_literal(&new.email)));
    body.push_str(&format!("trailers = {}\n", tuple_literal(rule.trailers())));
    body.push_str("changed = False\n");
    body.push_str(&swap_block("author"));
    body.push_str(&swap_block("committer"));
    body.push_str(
        "if changed and trailers:\n    \
         kept = [line for line in commit.message.split(b\"\\n\") \
         if not line.strip().lower().startswith(trailers)]\n    \
         commit.message = b\"\\n\".join(kept).rstrip(b\"\\n\") + b\"\\n\"\n",
    );
    body
}
