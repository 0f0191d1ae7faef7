use console::{measure_text_width, style};
use std::iter;

use crate::identity::RewriteRule;

/// Prints a boxed, colorized summary of the rewrite that is about to run.
///
/// The box is sized to the widest **visible** line, using
/// [`console::measure_text_width`] so ANSI codes inside the content do not
/// skew the padding. Borders are styled separately from the content.
///
/// # Parameters
///
/// * `rule` – The validated rewrite rule.
/// * `repo_count` – How many repositories will be processed.
/// * `dry_run` – When `true`, the banner states that nothing will be written.
///
/// # Examples
///
/// ```no_run
/// use gitkit::banner::print_banner;
/// use gitkit::identity::RewriteRule;
///
/// let old = ["old@example.com".to_string()];
/// let rule = RewriteRule::new("Jane", "jane@example.com", &old, None, &[]).unwrap();
/// print_banner(&rule, 4, false);
/// ```
pub fn print_banner(rule: &RewriteRule, repo_count: usize, dry_run: bool) {
    let lines = banner_lines(rule, repo_count, dry_run);

    let max_width = lines
        .iter()
        .map(|l| measure_text_width(l))
        .max()
        .unwrap_or(0)
        + 2;

    let border = "═".repeat(max_width);
    let top = style(format!("╔{}╗", border)).blue().bold();
    let bottom = style(format!("╚{}╝", border)).blue().bold();
    let left = style("║ ").blue().bold().to_string();
    let right = style("║").blue().bold().to_string();

    println!();
    println!("{top}");
    for line in lines {
        let visible = measure_text_width(&line);
        let pad = max_width - visible;
        println!("{}{}{}{}", left, line, " ".repeat(pad - 1), right);
    }
    println!("{bottom}");
    println!();
}

/// Builds the banner content: title, mode, the rule, then the steps.
///
/// Mode lines carry ANSI styling; measure them with
/// `console::measure_text_width`, not `str::len()`.
fn banner_lines(rule: &RewriteRule, repo_count: usize, dry_run: bool) -> Vec<String> {
    let top = ["Rewrite commit identities with git-filter-repo", ""]
        .into_iter()
        .map(|s| s.to_string());

    let mode = if dry_run {
        vec![
            style("Dry run: matching commits are counted, nothing is rewritten.")
                .cyan()
                .bold()
                .to_string(),
        ]
    } else {
        vec![
            style("Every matching commit gets a new hash in all repositories.")
                .yellow()
                .bold()
                .to_string(),
            style("Force-push afterwards (`gitkit push`) to publish the result.")
                .yellow()
                .to_string(),
        ]
    }
    .into_iter();

    let old_name = match rule.old_name() {
        Some(n) => format!("Only when the old name is:   {}", n),
        None => String::from("Only when the old name is:   (any)"),
    };
    let trailers = if rule.trailers().is_empty() {
        String::from("Trailers stripped:           (none)")
    } else {
        format!("Trailers stripped:           {}", rule.trailers().join(", "))
    };

    let details = iter::once(String::new())
        .chain(iter::once(format!(
            "New identity:                {}",
            rule.new_identity()
        )))
        .chain(iter::once(format!(
            "Replacing emails:            {}",
            rule.old_emails().join(", ")
        )))
        .chain(iter::once(old_name))
        .chain(iter::once(trailers))
        .chain(iter::once(format!(
            "Repositories:                {}",
            repo_count
        )));

    let steps = iter::once(String::new()).chain(
        [
            "For each repository this tool will:",
            "  1) Count commits whose author or committer matches",
            "  2) Run `git filter-repo` with a commit callback",
            "  3) Restore the `origin` remote removed by filter-repo",
        ]
        .into_iter()
        .map(|s| s.to_string()),
    );

    top.chain(mode).chain(details).chain(steps).collect()
}
