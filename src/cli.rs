use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use crate::discover::discover;
use crate::error::Error;
use crate::github::{DEFAULT_API_URL, GitHubClient};
use crate::identity::{RewriteRule, RuleError};
use crate::rewrite::{RewriteOptions, resolve_identity};
use crate::{audit, emails, git, prompt, push, rewrite};

/// Audit and rewrite commit identities across many git repositories.
#[derive(Parser, Debug)]
#[command(name = "gitkit", version)]
pub struct Cli {
    /// Log every git command and HTTP request to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to look for repositories.
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Directory whose subdirectories are scanned for git repositories.
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Search the whole tree instead of only immediate subdirectories.
    #[arg(long)]
    pub recursive: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show, per repository, the identities committed under a name.
    Check {
        /// Name to look for (case-insensitive substring).
        name: String,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// List every author and committer identity per repository.
    Report {
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Rewrite author/committer identities with git-filter-repo.
    Rewrite(RewriteArgs),

    /// Force-push the current branch of every repository to origin.
    Push {
        #[command(flatten)]
        scan: ScanArgs,

        /// Print the pushes instead of running them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Find the email addresses attached to your GitHub contributions.
    Emails {
        /// GitHub personal access token.
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,

        /// GitHub API base URL (for GitHub Enterprise).
        #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,
    },
}

#[derive(Args, Debug)]
pub struct RewriteArgs {
    /// New author/committer name (prompted for when omitted).
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// New author/committer email (prompted for when omitted).
    #[arg(short = 'e', long)]
    pub email: Option<String>,

    /// Old email(s) to replace; comma-separated or repeated.
    #[arg(short = 'o', long = "old-email", value_delimiter = ',', required = true)]
    pub old_emails: Vec<String>,

    /// Only replace identities that also carry this old name.
    #[arg(short = 'O', long)]
    pub old_name: Option<String>,

    /// Trailer prefix to strip from rewritten commits, e.g. `Signed-off-by:`.
    #[arg(short = 't', long = "strip-trailer")]
    pub trailers: Vec<String>,

    /// Count matching commits without rewriting anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation.
    #[arg(short = 'y', long)]
    pub yes: bool,

    #[command(flatten)]
    pub scan: ScanArgs,
}

/// Installs the stderr `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` enables `gitkit=debug`
/// and the default is `warn`.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "gitkit=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}

/// Discovers repositories, or returns `None` after telling the user there
/// are none. Requires `git` once there is work to do.
fn scan_repos(scan: &ScanArgs) -> Result<Option<Vec<PathBuf>>, Error> {
    let repos = discover(&scan.path, scan.recursive)?;
    if repos.is_empty() {
        println!(
            "{}",
            style(format!(
                "No git repositories found under {}.",
                scan.path.display()
            ))
            .yellow()
            .bold()
        );
        return Ok(None);
    }
    git::require_tool("git")?;
    Ok(Some(repos))
}

/// Runs a parsed command line.
///
/// # Exit Codes
///
/// * `0` – Success, including "nothing to do" and a declined confirmation.
/// * Errors are returned to the caller, which exits with `1`.
pub fn run(cli: Cli) -> Result<i32, Error> {
    match cli.command {
        Commands::Check { name, scan } => {
            let Some(repos) = scan_repos(&scan)? else {
                return Ok(0);
            };
            audit::check(&name, &scan.path, &repos)?;
            Ok(0)
        }
        Commands::Report { scan } => {
            let Some(repos) = scan_repos(&scan)? else {
                return Ok(0);
            };
            audit::report(&scan.path, &repos)?;
            Ok(0)
        }
        Commands::Rewrite(args) => {
            // Validate the flags before prompting for anything.
            if args.old_emails.iter().all(|e| e.trim().is_empty()) {
                return Err(RuleError::NoOldEmails.into());
            }
            let Some(repos) = scan_repos(&args.scan)? else {
                return Ok(0);
            };

            let mut string_prompter = prompt::DialoguerStringPrompter;
            let (name, email) = resolve_identity(args.name, args.email, &mut string_prompter)?;
            let rule = RewriteRule::new(
                &name,
                &email,
                &args.old_emails,
                args.old_name.as_deref(),
                &args.trailers,
            )?;

            let opts = RewriteOptions {
                dry_run: args.dry_run,
                assume_yes: args.yes,
            };
            let mut confirm_prompter = prompt::DialoguerConfirmPrompter;
            rewrite::run(&rule, &args.scan.path, &repos, opts, &mut confirm_prompter)
        }
        Commands::Push { scan, dry_run } => {
            let Some(repos) = scan_repos(&scan)? else {
                return Ok(0);
            };
            push::run(&scan.path, &repos, dry_run)
        }
        Commands::Emails { token, api_url } => {
            let client = GitHubClient::new(api_url, token)?;
            emails::run(&client)
        }
    }
}

/// Main CLI entry point for `gitkit`.
///
/// Parses arguments (printing usage and exiting with status `2` on invalid
/// flags), installs logging, and runs the selected command.
pub fn entry() -> Result<i32, Error> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}
