//! # gitkit
//!
//! A CLI tool to audit and rewrite commit identities across every git
//! repository under a directory.
//!
//! This crate provides functionality to:
//! - Report the author/committer identities used in each repository
//! - Check which emails were used under a given name
//! - Rewrite matching identities with `git filter-repo`, restoring `origin`
//! - Force-push the current branch of every repository
//! - Find the emails attached to your GitHub contributions
//!
//! ## Usage
//!
//! ```bash
//! gitkit report ~/src
//! gitkit check "Jane Doe" ~/src
//! gitkit rewrite -n "Jane Doe" -e jane@example.com -o old@corp.example,jd@laptop ~/src
//! gitkit push ~/src
//! gitkit emails --token "$GITHUB_TOKEN"
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface and main entry point
//! - [`discover`] - Repository discovery
//! - [`git`] - Git and git-filter-repo command wrappers
//! - [`identity`] - Identities, history parsing, and the rewrite rule
//! - [`callback`] - The `git filter-repo` commit callback
//! - [`audit`] - `check` and `report`
//! - [`rewrite`] - `rewrite`
//! - [`push`] - `push`
//! - [`github`] - GitHub REST client
//! - [`emails`] - GitHub email finder
//! - [`prompt`] - User input abstractions
//! - [`banner`] - Rewrite plan banner
//! - [`error`] - Crate error type

pub mod audit;
pub mod banner;
pub mod callback;
pub mod cli;
pub mod discover;
pub mod emails;
pub mod error;
pub mod git;
pub mod github;
pub mod identity;
pub mod prompt;
pub mod push;
pub mod rewrite;

pub use error::Error;
