//! Blocking GitHub REST client covering the endpoints the email finder uses.

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Page size requested from every listing endpoint (GitHub's maximum).
pub const PER_PAGE: u32 = 100;

/// Errors from GitHub REST API interactions.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// HTTP-level transport error (network, TLS, decoding).
    #[error("GitHub HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("GitHub API error (HTTP {status}) for {url}")]
    Api { status: u16, url: String },

    /// Token missing, expired, or lacking scopes.
    #[error("GitHub authentication failed: HTTP {0}")]
    AuthenticationFailed(u16),

    /// Rate limit exceeded.
    #[error("GitHub rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Organization {
    pub login: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub push: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: User,
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

impl Repository {
    /// `owner/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner.login, self.name)
    }

    pub fn can_push(&self) -> bool {
        self.permissions.as_ref().is_some_and(|p| p.push)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GitActor {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub author: Option<GitActor>,
    #[serde(default)]
    pub committer: Option<GitActor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub commit: CommitDetail,
}

impl Commit {
    /// Author and committer emails that are present and non-empty.
    pub fn emails(&self) -> impl Iterator<Item = &str> {
        [&self.commit.author, &self.commit.committer]
            .into_iter()
            .flatten()
            .filter_map(|actor| actor.email.as_deref())
            .filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub user: Option<User>,
}

/// The slice of the GitHub API the email finder needs.
///
/// Listing calls return an error on any non-success status. The per
/// repository calls return `Ok(None)` instead, since an inaccessible or
/// empty repository is an expected condition while scanning.
pub trait GitHubApi {
    fn authenticated_user(&self) -> Result<User, GitHubError>;
    fn user_repos(&self, page: u32) -> Result<Vec<Repository>, GitHubError>;
    fn user_orgs(&self) -> Result<Vec<Organization>, GitHubError>;
    fn org_repos(&self, org: &str, page: u32) -> Result<Vec<Repository>, GitHubError>;
    fn commits(
        &self,
        repo: &Repository,
        author: &str,
        page: u32,
    ) -> Result<Option<Vec<Commit>>, GitHubError>;
    fn pulls(&self, repo: &Repository, page: u32) -> Result<Option<Vec<PullRequest>>, GitHubError>;
    fn pull_commits(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<Option<Vec<Commit>>, GitHubError>;
}

/// Synchronous GitHub REST API client authenticated with a bearer token.
pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self, GitHubError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("gitkit/", env!("CARGO_PKG_VERSION"))),
        );
        let http = Client::builder().default_headers(headers).build()?;
        debug!(api_url = %api_url, "created GitHub client");

        Ok(Self {
            http,
            api_url,
            token: token.into(),
        })
    }

    fn send(&self, path: &str, query: &[(&str, String)]) -> Result<Response, GitHubError> {
        let url = format!("{}{}", self.api_url, path);
        debug!(url = %url, ?query, "GET");
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()?;
        Ok(resp)
    }

    /// Fetches and decodes, failing on any non-success status.
    fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GitHubError> {
        let resp = self.send(path, query)?;
        check_response(&resp)?;
        Ok(resp.json()?)
    }

    /// Fetches and decodes, mapping any non-success status to `None`.
    fn fetch_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, GitHubError> {
        let resp = self.send(path, query)?;
        if resp.status() != StatusCode::OK {
            debug!(status = resp.status().as_u16(), path, "skipping");
            return Ok(None);
        }
        Ok(Some(resp.json()?))
    }
}

fn page_query(page: u32) -> Vec<(&'static str, String)> {
    vec![("per_page", PER_PAGE.to_string()), ("page", page.to_string())]
}

fn check_response(resp: &Response) -> Result<(), GitHubError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let code = status.as_u16();
    let reset = resp
        .headers()
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let remaining_zero = resp
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");
    Err(classify(code, remaining_zero, reset, resp.url().as_str()))
}

/// Maps a failed status to an error. A 403 with an exhausted quota is a
/// rate limit, not an authentication problem.
pub(crate) fn classify(
    status: u16,
    quota_exhausted: bool,
    reset_at: Option<String>,
    url: &str,
) -> GitHubError {
    match status {
        429 => GitHubError::RateLimited {
            reset_at: reset_at.unwrap_or_else(|| String::from("unknown")),
        },
        403 if quota_exhausted => GitHubError::RateLimited {
            reset_at: reset_at.unwrap_or_else(|| String::from("unknown")),
        },
        401 | 403 => GitHubError::AuthenticationFailed(status),
        _ => GitHubError::Api {
            status,
            url: url.to_string(),
        },
    }
}

impl GitHubApi for GitHubClient {
    fn authenticated_user(&self) -> Result<User, GitHubError> {
        self.fetch("/user", &[])
    }

    fn user_repos(&self, page: u32) -> Result<Vec<Repository>, GitHubError> {
        let mut query = page_query(page);
        query.push(("affiliation", String::from("owner")));
        self.fetch("/user/repos", &query)
    }

    fn user_orgs(&self) -> Result<Vec<Organization>, GitHubError> {
        self.fetch("/user/orgs", &[])
    }

    fn org_repos(&self, org: &str, page: u32) -> Result<Vec<Repository>, GitHubError> {
        self.fetch(&format!("/orgs/{}/repos", org), &page_query(page))
    }

    fn commits(
        &self,
        repo: &Repository,
        author: &str,
        page: u32,
    ) -> Result<Option<Vec<Commit>>, GitHubError> {
        let mut query = page_query(page);
        query.push(("author", author.to_string()));
        self.fetch_optional(&format!("/repos/{}/commits", repo.full_name()), &query)
    }

    fn pulls(&self, repo: &Repository, page: u32) -> Result<Option<Vec<PullRequest>>, GitHubError> {
        let mut query = page_query(page);
        query.push(("state", String::from("all")));
        self.fetch_optional(&format!("/repos/{}/pulls", repo.full_name()), &query)
    }

    fn pull_commits(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<Option<Vec<Commit>>, GitHubError> {
        let query = vec![("per_page", PER_PAGE.to_string())];
        self.fetch_optional(
            &format!("/repos/{}/pulls/{}/commits", repo.full_name(), number),
            &query,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_payload_decodes() {
        let json = r#"{
            "id": 1,
            "name": "tool",
            "owner": {"login": "octo", "id": 9},
            "permissions": {"admin": false, "push": true, "pull": true}
        }"#;
        let repo: Repository = serde_json::from_str(json).expect("decode");
        assert_eq!(repo.full_name(), "octo/tool");
        assert!(repo.can_push());
    }

    #[test]
    fn repository_without_permissions_cannot_push() {
        let json = r#"{"name": "tool", "owner": {"login": "octo"}}"#;
        let repo: Repository = serde_json::from_str(json).expect("decode");
        assert!(!repo.can_push());
    }

    #[test]
    fn commit_emails_skip_missing_and_blank() {
        let json = r#"{
            "sha": "abc",
            "commit": {
                "author": {"name": "A", "email": "a@example.com"},
                "committer": {"name": "GitHub", "email": ""}
            }
        }"#;
        let commit: Commit = serde_json::from_str(json).expect("decode");
        assert_eq!(commit.emails().collect::<Vec<_>>(), vec!["a@example.com"]);

        let bare: Commit = serde_json::from_str(r#"{"commit": {"author": null}}"#).expect("decode");
        assert_eq!(bare.emails().count(), 0);
    }

    #[test]
    fn pull_request_user_is_optional() {
        let pr: PullRequest =
            serde_json::from_str(r#"{"number": 7, "user": null}"#).expect("decode");
        assert_eq!(pr.number, 7);
        assert!(pr.user.is_none());
    }

    #[test]
    fn classify_distinguishes_rate_limits_from_auth() {
        match classify(403, true, Some(String::from("1700000000")), "u") {
            GitHubError::RateLimited { reset_at } => assert_eq!(reset_at, "1700000000"),
            other => panic!("expected RateLimited, got {other:?}"),
        }
        assert!(matches!(
            classify(403, false, None, "u"),
            GitHubError::AuthenticationFailed(403)
        ));
        assert!(matches!(
            classify(401, false, None, "u"),
            GitHubError::AuthenticationFailed(401)
        ));
        assert!(matches!(
            classify(429, false, None, "u"),
            GitHubError::RateLimited { .. }
        ));
        assert!(matches!(
            classify(500, false, None, "https://api.github.com/user"),
            GitHubError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = GitHubClient::new("https://ghe.example.com/api/v3/", "t").expect("client");
        assert_eq!(client.api_url, "https://ghe.example.com/api/v3");
    }
}
