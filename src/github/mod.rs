//! Thin client for the GitHub REST API.
//!
//! Repositories are served straight from the upstream on every request,
//! nothing is mirrored locally.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

const FETCH_TIMEOUT_SEC: u64 = 30;
const REPOS_PER_PAGE: u32 = 100;

/// Failure while fetching from the GitHub API. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("GitHub API returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("GitHub API request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A repository trimmed down to the fields API consumers get.
#[derive(Debug, Serialize)]
pub struct Repo {
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub language: Option<String>,
    pub stars: i64,
    pub forks: i64,
    pub created_at: String,
    pub updated_at: String,
    pub private: bool,
}

#[derive(Debug, Deserialize)]
struct RemoteRepo {
    name: String,
    description: Option<String>,
    html_url: String,
    language: Option<String>,
    stargazers_count: i64,
    forks_count: i64,
    created_at: String,
    updated_at: String,
    private: bool,
}

impl From<RemoteRepo> for Repo {
    fn from(repo: RemoteRepo) -> Self {
        Self {
            name: repo.name,
            description: repo.description,
            url: repo.html_url,
            language: repo.language,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
            private: repo.private,
        }
    }
}

pub struct GithubClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl GithubClient {
    /// `base_url` points at the API root, e.g. "https://api.github.com".
    pub fn new(base_url: String, api_token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SEC))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    /// List the authenticated user's repositories, most recently updated
    /// first.
    pub async fn fetch_repos(&self) -> Result<Vec<Repo>, GithubError> {
        let url = format!(
            "{}/user/repos?visibility=all&sort=updated&per_page={}",
            self.base_url, REPOS_PER_PAGE
        );
        let remote: Vec<RemoteRepo> = self.get_json(&url).await?;
        Ok(remote.into_iter().map(Repo::from).collect())
    }

    /// Bytes of code per language for one repository.
    pub async fn fetch_repo_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<BTreeMap<String, i64>, GithubError> {
        let url = format!("{}/repos/{}/{}/languages", self.base_url, owner, repo);
        self.get_json(&url).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, GithubError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
            .header(reqwest::header::USER_AGENT, "catalog-mirror-server")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GithubError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
