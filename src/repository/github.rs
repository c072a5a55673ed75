//! GitHub repository client.
//!
//! Lists files via: GET {api_base}/repos/{owner}/{repo}/contents
//! Fetches files from: {raw_base}/{owner}/{repo}/{branch}/{path}

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{RepositoryError, SourceFilter, SourceRef, SourceRepository};
use crate::config::RepositoryConfig;

const CONTENTS_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// One entry of a contents API directory listing.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    url: String,
}

/// Unauthenticated, read-only client for one GitHub repository.
pub struct GitHubRepository {
    http: Client,
    owner: String,
    repo: String,
    config: RepositoryConfig,
    filter: SourceFilter,
}

impl GitHubRepository {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        config: RepositoryConfig,
    ) -> Result<Self, RepositoryError> {
        let http = Client::builder()
            .user_agent(concat!("gittextlab/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let filter = SourceFilter::from_config(&config)?;

        Ok(Self {
            http,
            owner: owner.into(),
            repo: repo.into(),
            config,
            filter,
        })
    }

    /// Create a client from an `OWNER/REPO` string.
    pub fn from_slug(slug: &str, config: RepositoryConfig) -> Result<Self, RepositoryError> {
        let (owner, repo) =
            parse_slug(slug).ok_or_else(|| RepositoryError::InvalidSlug(slug.to_string()))?;
        Self::new(owner, repo, config)
    }

    fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents",
            self.config.api_base.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }

    fn raw_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.config.raw_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.config.branch,
            path.trim_start_matches('/')
        )
    }

    /// List one directory, recursing into subdirectories in listing order.
    ///
    /// A failed status on the repository root is an error. Below the root the
    /// directory is skipped with a warning.
    fn list_dir<'a>(
        &'a self,
        url: String,
        root: bool,
    ) -> BoxFuture<'a, Result<Vec<SourceRef>, RepositoryError>> {
        async move {
            debug!(url = %url, "listing directory");
            let response = self
                .http
                .get(&url)
                .header(ACCEPT, CONTENTS_MEDIA_TYPE)
                .send()
                .await
                .map_err(classify)?;

            let status = response.status();
            if !status.is_success() {
                if root {
                    return Err(RepositoryError::Status(status.as_u16()));
                }
                warn!(url = %url, status = status.as_u16(), "directory listing failed, skipping");
                return Ok(Vec::new());
            }

            let entries: Vec<ContentEntry> = response.json().await?;
            let mut sources = Vec::new();
            for entry in entries {
                match entry.kind.as_str() {
                    "file" if self.filter.matches(&entry.path) => {
                        let location = self.raw_url(&entry.path);
                        sources.push(SourceRef::new(entry.path, location));
                    }
                    "dir" => sources.extend(self.list_dir(entry.url, false).await?),
                    _ => {}
                }
            }
            Ok(sources)
        }
        .boxed()
    }
}

#[async_trait]
impl SourceRepository for GitHubRepository {
    fn identity(&self) -> String {
        format!("{}_{}", self.owner, self.repo)
    }

    async fn list_sources(&self) -> Result<Vec<SourceRef>, RepositoryError> {
        self.list_dir(self.contents_url(), true).await
    }

    async fn fetch(&self, source: &SourceRef) -> Result<String, RepositoryError> {
        let response = self
            .http
            .get(&source.location)
            .timeout(self.config.fetch_timeout())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepositoryError::Status(status.as_u16()));
        }
        response.text().await.map_err(classify)
    }
}

fn classify(e: reqwest::Error) -> RepositoryError {
    if e.is_timeout() {
        RepositoryError::Timeout
    } else {
        RepositoryError::Network(e)
    }
}

/// Split `OWNER/REPO` (a trailing `.git` or slash is tolerated).
pub fn parse_slug(slug: &str) -> Option<(String, String)> {
    let slug = slug.trim().trim_end_matches('/');
    let slug = slug.strip_suffix(".git").unwrap_or(slug);
    let (owner, repo) = slug.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}
