//! Remote mirror for the flat-file backend.
//!
//! After every local write the changed file is pushed to a GitHub
//! repository through the contents API, and at startup any school file
//! missing locally is pulled back down. Both directions are best effort.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

const GITHUB_API_BASE: &str = "https://api.github.com";

/// A remote store that mirrors individual school files
#[async_trait]
pub trait BlobSync: Send + Sync {
    /// Upload a local file to `remote_path`. Returns false if the remote refused it.
    async fn push(&self, local_path: &Path, remote_path: &str) -> Result<bool>;

    /// Download `remote_path` into `local_path`. Returns false if the remote has no copy.
    async fn restore(&self, remote_path: &str, local_path: &Path) -> Result<bool>;
}

/// Settings for mirroring into a GitHub repository
#[derive(Debug, Clone)]
pub struct GithubSyncSettings {
    /// `owner/name`
    pub repo: String,
    pub branch: String,
    pub token: String,
    /// Directory inside the repository that holds the school folders
    pub path_prefix: String,
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

/// Mirror backed by the GitHub contents API
pub struct GithubContentsSync {
    client: reqwest::Client,
    api_base: String,
    settings: GithubSyncSettings,
}

impl GithubContentsSync {
    pub fn new(settings: GithubSyncSettings) -> Result<Self> {
        Self::with_api_base(settings, GITHUB_API_BASE)
    }

    pub fn with_api_base(settings: GithubSyncSettings, api_base: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("token {}", settings.token))
                .context("GitHub token contains invalid header characters")?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("school-van-tracker"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("failed to build GitHub HTTP client")?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            settings,
        })
    }

    /// Contents API URL for a school file
    fn contents_url(&self, remote_path: &str) -> String {
        let prefix = self.settings.path_prefix.trim_matches('/');
        let full_path = if prefix.is_empty() {
            remote_path.to_string()
        } else {
            format!("{}/{}", prefix, remote_path)
        };
        format!("{}/repos/{}/contents/{}", self.api_base, self.settings.repo, full_path)
    }

    /// Fetch the current entry for a path, or None if it does not exist yet
    async fn fetch_entry(&self, remote_path: &str) -> Result<Option<ContentsEntry>> {
        let response = self
            .client
            .get(self.contents_url(remote_path))
            .query(&[("ref", self.settings.branch.as_str())])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json::<ContentsEntry>().await?)),
            status => Err(anyhow!("GitHub returned {} for {}", status, remote_path)),
        }
    }
}

/// The contents API wraps base64 payloads at 60 columns
fn decode_content(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64.decode(compact).context("remote file is not valid base64")
}

#[async_trait]
impl BlobSync for GithubContentsSync {
    async fn push(&self, local_path: &Path, remote_path: &str) -> Result<bool> {
        let bytes = tokio::fs::read(local_path)
            .await
            .with_context(|| format!("failed to read {}", local_path.display()))?;

        let sha = self.fetch_entry(remote_path).await?.map(|entry| entry.sha);
        let body = PutContents {
            message: format!("Update {}", remote_path),
            content: BASE64.encode(&bytes),
            branch: &self.settings.branch,
            sha,
        };

        let response = self
            .client
            .put(self.contents_url(remote_path))
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            debug!("Pushed {} ({} bytes)", remote_path, bytes.len());
            Ok(true)
        } else {
            warn!("GitHub rejected push of {}: {}", remote_path, response.status());
            Ok(false)
        }
    }

    async fn restore(&self, remote_path: &str, local_path: &Path) -> Result<bool> {
        let Some(entry) = self.fetch_entry(remote_path).await? else {
            return Ok(false);
        };
        let Some(content) = entry.content else {
            return Ok(false);
        };

        let bytes = decode_content(&content)?;
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, &bytes).await?;
        info!("Restored {} from {}", local_path.display(), self.settings.repo);
        Ok(true)
    }
}
