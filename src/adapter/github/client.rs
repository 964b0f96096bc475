//! HTTP client for the versioned content store.
//!
//! Two surfaces:
//! - the contents API for single-file read/write with a sha precondition
//! - the git-data API (refs, trees, commits) for bulk replacement, so a batch
//!   of snapshots lands as one commit instead of a commit storm
//!
//! The public raw path serves unauthenticated reads for the freshness gate.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::port::{FileEntry, PublishTarget, PublishedReader, RemoteContent, SnapshotStore};

pub struct ContentsClient {
    http: HttpClient,
    api_url: String,
    raw_url: String,
}

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
    tree: TreeRef,
}

#[derive(Deserialize)]
struct TreeRef {
    sha: String,
}

#[derive(Deserialize)]
struct CreatedObject {
    sha: String,
}

impl ContentsClient {
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("marketmirror"));
        if let Some(token) = &config.token {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(err) => warn!(error = %err, "Ignoring malformed store token"),
            }
        }

        let http = HttpClient::builder()
            .timeout(Duration::from_millis(config.http.timeout_ms))
            .connect_timeout(Duration::from_millis(config.http.connect_timeout_ms))
            .default_headers(headers)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            api_url: config.api_url.clone(),
            raw_url: config.raw_url.clone(),
        }
    }

    fn contents_url(&self, target: &PublishTarget, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url, target.owner, target.repo, path
        )
    }

    fn git_url(&self, target: &PublishTarget, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/git/{}",
            self.api_url, target.owner, target.repo, tail
        )
    }

    async fn check_status(
        response: reqwest::Response,
        path: &str,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(StoreError::Status {
            status: status.as_u16(),
            path: path.to_string(),
        }
        .into())
    }
}

#[async_trait]
impl SnapshotStore for ContentsClient {
    async fn read(&self, target: &PublishTarget, path: &str) -> Result<Option<RemoteContent>> {
        let url = self.contents_url(target, path);
        let response = self
            .http
            .get(&url)
            .query(&[("ref", target.branch.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_status(response, path).await?;
        let body: ContentsResponse = response.json().await?;

        // The API wraps base64 at 60 columns; strip whitespace before decoding.
        let encoded: String = body
            .content
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let content = BASE64
            .decode(encoded)
            .map_err(|err| StoreError::Malformed {
                path: path.to_string(),
                reason: format!("invalid base64 content: {err}"),
            })?;

        Ok(Some(RemoteContent {
            version: body.sha,
            content,
        }))
    }

    async fn write(
        &self,
        target: &PublishTarget,
        path: &str,
        content: &str,
        message: &str,
        expected_version: Option<&str>,
    ) -> Result<()> {
        let url = self.contents_url(target, path);
        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content),
            "branch": target.branch,
        });
        if let Some(sha) = expected_version {
            body["sha"] = json!(sha);
        }

        let response = self.http.put(&url).json(&body).send().await?;
        let status = response.status();

        // The store rejects a stale precondition with 409 (or 422 when the
        // sha no longer names the current blob).
        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(StoreError::Conflict {
                path: path.to_string(),
                expected: expected_version.unwrap_or("<new file>").to_string(),
            }
            .into());
        }
        Self::check_status(response, path).await?;
        debug!(path, "Wrote artifact");
        Ok(())
    }

    async fn bulk_replace(
        &self,
        target: &PublishTarget,
        files: &[FileEntry],
        message: &str,
    ) -> Result<()> {
        // Head commit of the branch.
        let ref_url = self.git_url(target, &format!("refs/heads/{}", target.branch));
        let response = self.http.get(&ref_url).send().await?;
        let head: RefResponse = Self::check_status(response, &ref_url).await?.json().await?;

        let commit_url = self.git_url(target, &format!("commits/{}", head.object.sha));
        let response = self.http.get(&commit_url).send().await?;
        let head_commit: CommitResponse =
            Self::check_status(response, &commit_url).await?.json().await?;

        // One tree carrying every file, based on the head commit's tree.
        let entries: Vec<serde_json::Value> = files
            .iter()
            .map(|f| {
                json!({
                    "path": f.path,
                    "mode": "100644",
                    "type": "blob",
                    "content": f.content,
                })
            })
            .collect();
        let trees_url = self.git_url(target, "trees");
        let response = self
            .http
            .post(&trees_url)
            .json(&json!({
                "base_tree": head_commit.tree.sha,
                "tree": entries,
            }))
            .send()
            .await?;
        let tree: CreatedObject = Self::check_status(response, &trees_url).await?.json().await?;

        // One commit on top of head.
        let commits_url = self.git_url(target, "commits");
        let response = self
            .http
            .post(&commits_url)
            .json(&json!({
                "message": message,
                "tree": tree.sha,
                "parents": [head_commit.sha],
            }))
            .send()
            .await?;
        let commit: CreatedObject =
            Self::check_status(response, &commits_url).await?.json().await?;

        // Fast-forward the branch; the store rejects this if the branch moved
        // since we read it, which keeps bulk writes conflict-safe too.
        let response = self
            .http
            .patch(&ref_url)
            .json(&json!({ "sha": commit.sha }))
            .send()
            .await?;
        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(StoreError::Conflict {
                path: format!("refs/heads/{}", target.branch),
                expected: head.object.sha,
            }
            .into());
        }
        Self::check_status(response, &ref_url).await?;

        debug!(files = files.len(), commit = %commit.sha, "Bulk replaced artifacts");
        Ok(())
    }
}

#[async_trait]
impl PublishedReader for ContentsClient {
    async fn read_published(&self, target: &PublishTarget, path: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/{}/{}/{}/{}",
            self.raw_url, target.owner, target.repo, target.branch, path
        );
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_status(response, path).await?;
        Ok(Some(response.text().await?))
    }
}
