// src/publish/mod.rs
//
// Local CSV writing plus the GitHub side of the pipeline: read the existing
// blob SHA, update in place, fall back to create when the path does not exist
// yet. Anything other than a clean 404 on the metadata read is fatal.

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;
use url::Url;

use crate::process::RawTable;

const API_BASE: &str = "https://api.github.com";

/// Write a table to `path` as CSV, header row first.
pub fn write_csv(table: &RawTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer
        .write_record(&table.headers)
        .context("writing CSV header")?;
    for row in &table.rows {
        writer
            .write_record(row)
            .with_context(|| format!("writing CSV row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

#[derive(Deserialize)]
struct ContentsMeta {
    sha: String,
}

/// Create-or-update publisher for one repository.
pub struct GithubPublisher<'a> {
    client: &'a Client,
    repo: String,
    token: String,
    api_base: String,
}

impl<'a> GithubPublisher<'a> {
    pub fn new(client: &'a Client, repo: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            repo: repo.into(),
            token: token.into(),
            api_base: API_BASE.to_string(),
        }
    }

    /// Point the publisher at a different API endpoint. Tests use this to
    /// swap in a local mock server.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn contents_url(&self, repo_path: &str) -> Result<Url> {
        Url::parse(&format!(
            "{}/repos/{}/contents/{}",
            self.api_base, self.repo, repo_path
        ))
        .with_context(|| format!("building contents URL for {}", repo_path))
    }

    fn user_agent(&self) -> String {
        format!("capscraper/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Blob SHA of `repo_path` on the default branch, or `None` when the file
    /// does not exist yet.
    async fn existing_sha(&self, repo_path: &str) -> Result<Option<String>> {
        let url = self.contents_url(repo_path)?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header("User-Agent", self.user_agent())
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .with_context(|| format!("reading metadata of {}", repo_path))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let meta: ContentsMeta = resp
                    .json()
                    .await
                    .with_context(|| format!("parsing metadata of {}", repo_path))?;
                Ok(Some(meta.sha))
            }
            status => bail!("GitHub API error {} reading {}", status, repo_path),
        }
    }

    /// Create or update `repo_path` with `content`, committing with a
    /// timestamped message.
    pub async fn upsert_file(&self, repo_path: &str, content: &str) -> Result<()> {
        let sha = self.existing_sha(repo_path).await?;
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();
        let file_name = repo_path.rsplit('/').next().unwrap_or(repo_path);

        let mut body = serde_json::json!({
            "message": commit_message(file_name, sha.is_some(), &timestamp),
            "content": BASE64.encode(content.as_bytes()),
        });
        if let Some(sha) = &sha {
            body["sha"] = serde_json::Value::String(sha.clone());
        }

        let url = self.contents_url(repo_path)?;
        let resp = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .header("User-Agent", self.user_agent())
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await
            .with_context(|| format!("writing {}", repo_path))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("GitHub API error {} writing {}", status, repo_path);
        }

        info!(path = %repo_path, updated = sha.is_some(), "pushed file to GitHub");
        Ok(())
    }

    /// Upload a local file to `repo_path`.
    pub async fn upload_file(&self, local_path: &Path, repo_path: &str) -> Result<()> {
        let content = fs::read_to_string(local_path)
            .with_context(|| format!("reading {}", local_path.display()))?;
        self.upsert_file(repo_path, &content).await
    }
}

fn commit_message(file_name: &str, update: bool, timestamp: &str) -> String {
    if update {
        format!("Update {} - {}", file_name, timestamp)
    } else {
        format!("Add {} - {}", file_name, timestamp)
    }
}
