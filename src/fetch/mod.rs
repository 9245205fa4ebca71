// src/fetch/mod.rs
use anyhow::{Context, Result};
use reqwest::Client;
use url::Url;

/// Fetch the body of a named CSV resource.
///
/// Any transport failure or non-success status is fatal; the error names the
/// resource so the operator can tell which source broke.
pub async fn fetch_csv(client: &Client, name: &str, url_str: &str) -> Result<String> {
    let url =
        Url::parse(url_str).with_context(|| format!("parsing URL for {}: {}", name, url_str))?;

    let body = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()
        .with_context(|| format!("fetching {} from {}", name, url))?
        .text()
        .await
        .with_context(|| format!("reading body of {} from {}", name, url))?;

    Ok(body)
}
