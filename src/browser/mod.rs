// src/browser/mod.rs
//
// Headless page capture for client-rendered sites. A Chromium binary is
// spawned with `--dump-dom`; each capture grants the page a fixed
// virtual-time settle budget, and the capture is repeated (bounded) until a
// `<table>` shows up in the DOM.

use anyhow::{bail, Context, Result};
use scraper::{Html, Selector};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Browser binaries to probe, in preference order.
const CANDIDATE_BROWSERS: &[&str] = &["chromium", "chromium-browser", "chrome", "google-chrome"];

/// Desktop user agent presented to the target site.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Viewport the page is rendered at.
const WINDOW_SIZE: (u32, u32) = (1920, 1080);

/// Virtual time granted to client-side rendering before the DOM is captured,
/// in milliseconds.
const SETTLE_BUDGET_MS: u32 = 5_000;

/// Hard ceiling on a single capture attempt.
const CAPTURE_TIMEOUT: Duration = Duration::from_secs(60);

/// Capture attempts before a missing table is left to the extraction step.
const MAX_TABLE_ATTEMPTS: usize = 4;

/// The rendered DOM of one page visit.
pub struct PageCapture {
    pub html: String,
    pub browser: String,
}

/// Navigate to `url` and return the rendered page HTML.
///
/// The capture is retried up to [`MAX_TABLE_ATTEMPTS`] until a `<table>` is
/// present; the last DOM is returned either way, and the extraction step owns
/// the fatal no-table error.
pub async fn capture_page(url: &str) -> Result<PageCapture> {
    let browser = detect_browser().context("no headless-capable browser found on PATH")?;
    info!(browser = %browser, url = %url, "starting headless capture");

    let mut html = String::new();
    for attempt in 1..=MAX_TABLE_ATTEMPTS {
        html = dump_dom(&browser, url).await?;
        if html_has_table(&html) {
            debug!(attempt, "table present in captured DOM");
            break;
        }
        warn!(attempt, "captured DOM has no table yet");
    }

    Ok(PageCapture { html, browser })
}

/// Locate the first headless-capable browser binary on PATH.
fn detect_browser() -> Option<String> {
    for candidate in CANDIDATE_BROWSERS {
        if on_path(candidate) {
            debug!(browser = *candidate, "headless browser detected on PATH");
            return Some((*candidate).to_string());
        }
    }
    None
}

fn on_path(binary: &str) -> bool {
    if let Ok(path_var) = std::env::var("PATH") {
        for dir in path_var.split(':') {
            if Path::new(dir).join(binary).is_file() {
                return true;
            }
        }
    }
    false
}

/// Run one headless capture of `url` and return the dumped DOM.
///
/// The child is spawned with `kill_on_drop` so a timeout cannot leak a
/// browser process, and its scratch directory lives only for this attempt.
async fn dump_dom(browser: &str, url: &str) -> Result<String> {
    let scratch = TempDir::new().context("creating browser scratch directory")?;
    let window = format!("{},{}", WINDOW_SIZE.0, WINDOW_SIZE.1);

    let mut cmd = Command::new(browser);
    cmd.arg("--headless=new")
        .arg("--no-sandbox")
        .arg("--disable-gpu")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-software-rasterizer")
        .arg("--disable-blink-features=AutomationControlled")
        .arg(format!("--window-size={}", window))
        .arg(format!("--user-agent={}", USER_AGENT))
        .arg(format!("--virtual-time-budget={}", SETTLE_BUDGET_MS))
        .arg("--dump-dom")
        .arg(url)
        .current_dir(scratch.path())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .with_context(|| format!("spawning {}", browser))?;

    let output = match timeout(CAPTURE_TIMEOUT, child.wait_with_output()).await {
        Ok(result) => result.with_context(|| format!("waiting for {}", browser))?,
        Err(_) => bail!(
            "browser timed out after {}s capturing {}",
            CAPTURE_TIMEOUT.as_secs(),
            url
        ),
    };

    if !output.status.success() {
        // Chromium sometimes exits non-zero after a successful dump; only the
        // absence of output is treated as failure below.
        warn!(status = ?output.status, url = %url, "browser exited with non-zero status");
    }

    let html = String::from_utf8_lossy(&output.stdout).into_owned();
    if html.trim().is_empty() {
        bail!("browser produced no DOM for {}", url);
    }

    Ok(html)
}

fn html_has_table(html: &str) -> bool {
    let selector = Selector::parse("table").expect("selector should parse");
    Html::parse_document(html).select(&selector).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_table_in_dom() {
        assert!(html_has_table(
            "<html><body><table><tr><td>x</td></tr></table></body></html>"
        ));
        assert!(!html_has_table("<html><body><p>loading…</p></body></html>"));
    }
}
