use anyhow::{bail, Context, Result};
use capscraper::{
    browser, config,
    process::{self, empire, numeric},
    publish,
};
use chrono::Utc;
use clap::Parser;
use reqwest::Client;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Scrape the all-countries market-cap table, derive the global-share and
/// per-empire totals, and publish the results.
#[derive(Parser, Debug)]
struct Args {
    /// Page holding the market-cap table
    #[arg(long, default_value = config::COUNTRIES_URL)]
    url: String,

    /// Where to write the cleaned countries CSV
    #[arg(long, default_value = "countries_marketcap.csv")]
    out: PathBuf,

    /// Where to write the per-empire totals CSV
    #[arg(long, default_value = "empire_totals.csv")]
    totals_out: PathBuf,

    /// GitHub repo to publish into (owner/name)
    #[arg(long, default_value = config::REPO_NAME)]
    repo: String,

    /// Fail when no token is configured and we are not in CI
    #[arg(long)]
    require_token: bool,

    /// Keep the local CSVs after a successful upload
    #[arg(long)]
    keep_local: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    info!(url = %args.url, "startup");

    // ─── 2) resolve the publish token ────────────────────────────────
    let token = config::github_token();
    if token.is_none() {
        if args.require_token && !config::running_in_ci() {
            bail!(
                "{} is not set and --require-token was given outside CI",
                config::TOKEN_VAR
            );
        }
        warn!("no {} set; running in local-only mode", config::TOKEN_VAR);
    }

    // ─── 3) scrape the countries table ───────────────────────────────
    let capture = browser::capture_page(&args.url).await?;
    let mut table = process::extract_first_table(&capture.html)?;
    info!(
        rows = table.rows.len(),
        browser = %capture.browser,
        "extracted countries table"
    );

    // ─── 4) clean and derive ─────────────────────────────────────────
    numeric::strip_thousands_separators(&mut table);
    if let Some(total) = numeric::derive_percent_of_global(&mut table) {
        info!(global_total = %numeric::format_market_cap(total), "derived global shares");
    }

    // ─── 5) per-empire totals ────────────────────────────────────────
    let today = Utc::now().format("%Y-%m-%d").to_string();
    let totals = empire::empire_totals(&table);
    if let Some(totals) = &totals {
        for t in totals {
            info!(empire = t.empire, label = t.label, total = %t.formatted_total(), "empire total");
        }
    }

    // ─── 6) write local CSVs ─────────────────────────────────────────
    let mut artifacts: Vec<(PathBuf, &str)> = vec![(args.out.clone(), config::COUNTRIES_REPO_PATH)];
    publish::write_csv(&table, &args.out)?;
    if let Some(totals) = &totals {
        publish::write_csv(&empire::totals_table(totals, &today), &args.totals_out)?;
        artifacts.push((args.totals_out.clone(), config::TOTALS_REPO_PATH));
    }
    info!(files = artifacts.len(), "wrote local CSVs");

    // ─── 7) upload, then clean up local copies ───────────────────────
    match token {
        Some(token) => {
            let client = Client::new();
            let publisher = publish::GithubPublisher::new(&client, &args.repo, token);
            for (local, repo_path) in &artifacts {
                publisher.upload_file(local, repo_path).await?;
            }
            if !args.keep_local {
                for (local, _) in &artifacts {
                    fs::remove_file(local)
                        .with_context(|| format!("removing {}", local.display()))?;
                }
            }
            info!("upload complete");
        }
        None => info!("skipping upload"),
    }

    info!("all done");
    Ok(())
}
