use anyhow::Result;
use capscraper::dashboard::{self, embed};
use clap::Parser;
use reqwest::Client;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Fetch the hosted empire CSVs and bake them into the static dashboard.
#[derive(Parser, Debug)]
struct Args {
    /// HTML template containing the data placeholder
    #[arg(long, default_value = "input.html")]
    template: PathBuf,

    /// Finished page destination
    #[arg(long, default_value = "index.html")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    let client = Client::new();

    let sources = dashboard::SourceUrls::default();
    let data = dashboard::assemble(&client, &sources).await?;
    embed::embed_into_template(&data, &args.template, &args.out)?;
    info!(out = %args.out.display(), "dashboard written");

    Ok(())
}
