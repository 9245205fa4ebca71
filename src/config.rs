// src/config.rs
use std::env;

/// Page holding the all-countries market-cap table.
pub const COUNTRIES_URL: &str = "https://www.marketcapwatch.com/all-countries/";

/// GitHub repository the published CSVs live in (owner/name).
pub const REPO_NAME: &str = "ayeeff/marketcap";

/// Repo path of the cleaned countries table.
pub const COUNTRIES_REPO_PATH: &str = "data/countries_marketcap.csv";

/// Repo path of the per-empire totals.
pub const TOTALS_REPO_PATH: &str = "data/empire_totals.csv";

/// Environment variable carrying the GitHub token.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

/// The publish token, if one is configured. Empty values count as unset.
pub fn github_token() -> Option<String> {
    env::var(TOKEN_VAR).ok().filter(|t| !t.trim().is_empty())
}

/// Whether this process appears to run inside a recognized CI context.
pub fn running_in_ci() -> bool {
    env::var_os("CI").is_some() || env::var_os("GITHUB_ACTIONS").is_some()
}
