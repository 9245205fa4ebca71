// src/dashboard/mod.rs
use anyhow::Result;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::fetch;

pub mod embed;
pub mod rows;

use rows::{CityRow, CompanyRow, GdpRow, InstitutionRow, MarketCapTotalRow, RdExpenditureRow};

/// Hosted location of the published CSVs.
const RAW_BASE: &str = "https://raw.githubusercontent.com/ayeeff/marketcap/main/data";

/// The six CSV resources the dashboard is built from.
#[derive(Debug, Clone)]
pub struct SourceUrls {
    pub companies: String,
    pub institutions: String,
    pub market_cap_totals: String,
    pub rd_expenditure: String,
    pub gdp: String,
    pub cities: String,
}

impl Default for SourceUrls {
    fn default() -> Self {
        Self {
            companies: format!("{}/empire_top_companies.csv", RAW_BASE),
            institutions: format!("{}/nature_index_empires.csv", RAW_BASE),
            market_cap_totals: format!("{}/empire_totals.csv", RAW_BASE),
            rd_expenditure: format!("{}/empire_rd_expenditure_latest.csv", RAW_BASE),
            gdp: format!("{}/empire_gdp_ppp_2025.csv", RAW_BASE),
            cities: format!("{}/empire_cities.csv", RAW_BASE),
        }
    }
}

/// Everything the static page needs, serialized into its data placeholder.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub companies: Vec<CompanyRow>,
    pub institutions: Vec<InstitutionRow>,
    pub market_cap_totals: Vec<MarketCapTotalRow>,
    pub rd_expenditure: Vec<RdExpenditureRow>,
    pub gdp: Vec<GdpRow>,
    pub cities: Vec<CityRow>,
    pub generated: String,
}

/// Fetch and parse all six sources, strictly in sequence. Any fetch or parse
/// failure aborts the whole aggregation; there is no partial document.
pub async fn assemble(client: &Client, sources: &SourceUrls) -> Result<DashboardData> {
    let body = fetch::fetch_csv(client, "empire top companies", &sources.companies).await?;
    let companies = rows::parse_companies(&body)?;
    info!(rows = companies.len(), "parsed companies");

    let body = fetch::fetch_csv(client, "research institutions", &sources.institutions).await?;
    let institutions = rows::parse_institutions(&body)?;
    info!(rows = institutions.len(), "parsed institutions");

    let body = fetch::fetch_csv(client, "empire totals", &sources.market_cap_totals).await?;
    let market_cap_totals = rows::parse_market_cap_totals(&body)?;
    info!(rows = market_cap_totals.len(), "parsed market-cap totals");

    let body = fetch::fetch_csv(client, "R&D expenditure", &sources.rd_expenditure).await?;
    let rd_expenditure = rows::parse_rd_expenditure(&body)?;
    info!(rows = rd_expenditure.len(), "parsed R&D expenditure");

    let body = fetch::fetch_csv(client, "GDP", &sources.gdp).await?;
    let gdp = rows::parse_gdp(&body)?;
    info!(rows = gdp.len(), "parsed GDP");

    let body = fetch::fetch_csv(client, "empire cities", &sources.cities).await?;
    let cities = rows::parse_cities(&body)?;
    info!(rows = cities.len(), "parsed cities");

    Ok(DashboardData {
        companies,
        institutions,
        market_cap_totals,
        rd_expenditure,
        gdp,
        cities,
        generated: Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_csv(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    fn sources_for(server: &MockServer) -> SourceUrls {
        let base = server.uri();
        SourceUrls {
            companies: format!("{}/companies.csv", base),
            institutions: format!("{}/institutions.csv", base),
            market_cap_totals: format!("{}/totals.csv", base),
            rd_expenditure: format!("{}/rd.csv", base),
            gdp: format!("{}/gdp.csv", base),
            cities: format!("{}/cities.csv", base),
        }
    }

    #[tokio::test]
    async fn assembles_all_six_sources() -> Result<()> {
        let server = MockServer::start().await;
        mount_csv(
            &server,
            "/companies.csv",
            "Empire,Company,Country,Market Cap\n1,\"BP\nBP\",United Kingdom,$100 B\nx,Junk,Y,$1 B\n",
        )
        .await;
        mount_csv(
            &server,
            "/institutions.csv",
            "Empire,Rank,Institution,Country,Global_Rank\n3,1,CAS,China,1\n",
        )
        .await;
        mount_csv(
            &server,
            "/totals.csv",
            "Empire,Total Market Cap,Date\n1,$12.26 T,2025-08-05\n",
        )
        .await;
        mount_csv(&server, "/rd.csv", "empire#,total,%\n1.0,130,7.9\n").await;
        mount_csv(&server, "/gdp.csv", "empire#,total,%\n2.0,30507,38.7\n").await;
        mount_csv(
            &server,
            "/cities.csv",
            "Empire,Rank,City,Country,Population,Date\n2,1,New York,United States,8804190,2025-08-05\n",
        )
        .await;

        let client = Client::new();
        let data = assemble(&client, &sources_for(&server)).await?;

        assert_eq!(data.companies.len(), 1);
        assert_eq!(data.companies[0].ticker, "BP");
        assert_eq!(data.institutions[0].global_rank, Some(1));
        assert_eq!(data.market_cap_totals[0].total, "$12.26 T");
        assert_eq!(data.rd_expenditure[0].empire, 1);
        assert_eq!(data.gdp[0].percent, Some(38.7));
        assert_eq!(data.cities[0].population, Some(8_804_190));
        assert!(!data.generated.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failed_source_aborts_and_names_the_resource() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/companies.csv"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = Client::new();
        let err = assemble(&client, &sources_for(&server)).await.unwrap_err();
        assert!(format!("{:#}", err).contains("empire top companies"));
        Ok(())
    }
}
