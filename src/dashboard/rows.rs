// src/dashboard/rows.rs
//
// Typed rows for the six hosted CSVs. Column resolution is alias-based: each
// declared field binds to the first header matching any of its documented
// aliases (case-insensitive). A source missing a required column is a
// structural failure; a row whose empire key is not a whole number is
// silently dropped; any other malformed numeric cell becomes null.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::HashMap;

/// Case-insensitive header lookup preserving first-seen positions.
pub struct HeaderMap {
    index: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn new(headers: &csv::StringRecord) -> Self {
        let mut index = HashMap::new();
        for (i, name) in headers.iter().enumerate() {
            index.entry(name.trim().to_lowercase()).or_insert(i);
        }
        Self { index }
    }

    /// Index of the first header matching any of `aliases`, in alias order.
    pub fn resolve(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|a| self.index.get(&a.to_lowercase()).copied())
    }

    /// Like [`Self::resolve`], but a missing column is fatal and names both
    /// the source and the column looked for.
    pub fn require(&self, source: &str, aliases: &[&str]) -> Result<usize> {
        match self.resolve(aliases) {
            Some(i) => Ok(i),
            None => bail!("{} CSV has no {:?} column", source, aliases[0]),
        }
    }
}

/// Empire keys come through as `1`, `1.0`, or junk; only whole numbers are
/// valid identifiers.
pub fn parse_empire(value: &str) -> Option<i64> {
    let v: f64 = value.trim().parse().ok()?;
    if v.is_finite() && v.fract() == 0.0 {
        Some(v as i64)
    } else {
        None
    }
}

/// The company cell holds "Name\nTICKER"; a missing ticker stays empty.
fn split_name_ticker(combined: &str) -> (String, String) {
    match combined.split_once('\n') {
        Some((name, ticker)) => (name.trim().to_string(), ticker.trim().to_string()),
        None => (combined.trim().to_string(), String::new()),
    }
}

fn cell<'r>(record: &'r csv::StringRecord, col: usize) -> &'r str {
    record.get(col).unwrap_or("").trim()
}

fn opt_cell(record: &csv::StringRecord, col: Option<usize>) -> String {
    col.and_then(|c| record.get(c))
        .unwrap_or("")
        .trim()
        .to_string()
}

fn parse_int(value: &str) -> Option<i64> {
    value.trim().replace(',', "").parse().ok()
}

fn parse_float(value: &str) -> Option<f64> {
    value.trim().trim_end_matches('%').parse().ok()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRow {
    pub empire: i64,
    pub name: String,
    pub ticker: String,
    pub market_cap: String,
    pub country: String,
}

pub fn parse_companies(body: &str) -> Result<Vec<CompanyRow>> {
    let mut reader = reader_for(body);
    let headers = HeaderMap::new(reader.headers().context("reading companies header")?);
    let empire_col = headers.require("companies", &["Empire", "empire#"])?;
    let company_col = headers.require("companies", &["Company", "Name"])?;
    let cap_col = headers.require("companies", &["Market Cap", "MarketCap", "market_cap"])?;
    let country_col = headers.resolve(&["Country", "country/region", "CountryCode"]);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("parsing companies CSV")?;
        let empire = match parse_empire(cell(&record, empire_col)) {
            Some(e) => e,
            None => continue,
        };
        let (name, ticker) = split_name_ticker(cell(&record, company_col));
        rows.push(CompanyRow {
            empire,
            name,
            ticker,
            market_cap: cell(&record, cap_col).to_string(),
            country: opt_cell(&record, country_col),
        });
    }
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionRow {
    pub empire: i64,
    pub rank: Option<i64>,
    pub name: String,
    pub global_rank: Option<i64>,
    pub research_share: Option<f64>,
    pub country: String,
}

pub fn parse_institutions(body: &str) -> Result<Vec<InstitutionRow>> {
    let mut reader = reader_for(body);
    let headers = HeaderMap::new(reader.headers().context("reading institutions header")?);
    let empire_col = headers.require("institutions", &["Empire", "empire#"])?;
    let name_col = headers.require("institutions", &["Institution", "Name"])?;
    let rank_col = headers.resolve(&["Rank"]);
    let global_col = headers.resolve(&["Global_Rank", "Global Rank", "GlobalRank"]);
    let share_col = headers.resolve(&["Research Share", "Research_Share", "Share"]);
    let country_col = headers.resolve(&["Country"]);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("parsing institutions CSV")?;
        let empire = match parse_empire(cell(&record, empire_col)) {
            Some(e) => e,
            None => continue,
        };
        rows.push(InstitutionRow {
            empire,
            rank: rank_col.and_then(|c| parse_int(cell(&record, c))),
            name: cell(&record, name_col).to_string(),
            global_rank: global_col.and_then(|c| parse_int(cell(&record, c))),
            research_share: share_col.and_then(|c| parse_float(cell(&record, c))),
            country: opt_cell(&record, country_col),
        });
    }
    Ok(rows)
}

/// Totals stay raw strings; the dashboard renders them verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketCapTotalRow {
    pub empire: i64,
    pub total: String,
    pub share: String,
    pub date: String,
}

pub fn parse_market_cap_totals(body: &str) -> Result<Vec<MarketCapTotalRow>> {
    let mut reader = reader_for(body);
    let headers = HeaderMap::new(reader.headers().context("reading totals header")?);
    let empire_col = headers.require("market-cap totals", &["Empire", "empire#"])?;
    let total_col = headers.require("market-cap totals", &["Total Market Cap", "Total"])?;
    let share_col = headers.resolve(&["% of Global Market Cap", "Share", "%"]);
    let date_col = headers.resolve(&["Date"]);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("parsing totals CSV")?;
        let empire = match parse_empire(cell(&record, empire_col)) {
            Some(e) => e,
            None => continue,
        };
        rows.push(MarketCapTotalRow {
            empire,
            total: cell(&record, total_col).to_string(),
            share: opt_cell(&record, share_col),
            date: opt_cell(&record, date_col),
        });
    }
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RdExpenditureRow {
    pub empire: i64,
    pub share: Option<f64>,
    pub percent: Option<f64>,
}

pub fn parse_rd_expenditure(body: &str) -> Result<Vec<RdExpenditureRow>> {
    let mut reader = reader_for(body);
    let headers = HeaderMap::new(reader.headers().context("reading R&D header")?);
    let empire_col = headers.require("R&D expenditure", &["empire#", "Empire"])?;
    let share_col = headers.require("R&D expenditure", &["Share", "Total"])?;
    let percent_col = headers.resolve(&["Percent", "%"]);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("parsing R&D CSV")?;
        let empire = match parse_empire(cell(&record, empire_col)) {
            Some(e) => e,
            None => continue,
        };
        rows.push(RdExpenditureRow {
            empire,
            share: parse_float(cell(&record, share_col)),
            percent: percent_col.and_then(|c| parse_float(cell(&record, c))),
        });
    }
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GdpRow {
    pub empire: i64,
    pub total: Option<f64>,
    pub percent: Option<f64>,
}

pub fn parse_gdp(body: &str) -> Result<Vec<GdpRow>> {
    let mut reader = reader_for(body);
    let headers = HeaderMap::new(reader.headers().context("reading GDP header")?);
    let empire_col = headers.require("GDP", &["empire#", "Empire"])?;
    let total_col = headers.require("GDP", &["Total"])?;
    let percent_col = headers.resolve(&["Percent", "%"]);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("parsing GDP CSV")?;
        let empire = match parse_empire(cell(&record, empire_col)) {
            Some(e) => e,
            None => continue,
        };
        rows.push(GdpRow {
            empire,
            total: parse_float(cell(&record, total_col)),
            percent: percent_col.and_then(|c| parse_float(cell(&record, c))),
        });
    }
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityRow {
    pub empire: i64,
    pub rank: Option<i64>,
    pub city: String,
    pub country: String,
    pub population: Option<i64>,
    pub date: String,
}

pub fn parse_cities(body: &str) -> Result<Vec<CityRow>> {
    let mut reader = reader_for(body);
    let headers = HeaderMap::new(reader.headers().context("reading cities header")?);
    let empire_col = headers.require("cities", &["Empire", "empire#"])?;
    let city_col = headers.require("cities", &["City"])?;
    let rank_col = headers.resolve(&["Rank"]);
    let country_col = headers.resolve(&["Country"]);
    let population_col = headers.resolve(&["Population"]);
    let date_col = headers.resolve(&["Date"]);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("parsing cities CSV")?;
        let empire = match parse_empire(cell(&record, empire_col)) {
            Some(e) => e,
            None => continue,
        };
        rows.push(CityRow {
            empire,
            rank: rank_col.and_then(|c| parse_int(cell(&record, c))),
            city: cell(&record, city_col).to_string(),
            country: opt_cell(&record, country_col),
            population: population_col.and_then(|c| parse_int(cell(&record, c))),
            date: opt_cell(&record, date_col),
        });
    }
    Ok(rows)
}

fn reader_for(body: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes())
}
