// src/process/empire.rs
use super::{numeric, RawTable};
use tracing::warn;

/// Commonwealth and former British territories with significant markets.
/// Hong Kong is deliberately absent: it is counted under empire 3.
pub const EMPIRE_1_COUNTRIES: &[&str] = &[
    "United Kingdom",
    "UK",
    "Great Britain",
    "Canada",
    "Australia",
    "Singapore",
    "New Zealand",
    "South Africa",
    "Malaysia",
    "Nigeria",
    "Kenya",
    "Ghana",
    "Jamaica",
    "Uganda",
    "Tanzania",
    "Zambia",
    "Malawi",
    "Cyprus",
    "Malta",
    "Mauritius",
    "Botswana",
    "Namibia",
    "Zimbabwe",
    "Barbados",
    "Trinidad and Tobago",
    "Fiji",
    "Papua New Guinea",
];

pub const EMPIRE_2_COUNTRIES: &[&str] = &["United States", "United States of America", "USA"];

pub const EMPIRE_3_COUNTRIES: &[&str] = &["China", "Hong Kong", "Taiwan"];

const EMPIRES: &[(i64, &str, &[&str])] = &[
    (1, "Commonwealth", EMPIRE_1_COUNTRIES),
    (2, "USA", EMPIRE_2_COUNTRIES),
    (3, "China+HK+TW", EMPIRE_3_COUNTRIES),
];

/// One row of `empire_totals.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmpireTotal {
    pub empire: i64,
    pub label: &'static str,
    pub total: f64,
}

impl EmpireTotal {
    pub fn formatted_total(&self) -> String {
        numeric::format_market_cap(self.total)
    }
}

/// Which empire a scraped country belongs to, if any.
pub fn classify_country(country: &str) -> Option<i64> {
    let normalized = country.trim().to_lowercase();
    for &(empire, _, members) in EMPIRES {
        if members.iter().any(|m| m.to_lowercase() == normalized) {
            return Some(empire);
        }
    }
    None
}

/// Sum the market-cap column per empire across the scraped countries table.
///
/// Returns `None` (with a warning) when the country or market-cap column
/// cannot be located; the caller then skips the totals artifact.
pub fn empire_totals(table: &RawTable) -> Option<Vec<EmpireTotal>> {
    let country_col = match table.column_index(|h| h.to_lowercase().contains("country")) {
        Some(c) => c,
        None => {
            warn!(headers = ?table.headers, "no country column; skipping empire totals");
            return None;
        }
    };
    let cap_col = match numeric::find_market_cap_column(&table.headers) {
        Some(c) => c,
        None => {
            warn!(headers = ?table.headers, "no market-cap column; skipping empire totals");
            return None;
        }
    };

    let mut sums = [0.0f64; 3];
    for row in &table.rows {
        let country = match row.get(country_col) {
            Some(c) => c,
            None => continue,
        };
        if let Some(empire) = classify_country(country) {
            let cap = row.get(cap_col).map(String::as_str).unwrap_or("");
            sums[empire as usize - 1] += numeric::parse_market_cap(cap);
        }
    }

    Some(
        EMPIRES
            .iter()
            .map(|&(empire, label, _)| EmpireTotal {
                empire,
                label,
                total: sums[empire as usize - 1],
            })
            .collect(),
    )
}

/// Lay the totals out as a writable table, with the UTC run date attached.
pub fn totals_table(totals: &[EmpireTotal], date: &str) -> RawTable {
    RawTable {
        headers: vec![
            "Empire".to_string(),
            "Total Market Cap".to_string(),
            "Date".to_string(),
        ],
        rows: totals
            .iter()
            .map(|t| {
                vec![
                    t.empire.to_string(),
                    t.formatted_total(),
                    date.to_string(),
                ]
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_case_insensitively() {
        assert_eq!(classify_country("united kingdom"), Some(1));
        assert_eq!(classify_country("  USA "), Some(2));
        assert_eq!(classify_country("Hong Kong"), Some(3));
        assert_eq!(classify_country("France"), None);
    }

    #[test]
    fn sums_market_caps_per_empire() {
        let table = RawTable {
            headers: vec![
                "Rank".into(),
                "Country or region".into(),
                "Total Market Cap".into(),
            ],
            rows: vec![
                vec!["1".into(), "United States".into(), "$60 T".into()],
                vec!["2".into(), "China".into(), "$20 T".into()],
                vec!["3".into(), "Hong Kong".into(), "$4 T".into()],
                vec!["4".into(), "United Kingdom".into(), "$3 T".into()],
                vec!["5".into(), "France".into(), "$3 T".into()],
            ],
        };
        let totals = empire_totals(&table).unwrap();
        assert_eq!(totals[0].total, 3e12);
        assert_eq!(totals[1].total, 60e12);
        assert_eq!(totals[2].total, 24e12);
        assert_eq!(totals[1].formatted_total(), "$60.00 T");
    }

    #[test]
    fn totals_skip_without_country_column() {
        let table = RawTable {
            headers: vec!["Rank".into(), "Total Market Cap".into()],
            rows: vec![vec!["1".into(), "$1 T".into()]],
        };
        assert!(empire_totals(&table).is_none());
    }

    #[test]
    fn totals_table_shape() {
        let totals = vec![EmpireTotal {
            empire: 2,
            label: "USA",
            total: 1.5e12,
        }];
        let table = totals_table(&totals, "2025-08-05");
        assert_eq!(table.headers, vec!["Empire", "Total Market Cap", "Date"]);
        assert_eq!(table.rows[0], vec!["2", "$1.50 T", "2025-08-05"]);
    }
}
