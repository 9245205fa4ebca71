// src/process/numeric.rs
use super::RawTable;
use tracing::warn;

/// Unit suffixes recognized at the end of a market-cap cell, checked in
/// order; the first match wins.
const UNIT_SCALES: &[(char, f64)] = &[('T', 1e12), ('B', 1e9), ('M', 1e6)];

/// Header of the derived share column.
pub const PERCENT_HEADER: &str = "% of Global Market Cap";

/// Strip `,` from every cell that carries at least one digit.
pub fn strip_thousands_separators(table: &mut RawTable) {
    for row in &mut table.rows {
        for cell in row.iter_mut() {
            if cell.contains(',') && cell.chars().any(|c| c.is_ascii_digit()) {
                *cell = cell.replace(',', "");
            }
        }
    }
}

/// Find the market-cap column: case-insensitive substring match on both
/// "market" and "cap".
pub fn find_market_cap_column(headers: &[String]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.to_lowercase();
        h.contains("market") && h.contains("cap")
    })
}

/// Parse a market-cap cell into dollars.
///
/// Empty, `-`, and unparseable cells coerce to zero. `$`, whitespace, and
/// thousands separators are stripped; a trailing T/B/M unit scales the value.
pub fn parse_market_cap(value: &str) -> f64 {
    let cleaned = value.trim();
    if cleaned.is_empty() || cleaned == "-" {
        return 0.0;
    }

    let cleaned: String = cleaned
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    let upper = cleaned.to_uppercase();

    let mut multiplier = 1.0;
    let mut digits = upper.as_str();
    for &(unit, scale) in UNIT_SCALES {
        if let Some(stripped) = upper.strip_suffix(unit) {
            multiplier = scale;
            digits = stripped;
            break;
        }
    }

    digits
        .parse::<f64>()
        .map(|v| v * multiplier)
        .unwrap_or(0.0)
}

/// Format dollars back into the site's `$X.XX T/B/M` notation.
pub fn format_market_cap(value: f64) -> String {
    for &(unit, scale) in UNIT_SCALES {
        if value >= scale {
            return format!("${:.2} {}", value / scale, unit);
        }
    }
    format!("${:.2}", value)
}

/// Append a [`PERCENT_HEADER`] column derived from the detected market-cap
/// column, each cell rounded to two decimals. The parsed numeric values stay
/// local to this function and never reach the written output.
///
/// Returns the global total in dollars, or `None` (with a warning) when no
/// market-cap column can be detected.
pub fn derive_percent_of_global(table: &mut RawTable) -> Option<f64> {
    let col = match find_market_cap_column(&table.headers) {
        Some(c) => c,
        None => {
            warn!(headers = ?table.headers, "no market-cap column detected; skipping share derivation");
            return None;
        }
    };

    let values: Vec<f64> = table
        .rows
        .iter()
        .map(|row| row.get(col).map(|v| parse_market_cap(v)).unwrap_or(0.0))
        .collect();
    let total: f64 = values.iter().sum();

    table.headers.push(PERCENT_HEADER.to_string());
    for (row, value) in table.rows.iter_mut().zip(&values) {
        let pct = if total > 0.0 {
            value / total * 100.0
        } else {
            0.0
        };
        row.push(format!("{:.2}", pct));
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> RawTable {
        RawTable {
            headers: vec!["Rank".into(), "Country".into(), "Total Market Cap".into()],
            rows: vec![
                vec!["1".into(), "United States".into(), "$68.89 T".into()],
                vec!["2".into(), "China".into(), "$24.15 T".into()],
                vec!["3".into(), "Atlantis".into(), "-".into()],
            ],
        }
    }

    #[test]
    fn parses_unit_suffixes() {
        assert_eq!(parse_market_cap("$68.89 T"), 68.89e12);
        assert_eq!(parse_market_cap("$1.5 B"), 1.5e9);
        assert_eq!(parse_market_cap("1,234 M"), 1234e6);
        assert_eq!(parse_market_cap("2.5m"), 2.5e6);
        assert_eq!(parse_market_cap("-"), 0.0);
        assert_eq!(parse_market_cap(""), 0.0);
        assert_eq!(parse_market_cap("garbage"), 0.0);
        assert_eq!(parse_market_cap("512"), 512.0);
    }

    #[test]
    fn formats_round_trip() {
        assert_eq!(format_market_cap(68.89e12), "$68.89 T");
        assert_eq!(format_market_cap(1.5e9), "$1.50 B");
        assert_eq!(format_market_cap(2_000_000.0), "$2.00 M");
        assert_eq!(format_market_cap(12.0), "$12.00");
    }

    #[test]
    fn strips_separators_only_from_digit_cells() {
        let mut table = RawTable {
            headers: vec!["Name".into(), "Population".into()],
            rows: vec![vec!["Smith, Jones & Co".into(), "1,234,567".into()]],
        };
        strip_thousands_separators(&mut table);
        assert_eq!(table.rows[0][0], "Smith, Jones & Co");
        assert_eq!(table.rows[0][1], "1234567");
    }

    #[test]
    fn detects_market_cap_column() {
        let headers = vec!["Rank".to_string(), "Total MarketCap".to_string()];
        assert_eq!(find_market_cap_column(&headers), Some(1));
        let headers = vec!["Rank".to_string(), "Capital".to_string()];
        assert_eq!(find_market_cap_column(&headers), None);
    }

    #[test]
    fn derived_percent_column_sums_to_hundred() {
        let mut table = sample_table();
        let total = derive_percent_of_global(&mut table).unwrap();
        assert_eq!(total, 68.89e12 + 24.15e12);

        assert_eq!(*table.headers.last().unwrap(), PERCENT_HEADER);
        let sum: f64 = table
            .rows
            .iter()
            .map(|r| r.last().unwrap().parse::<f64>().unwrap())
            .sum();
        assert!((sum - 100.0).abs() < 0.1, "sum was {}", sum);

        // The numeric intermediate is not persisted as a column.
        assert_eq!(table.headers.len(), 4);
        assert!(table.rows.iter().all(|r| r.len() == 4));
    }

    #[test]
    fn missing_cap_column_skips_derivation() {
        let mut table = RawTable {
            headers: vec!["Rank".into(), "Country".into()],
            rows: vec![vec!["1".into(), "France".into()]],
        };
        assert!(derive_percent_of_global(&mut table).is_none());
        assert_eq!(table.headers.len(), 2);
        assert_eq!(table.rows[0].len(), 2);
    }
}
