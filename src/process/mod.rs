// src/process/mod.rs
use anyhow::{bail, Result};
use scraper::{Html, Selector};

pub mod empire;
pub mod numeric;

/// A scraped table: one header row plus data rows, all as trimmed strings.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column names from the table's first row.
    pub headers: Vec<String>,
    /// Data rows, each padded or truncated to the header width.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Index of the first column whose header satisfies `pred`.
    pub fn column_index(&self, pred: impl Fn(&str) -> bool) -> Option<usize> {
        self.headers.iter().position(|h| pred(h))
    }
}

/// Extract the first `<table>` on the page into a [`RawTable`].
///
/// Header cells are taken from `<th>` and `<td>` of the first row; rows with
/// no non-empty cell are discarded. A page without a table, or a table
/// without data rows, is a structural failure.
pub fn extract_first_table(html: &str) -> Result<RawTable> {
    let table_sel = Selector::parse("table").expect("selector should parse");
    let row_sel = Selector::parse("tr").expect("selector should parse");
    let cell_sel = Selector::parse("th, td").expect("selector should parse");

    let doc = Html::parse_document(html);
    let table = match doc.select(&table_sel).next() {
        Some(t) => t,
        None => bail!("no table found on page"),
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    for tr in table.select(&row_sel) {
        let cells: Vec<String> = tr
            .select(&cell_sel)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();
        if cells.iter().any(|c| !c.is_empty()) {
            rows.push(cells);
        }
    }

    if rows.len() < 2 {
        bail!("no data rows extracted from table");
    }

    let headers = rows.remove(0);
    let width = headers.len();
    for row in &mut rows {
        row.resize(width, String::new());
    }

    Ok(RawTable { headers, rows })
}
