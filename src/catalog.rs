use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use anyhow::Result;

use crate::dom::{CatalogPageMap, DocumentReader};

static NON_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9a-zA-Z ]+").unwrap());

/// One discoverable series: cleaned display name plus its price-page URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub series: String,
    pub url: String,
}

/// Walk the catalog page's grid of link cells and collect every series.
///
/// Rows from `first_row`, columns from `first_col` within each row; a row
/// whose first column holds no entries ends the walk. Entry order is
/// discovery order and downstream slice boundaries index into it, so it must
/// stay stable for a given page.
pub async fn extract_catalog<R: DocumentReader>(
    reader: &R,
    map: &CatalogPageMap,
) -> Vec<CatalogEntry> {
    let mut entries = Vec::new();
    let mut row = map.first_row;

    loop {
        let mut col = map.first_col;
        let mut first_col_count = 0usize;

        loop {
            let count = read_cell(reader, map, row, col, &mut entries).await;
            if count > 0 {
                debug!(row, col, count, "read catalog cell");
            }
            if col == map.first_col {
                first_col_count = count;
            }
            if count == 0 {
                break;
            }
            col += 1;
        }

        if first_col_count == 0 {
            break;
        }
        row += 1;
    }

    entries
}

/// Read one grid cell's links into `out`, striding the anchor index, until
/// a link is absent. A read fault ends the cell with whatever it gathered.
async fn read_cell<R: DocumentReader>(
    reader: &R,
    map: &CatalogPageMap,
    row: usize,
    col: usize,
    out: &mut Vec<CatalogEntry>,
) -> usize {
    let mut count = 0;
    let mut idx = map.first_link;

    loop {
        match read_link(reader, map, row, col, idx).await {
            Ok(Some(entry)) => {
                out.push(entry);
                count += 1;
                idx += map.link_stride;
            }
            Ok(None) => break,
            Err(e) => {
                warn!(row, col, error = %e, "error reading catalog cell");
                break;
            }
        }
    }

    count
}

async fn read_link<R: DocumentReader>(
    reader: &R,
    map: &CatalogPageMap,
    row: usize,
    col: usize,
    idx: usize,
) -> Result<Option<CatalogEntry>> {
    let locator = map.link(row, col, idx);
    let Some(href) = reader.attr(&locator, "href").await? else {
        return Ok(None);
    };
    if href.is_empty() {
        return Ok(None);
    }

    let raw = reader.text(&locator).await?.unwrap_or_default();
    Ok(Some(CatalogEntry {
        series: clean_series_name(&raw),
        url: rewrite_search_url(&href),
    }))
}

/// Derive the canonical series name from raw link text: drop everything
/// from the first "(", strip non-alphanumeric characters, trim. Idempotent.
pub fn clean_series_name(raw: &str) -> String {
    let base = raw.split('(').next().unwrap_or("");
    NON_NAME_RE.replace_all(base, "").trim().to_string()
}

/// The source links to the narrow search layout; "search6" is the wide one.
pub fn rewrite_search_url(href: &str) -> String {
    href.replacen("search7", "search6", 1)
}
