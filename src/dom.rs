use anyhow::Result;
use async_trait::async_trait;

/// Narrow capability over a loaded document: evaluate a positional locator
/// and hand back its text, inner markup, or an attribute value.
///
/// `Ok(None)` means no node matched the locator; `Err` is a read fault and
/// is handled by the caller at row granularity.
#[async_trait]
pub trait DocumentReader {
    async fn text(&self, locator: &str) -> Result<Option<String>>;
    async fn markup(&self, locator: &str) -> Result<Option<String>>;
    async fn attr(&self, locator: &str, name: &str) -> Result<Option<String>>;
}

// Deep nth-child paths into the source site's nested table layout. A layout
// change on the site means editing these tables, not the walk logic.

const SERIES_TABLE: &str = "body > center > div > table > tbody > tr:nth-child(1) > td:nth-child(1) \
     > table > tbody > tr > td:nth-child(2) > center > table:nth-child(3) > tbody \
     > tr:nth-child(2) > td > table:nth-child(1) > tbody";

const CATALOG_GRID: &str = "body > center > table > tbody > tr > td:nth-child(2) > table > tbody > tr > td \
     > table:nth-child(2) > tbody > tr > td > table > tbody > tr > td \
     > table:nth-child(1) > tbody > tr > td:nth-child(2) > table > tbody > tr \
     > td:nth-child(1) > table > tbody";

/// Locator table for a series price page.
pub struct SeriesPageMap {
    /// Path to the price table body; rows hang off it by index.
    pub table: String,
    /// Index of the first data row.
    pub first_row: usize,
    /// Column where the numeric run of a header/price row starts.
    pub first_value_col: usize,
}

impl Default for SeriesPageMap {
    fn default() -> Self {
        Self {
            table: SERIES_TABLE.to_string(),
            first_row: 1,
            first_value_col: 2,
        }
    }
}

impl SeriesPageMap {
    pub fn row(&self, row: usize) -> String {
        format!("{} > tr:nth-child({row})", self.table)
    }

    /// A nested table in the row's first cell marks a grade-header row.
    pub fn header_marker(&self, row: usize) -> String {
        format!("{} > td:nth-child(1) > table", self.row(row))
    }

    /// Content in the second cell marks a price row.
    pub fn price_marker(&self, row: usize) -> String {
        format!("{} > td:nth-child(2)", self.row(row))
    }

    /// Year/label position inside a price row's first cell.
    pub fn year(&self, row: usize) -> String {
        format!("{} > td:nth-child(1) > font > b > a > font", self.row(row))
    }

    /// Bold single-cell content marks a variety row.
    pub fn variety_marker(&self, row: usize) -> String {
        format!("{} > td > font > b", self.row(row))
    }

    pub fn variety_text(&self, row: usize) -> String {
        format!("{} > td", self.row(row))
    }

    pub fn cell(&self, row: usize, col: usize) -> String {
        format!("{} > td:nth-child({col})", self.row(row))
    }
}

/// Locator table for the catalog page's two-dimensional grid of link cells.
pub struct CatalogPageMap {
    pub grid: String,
    /// First grid row holding series links.
    pub first_row: usize,
    pub first_col: usize,
    pub first_link: usize,
    /// Links repeat in groups on the source page; only every fourth anchor
    /// is a series entry.
    pub link_stride: usize,
}

impl Default for CatalogPageMap {
    fn default() -> Self {
        Self {
            grid: CATALOG_GRID.to_string(),
            first_row: 3,
            first_col: 1,
            first_link: 1,
            link_stride: 4,
        }
    }
}

impl CatalogPageMap {
    pub fn link(&self, row: usize, col: usize, idx: usize) -> String {
        format!(
            "{} > tr:nth-child({row}) > td:nth-child({col}) > table > tbody > tr > td \
             > table > tbody > tr > td > font > font > a:nth-child({idx})",
            self.grid
        )
    }
}
