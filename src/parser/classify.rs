use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use crate::dom::{DocumentReader, SeriesPageMap};

static NON_MONEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9.]+").unwrap());
static NON_DIGIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9]+").unwrap());

/// One price cell. `Unparsed` holds the column position of a cell whose text
/// carried no usable number (e.g. "--") so later cells stay aligned with the
/// grade header; it never reaches the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceCell {
    Cents(i64),
    Unparsed,
}

/// Shape of one table row, decided from structural cues alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// No row at this index; terminal for the walk.
    Absent,
    /// Grade header. A column whose text is not numeric still occupies a
    /// slot (`None`) to keep price columns index-aligned.
    Header(Vec<Option<u32>>),
    /// Single-cell variety label; applies to following price rows.
    Variety(String),
    /// Year/label plus the money-parsed numeric run.
    Prices { year: String, cells: Vec<PriceCell> },
    /// Matched no cue; logged and skipped, the walk continues.
    Unknown,
}

/// Classify the row at `row`. Cues are checked in order: a nested table in
/// the first cell means a grade header, content in the second cell means a
/// price row, a lone bold cell means a variety label.
///
/// A read fault mid-row surfaces as `Err`: the row is discarded whole and
/// the caller decides whether the walk goes on.
pub async fn classify<R: DocumentReader>(
    reader: &R,
    map: &SeriesPageMap,
    row: usize,
) -> Result<RowOutcome> {
    if reader.markup(&map.row(row)).await?.is_none() {
        return Ok(RowOutcome::Absent);
    }

    if reader.markup(&map.header_marker(row)).await?.is_some() {
        let grades = read_value_row(reader, map, row, parse_grade).await?;
        return Ok(RowOutcome::Header(grades));
    }

    if reader.markup(&map.price_marker(row)).await?.is_some() {
        let year = reader.text(&map.year(row)).await?.unwrap_or_default();
        let cells = read_value_row(reader, map, row, parse_money).await?;
        return Ok(RowOutcome::Prices { year, cells });
    }

    if reader.markup(&map.variety_marker(row)).await?.is_some() {
        let label = reader
            .text(&map.variety_text(row)).await?
            .unwrap_or_default()
            .trim()
            .to_string();
        return Ok(RowOutcome::Variety(label));
    }

    debug!(row, "row matched no structural cue");
    Ok(RowOutcome::Unknown)
}

/// Read a row's value run: columns from `first_value_col` upward until one
/// yields no text. Every visited column appends an entry, parsed or not,
/// because reconciliation pairs cells with grades by index.
async fn read_value_row<R, T, F>(
    reader: &R,
    map: &SeriesPageMap,
    row: usize,
    parse: F,
) -> Result<Vec<T>>
where
    R: DocumentReader,
    F: Fn(&str) -> T,
{
    let mut values = Vec::new();
    let mut col = map.first_value_col;

    while let Some(text) = reader.text(&map.cell(row, col)).await? {
        if text.is_empty() {
            break;
        }
        values.push(parse(&text));
        col += 1;
    }

    Ok(values)
}

fn parse_grade(text: &str) -> Option<u32> {
    let digits = NON_DIGIT_RE.replace_all(text, "");
    digits.parse().ok()
}

/// "$1,234.56" -> 123456 cents; anything without a usable decimal number is
/// `Unparsed`.
fn parse_money(text: &str) -> PriceCell {
    let stripped = NON_MONEY_RE.replace_all(text, "");
    match stripped.parse::<f64>() {
        Ok(value) => PriceCell::Cents((value * 100.0).round() as i64),
        Err(_) => PriceCell::Unparsed,
    }
}
