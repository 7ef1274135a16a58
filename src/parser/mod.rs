pub mod assemble;
pub mod classify;

use tracing::{info, warn};

use crate::dom::{DocumentReader, SeriesPageMap};
use classify::RowOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinPrice {
    pub grade: u32,
    /// Integer minor units (cents).
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinIssue {
    /// Year or composite label; "" when the source row carried none.
    pub name: String,
    pub variety: Option<String>,
    pub prices: Vec<CoinPrice>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinSeries {
    pub name: String,
    pub issues: Vec<CoinIssue>,
}

/// Consecutive unknown/faulted rows tolerated before the walk is treated as
/// off the rails and stopped with whatever it has gathered.
const MAX_DEAD_ROWS: usize = 25;

/// Walk a series price table row by row until a row is absent, carrying the
/// most recent grade header and variety label into each price row.
///
/// Best-effort by design: row faults are logged and skipped, and any
/// already-gathered issues survive an aborted walk.
pub async fn extract_series<R: DocumentReader>(
    reader: &R,
    map: &SeriesPageMap,
    name: &str,
) -> CoinSeries {
    let mut series = CoinSeries {
        name: name.to_string(),
        issues: Vec::new(),
    };
    let mut grades: Vec<Option<u32>> = Vec::new();
    let mut variety: Option<String> = None;
    let mut dead_rows = 0usize;
    let mut row = map.first_row;

    loop {
        match classify::classify(reader, map, row).await {
            Ok(RowOutcome::Absent) => break,
            Ok(RowOutcome::Header(g)) => {
                grades = g;
                dead_rows = 0;
            }
            Ok(RowOutcome::Variety(label)) => {
                variety = Some(label);
                dead_rows = 0;
            }
            Ok(RowOutcome::Prices { year, cells }) => {
                series.issues.push(assemble::assemble_issue(
                    &year,
                    &cells,
                    &grades,
                    variety.as_deref(),
                ));
                dead_rows = 0;
            }
            Ok(RowOutcome::Unknown) => dead_rows += 1,
            Err(e) => {
                warn!(series = name, row, error = %e, "failed to read row, skipping");
                dead_rows += 1;
            }
        }

        if dead_rows >= MAX_DEAD_ROWS {
            warn!(
                series = name,
                row, "too many consecutive unreadable rows, stopping walk"
            );
            break;
        }
        row += 1;
    }

    info!(series = name, issues = series.issues.len(), "finished reading prices");
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fake::FakeDocument;

    fn price_row(
        doc: FakeDocument,
        m: &SeriesPageMap,
        row: usize,
        year: &str,
        cells: &[&str],
    ) -> FakeDocument {
        let mut doc = doc
            .with_markup(m.row(row), "<td>...</td>")
            .with_markup(m.price_marker(row), "<font>x</font>")
            .with_text(m.year(row), year);
        for (i, cell) in cells.iter().enumerate() {
            doc = doc.with_text(m.cell(row, m.first_value_col + i), *cell);
        }
        doc
    }

    fn header_row(doc: FakeDocument, m: &SeriesPageMap, row: usize, grades: &[&str]) -> FakeDocument {
        let mut doc = doc
            .with_markup(m.row(row), "<td>...</td>")
            .with_markup(m.header_marker(row), "<tbody>");
        for (i, grade) in grades.iter().enumerate() {
            doc = doc.with_text(m.cell(row, m.first_value_col + i), *grade);
        }
        doc
    }

    fn variety_row(doc: FakeDocument, m: &SeriesPageMap, row: usize, label: &str) -> FakeDocument {
        doc.with_markup(m.row(row), "<td>...</td>")
            .with_markup(m.variety_marker(row), "<b>")
            .with_text(m.variety_text(row), label)
    }

    #[tokio::test]
    async fn two_row_table_yields_one_issue() {
        let m = SeriesPageMap::default();
        let mut doc = FakeDocument::new();
        doc = header_row(doc, &m, 1, &["60", "65"]);
        doc = price_row(doc, &m, 2, "1921", &["1.00", "--"]);

        let series = extract_series(&doc, &m, "Morgan Dollar").await;

        assert_eq!(series.name, "Morgan Dollar");
        assert_eq!(
            series.issues,
            vec![CoinIssue {
                name: "1921".to_string(),
                variety: None,
                prices: vec![CoinPrice { grade: 60, price: 100 }],
            }]
        );
    }

    #[tokio::test]
    async fn unparsed_cells_do_not_shift_grade_alignment() {
        let m = SeriesPageMap::default();
        let mut doc = FakeDocument::new();
        doc = header_row(doc, &m, 1, &["60", "63", "65"]);
        doc = price_row(doc, &m, 2, "1883", &["1,200.00", "--", "4,500.00"]);

        let series = extract_series(&doc, &m, "Test").await;

        assert_eq!(
            series.issues[0].prices,
            vec![
                CoinPrice { grade: 60, price: 120_000 },
                CoinPrice { grade: 65, price: 450_000 },
            ]
        );
    }

    #[tokio::test]
    async fn issue_count_matches_price_rows() {
        let m = SeriesPageMap::default();
        let mut doc = FakeDocument::new();
        doc = header_row(doc, &m, 1, &["60"]);
        doc = price_row(doc, &m, 2, "1901", &["1.00"]);
        doc = price_row(doc, &m, 3, "1902", &["2.00"]);
        doc = price_row(doc, &m, 4, "1903", &["3.00"]);

        let series = extract_series(&doc, &m, "Test").await;

        assert_eq!(series.issues.len(), 3);
        let names: Vec<&str> = series.issues.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["1901", "1902", "1903"]);
    }

    #[tokio::test]
    async fn variety_persists_until_replaced() {
        let m = SeriesPageMap::default();
        let mut doc = FakeDocument::new();
        doc = header_row(doc, &m, 1, &["60"]);
        doc = variety_row(doc, &m, 2, "Proof");
        doc = price_row(doc, &m, 3, "1901", &["1.00"]);
        doc = price_row(doc, &m, 4, "1902", &["2.00"]);
        doc = variety_row(doc, &m, 5, "Deep Cameo");
        doc = price_row(doc, &m, 6, "1903", &["3.00"]);

        let series = extract_series(&doc, &m, "Test").await;

        let varieties: Vec<Option<&str>> =
            series.issues.iter().map(|i| i.variety.as_deref()).collect();
        assert_eq!(
            varieties,
            vec![Some("Proof"), Some("Proof"), Some("Deep Cameo")]
        );
    }

    #[tokio::test]
    async fn new_header_replaces_grades_for_later_rows() {
        let m = SeriesPageMap::default();
        let mut doc = FakeDocument::new();
        doc = header_row(doc, &m, 1, &["60"]);
        doc = price_row(doc, &m, 2, "1901", &["1.00"]);
        doc = header_row(doc, &m, 3, &["70"]);
        doc = price_row(doc, &m, 4, "1902", &["2.00"]);

        let series = extract_series(&doc, &m, "Test").await;

        assert_eq!(series.issues[0].prices[0].grade, 60);
        assert_eq!(series.issues[1].prices[0].grade, 70);
    }

    #[tokio::test]
    async fn unclassifiable_row_between_valid_rows_is_tolerated() {
        let m = SeriesPageMap::default();
        let mut doc = FakeDocument::new();
        doc = header_row(doc, &m, 1, &["60"]);
        doc = price_row(doc, &m, 2, "1901", &["1.00"]);
        // Row 3 exists but matches no cue.
        doc = doc.with_markup(m.row(3), "<td></td>");
        doc = price_row(doc, &m, 4, "1902", &["2.00"]);

        let series = extract_series(&doc, &m, "Test").await;

        assert_eq!(series.issues.len(), 2);
    }

    #[tokio::test]
    async fn faulted_row_is_skipped_not_fatal() {
        let m = SeriesPageMap::default();
        let mut doc = FakeDocument::new();
        doc = header_row(doc, &m, 1, &["60"]);
        doc = price_row(doc, &m, 2, "1901", &["1.00"]);
        doc = doc
            .with_markup(m.row(3), "<td>...</td>")
            .with_markup(m.header_marker(3), "<tbody>")
            .with_fault(m.cell(3, 2));
        doc = price_row(doc, &m, 4, "1902", &["2.00"]);

        let series = extract_series(&doc, &m, "Test").await;

        // The faulted header is discarded whole; row 1's grades still apply.
        assert_eq!(series.issues.len(), 2);
        assert_eq!(series.issues[1].prices[0].grade, 60);
    }

    #[tokio::test]
    async fn long_dead_row_streak_stops_the_walk() {
        let m = SeriesPageMap::default();
        let mut doc = FakeDocument::new();
        doc = header_row(doc, &m, 1, &["60"]);
        doc = price_row(doc, &m, 2, "1901", &["1.00"]);
        for row in 3..60 {
            doc = doc.with_markup(m.row(row), "<td></td>");
        }
        doc = price_row(doc, &m, 60, "1902", &["2.00"]);

        let series = extract_series(&doc, &m, "Test").await;

        // The walk gives up inside the dead streak and keeps what it had.
        assert_eq!(series.issues.len(), 1);
    }
}
