use super::classify::PriceCell;
use super::{CoinIssue, CoinPrice};

/// Pair a price row with the current grade header by column index.
///
/// An unparsed cell, an unparsed grade slot, or a cell past the end of the
/// grade set consumes its index without emitting a pair — positions never
/// shift.
pub fn assemble_issue(
    year: &str,
    cells: &[PriceCell],
    grades: &[Option<u32>],
    variety: Option<&str>,
) -> CoinIssue {
    let mut prices = Vec::new();

    for (idx, cell) in cells.iter().enumerate() {
        let PriceCell::Cents(price) = *cell else {
            continue;
        };
        if let Some(grade) = grades.get(idx).copied().flatten() {
            prices.push(CoinPrice { grade, price });
        }
    }

    CoinIssue {
        name: year.to_string(),
        variety: variety.map(str::to_string),
        prices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsed_cell_consumes_its_index() {
        let issue = assemble_issue(
            "1883",
            &[
                PriceCell::Cents(120_000),
                PriceCell::Unparsed,
                PriceCell::Cents(450_000),
            ],
            &[Some(60), Some(63), Some(65)],
            None,
        );
        assert_eq!(
            issue.prices,
            vec![
                CoinPrice { grade: 60, price: 120_000 },
                CoinPrice { grade: 65, price: 450_000 },
            ]
        );
    }

    #[test]
    fn unparsed_grade_slot_emits_nothing() {
        let issue = assemble_issue(
            "1900",
            &[PriceCell::Cents(100), PriceCell::Cents(200)],
            &[None, Some(63)],
            None,
        );
        assert_eq!(issue.prices, vec![CoinPrice { grade: 63, price: 200 }]);
    }

    #[test]
    fn cells_past_the_grade_set_are_dropped() {
        let issue = assemble_issue(
            "1900",
            &[PriceCell::Cents(100), PriceCell::Cents(200)],
            &[Some(60)],
            None,
        );
        assert_eq!(issue.prices, vec![CoinPrice { grade: 60, price: 100 }]);
    }

    #[test]
    fn carries_year_and_variety() {
        let issue = assemble_issue("1921", &[], &[], Some("Proof"));
        assert_eq!(issue.name, "1921");
        assert_eq!(issue.variety.as_deref(), Some("Proof"));
        assert!(issue.prices.is_empty());
    }
}
