//! Grand total integrity check.
//!
//! The holdings page closes the table with a total row. Comparing it to the
//! sum of the parsed rows catches blocks that the recognizer dropped.

use super::recognizer::is_currency;
use super::{parse_amount, ExportTable};
use crate::archive::PlainText;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Allowed relative difference between reported and calculated totals (0.5%)
pub const TOTAL_TOLERANCE: f64 = 0.005;

/// Lines after the total label searched for its amount
const TOTAL_LOOKAHEAD: usize = 3;

static RE_TOTAL_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(grand\s+)?total(?:\s+(?:balance|value))?:?(?:\s+(.*))?$").unwrap()
});

/// Outcome of comparing the page's total row to the parsed holdings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityCheck {
    pub reported_total: f64,
    pub calculated_total: f64,
    pub difference: f64,
    pub matches: bool,
}

/// A total row label, possibly followed by its amounts on the same line.
///
/// Returns whether it is a grand total and the trailing amounts. Lines with
/// anything but currency figures after the label (fund names such as
/// "Total Bond Market Index") are not total rows.
fn total_label(line: &str) -> Option<(bool, &str)> {
    let caps = RE_TOTAL_LABEL.captures(line.trim())?;
    let rest = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    if !rest.split_whitespace().all(is_currency) {
        return None;
    }
    Some((caps.get(1).is_some(), rest))
}

/// Last currency figure on a line; total rows may carry a day change before
/// the balance.
fn last_currency(line: &str) -> Option<f64> {
    line.split_whitespace()
        .filter(|token| is_currency(token))
        .last()
        .and_then(parse_amount)
}

/// Find the page's total row amount.
///
/// A `Grand total` row wins over a bare `Total` row; otherwise the first
/// total row with an amount is used.
pub fn find_reported_total(text: &PlainText) -> Option<f64> {
    let lines = text.lines();
    let mut first_total = None;

    for (i, line) in lines.iter().enumerate() {
        let Some((grand, rest)) = total_label(line) else {
            continue;
        };

        let amount = std::iter::once(rest)
            .chain(lines[i + 1..].iter().take(TOTAL_LOOKAHEAD).map(String::as_str))
            .find_map(last_currency);

        match amount {
            Some(amount) if grand => return Some(amount),
            Some(amount) => {
                first_total.get_or_insert(amount);
            }
            None => {}
        }
    }

    first_total
}

/// Compare the page total with the sum of parsed values.
///
/// Returns `None` when the page shows no total row.
pub fn check_integrity(text: &PlainText, table: &ExportTable) -> Option<IntegrityCheck> {
    let reported_total = find_reported_total(text)?;
    let calculated_total = table.total_value();
    let difference = calculated_total - reported_total;
    let matches = difference.abs() <= (reported_total * TOTAL_TOLERANCE).abs();

    if matches {
        log::info!(
            "Integrity check passed: reported ${:.2}, calculated ${:.2}",
            reported_total,
            calculated_total
        );
    } else {
        log::warn!(
            "Integrity check failed: reported ${:.2}, calculated ${:.2}",
            reported_total,
            calculated_total
        );
    }

    Some(IntegrityCheck {
        reported_total,
        calculated_total,
        difference,
        matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holdings::parse_holdings;

    const PAGE: &str = "Holdings\n\
        US Total Stock Market\nEquity\n45.2%\n$12,345.67\n100.5\n$122.84\n\
        Bond Index Fund\nFixed Income\n54.8%\n$14,967.00\n1,496.7\n$10.00\n";

    #[test]
    fn test_total_on_following_line() {
        let text = PlainText::from(format!("{}Grand total\n100%\n$27,312.67", PAGE).as_str());
        assert_eq!(find_reported_total(&text), Some(27312.67));

        let check = check_integrity(&text, &parse_holdings(&text)).unwrap();
        assert!(check.matches);
        assert!(check.difference.abs() < 1e-6);
    }

    #[test]
    fn test_total_on_same_line_takes_balance() {
        let text = PlainText::from("Grand total +$120.50 $27,312.67");
        assert_eq!(find_reported_total(&text), Some(27312.67));
    }

    #[test]
    fn test_mismatch_beyond_tolerance() {
        let text = PlainText::from(format!("{}Total\n$30,000.00", PAGE).as_str());
        let check = check_integrity(&text, &parse_holdings(&text)).unwrap();
        assert!(!check.matches);
        assert_eq!(check.reported_total, 30000.0);
    }

    #[test]
    fn test_no_total_row() {
        let text = PlainText::from(PAGE);
        assert_eq!(find_reported_total(&text), None);
        assert!(check_integrity(&text, &parse_holdings(&text)).is_none());
    }

    #[test]
    fn test_fund_named_total_is_not_the_page_total() {
        let text = PlainText::from(
            "Total Bond Market Index\nFixed Income\n30%\n$3,000.00\n300\n$10.00\n\
             US Total Stock Market\nEquity\n70%\n$7,000.00\n70\n$100.00\n\
             Grand total\n$10,000.00",
        );
        let table = parse_holdings(&text);
        assert_eq!(table.len(), 2);
        assert_eq!(find_reported_total(&text), Some(10000.0));
        assert!(check_integrity(&text, &table).unwrap().matches);
    }

    #[test]
    fn test_grand_total_preferred_over_total() {
        let text = PlainText::from("Total\n$500.00\nGrand total: $27,312.67");
        assert_eq!(find_reported_total(&text), Some(27312.67));

        let text = PlainText::from("Total balance\n$500.00");
        assert_eq!(find_reported_total(&text), Some(500.0));
    }

    #[test]
    fn test_total_word_inside_label_is_ignored() {
        let text = PlainText::from("Totally Different Fund\n$5.00");
        assert_eq!(find_reported_total(&text), None);
    }
}
