//! Block recognizer: a state machine over a six-line lookahead window.

use super::{parse_amount, parse_percent, HoldingRecord};
use once_cell::sync::Lazy;
use regex::Regex;

/// Lines per holdings block
pub const BLOCK_LEN: usize = 6;

/// Values the page shows when a figure is unavailable
const PLACEHOLDERS: &[&str] = &["n/a", "na", "--", "-", "\u{2014}", "\u{2013}"];

static RE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:\d{1,3}(?:,\d{3})+|\d+)?(?:\.\d+)?$").unwrap());
static RE_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Alphabetic}").unwrap());
static RE_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").unwrap());

/// Position inside a holdings block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    SeekingFundName,
    ExpectAssetClass,
    ExpectPercent,
    ExpectValue,
    ExpectShares,
    ExpectPrice,
}

impl BlockState {
    /// Whether this state consumes a numeric field
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::SeekingFundName | Self::ExpectAssetClass)
    }

    /// Feed one line into the record under construction.
    fn advance(self, line: &str, record: &mut HoldingRecord) -> Step {
        let line = line.trim();
        match self {
            Self::SeekingFundName if is_label(line) => {
                record.fund_name = line.to_string();
                Step::Next(Self::ExpectAssetClass)
            }
            Self::ExpectAssetClass if is_label(line) => {
                record.asset_class = line.to_string();
                Step::Next(Self::ExpectPercent)
            }
            Self::ExpectPercent if is_placeholder(line) || is_percent(line) => {
                record.allocation_percent = parse_percent(line);
                Step::Next(Self::ExpectValue)
            }
            Self::ExpectValue if is_placeholder(line) || is_currency_cell(line) => {
                record.current_value = parse_amount(line);
                Step::Next(Self::ExpectShares)
            }
            Self::ExpectShares if is_placeholder(line) || is_number(line) => {
                record.shares = parse_amount(line);
                Step::Next(Self::ExpectPrice)
            }
            Self::ExpectPrice if is_placeholder(line) || is_currency_cell(line) => {
                record.price_per_share = parse_amount(line);
                Step::Done
            }
            _ => Step::Reject,
        }
    }
}

/// Outcome of feeding one line to a [`BlockState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Next(BlockState),
    Done,
    Reject,
}

/// Why a window did not produce a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rejection {
    pub state: BlockState,
    /// Offending line, `None` when the text ended mid-block
    pub line: Option<String>,
}

/// Try to read one block from the start of `lines`.
pub(crate) fn match_block(lines: &[String]) -> Result<HoldingRecord, Rejection> {
    let mut state = BlockState::SeekingFundName;
    let mut record = HoldingRecord::default();

    for line in lines.iter().take(BLOCK_LEN) {
        match state.advance(line, &mut record) {
            Step::Next(next) => state = next,
            Step::Done => return Ok(record),
            Step::Reject => {
                return Err(Rejection {
                    state,
                    line: Some(line.clone()),
                })
            }
        }
    }

    Err(Rejection { state, line: None })
}

/// An unavailable figure, with or without a leading currency symbol
pub(crate) fn is_placeholder(line: &str) -> bool {
    let bare = line.trim().trim_start_matches('$').trim();
    PLACEHOLDERS
        .iter()
        .any(|placeholder| bare.eq_ignore_ascii_case(placeholder))
}

fn is_number(line: &str) -> bool {
    RE_DIGIT.is_match(line) && RE_NUMBER.is_match(line)
}

fn is_percent(line: &str) -> bool {
    line.ends_with('%') && RE_DIGIT.is_match(line)
}

/// A currency figure such as `$1,234.56`
pub(crate) fn is_currency(line: &str) -> bool {
    line.contains('$') && RE_DIGIT.is_match(line)
}

/// A value or price cell: anything carrying the currency symbol.
/// Unparseable figures are kept as missing fields.
fn is_currency_cell(line: &str) -> bool {
    line.contains('$')
}

/// A fund name or asset class: wordy text that is not a figure
fn is_label(line: &str) -> bool {
    !line.is_empty()
        && RE_LETTER.is_match(line)
        && !is_placeholder(line)
        && !line.contains('$')
        && !line.ends_with('%')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_line_classes() {
        assert!(is_label("US Total Stock Market"));
        assert!(is_label("Target Date 2050"));
        assert!(!is_label("45.2%"));
        assert!(!is_label("$12,345.67"));
        assert!(!is_label("N/A"));
        assert!(!is_label("100.5"));

        assert!(is_number("100.5"));
        assert!(is_number("1,496.700"));
        assert!(is_number(".5"));
        assert!(!is_number("1,49,6"));
        assert!(!is_number("."));
        assert!(!is_number("12 shares"));

        assert!(is_currency("$122.84"));
        assert!(is_currency("-$5.00"));
        assert!(!is_currency("$"));

        assert!(is_placeholder("N/A"));
        assert!(is_placeholder("--"));
        assert!(is_placeholder("\u{2014}"));
        assert!(is_placeholder("$N/A"));
        assert!(is_placeholder("$ --"));
        assert!(!is_placeholder("$"));

        assert!(is_currency_cell("$N/A"));
        assert!(is_currency_cell("$"));
        assert!(!is_currency_cell("100.5"));
    }

    #[test]
    fn test_state_progression() {
        let block = lines("Bond Index Fund\nFixed Income\n54.8%\n$14,967.00\n1,496.7\n$10.00");
        let record = match_block(&block).unwrap();
        assert_eq!(record.fund_name, "Bond Index Fund");
        assert_eq!(record.asset_class, "Fixed Income");
        assert_eq!(record.allocation_percent, Some(54.8));
        assert_eq!(record.current_value, Some(14967.0));
        assert_eq!(record.shares, Some(1496.7));
        assert_eq!(record.price_per_share, Some(10.0));
    }

    #[test]
    fn test_rejection_reports_state() {
        let block = lines("Bond Index Fund\nFixed Income\n54.8%\n14967\n1,496.7\n$10.00");
        assert_eq!(
            match_block(&block),
            Err(Rejection {
                state: BlockState::ExpectValue,
                line: Some("14967".to_string()),
            })
        );
    }

    #[test]
    fn test_truncated_window() {
        let block = lines("Bond Index Fund\nFixed Income\n54.8%");
        assert_eq!(
            match_block(&block),
            Err(Rejection {
                state: BlockState::ExpectValue,
                line: None,
            })
        );
    }

    #[test]
    fn test_currency_cell_without_figure_keeps_record() {
        let block = lines("Stable Value Fund\nStable Value\n10%\n$N/A\n250\n$ -");
        let record = match_block(&block).unwrap();
        assert_eq!(record.current_value, None);
        assert_eq!(record.shares, Some(250.0));
        assert_eq!(record.price_per_share, None);

        let block = lines("Stable Value Fund\nStable Value\n10%\n$--\n250\n$1.00");
        assert_eq!(match_block(&block).unwrap().price_per_share, Some(1.0));
    }

    #[test]
    fn test_out_of_range_percent_is_missing() {
        let block = lines("Odd Fund\nEquity\n250%\n$1.00\n1\n$1.00");
        let record = match_block(&block).unwrap();
        assert_eq!(record.allocation_percent, None);
        assert_eq!(record.current_value, Some(1.0));
    }
}
