//! Holdings Table Parser
//!
//! Recognizes the holdings table of an Empower account page in its flattened
//! text and turns each fund block into a [`HoldingRecord`].
//!
//! The page renders one fund as six consecutive text runs:
//!
//! ```text
//! US Total Stock Market
//! Equity
//! 45.2%
//! $12,345.67
//! 100.5
//! $122.84
//! ```

mod recognizer;
pub mod totals;

pub use recognizer::{BlockState, BLOCK_LEN};
pub use totals::{check_integrity, find_reported_total, IntegrityCheck};

use crate::archive::PlainText;
use serde::{Deserialize, Serialize};

/// One fund row from the holdings table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingRecord {
    pub fund_name: String,
    pub asset_class: String,
    /// 0.0 - 100.0
    pub allocation_percent: Option<f64>,
    pub current_value: Option<f64>,
    pub shares: Option<f64>,
    pub price_per_share: Option<f64>,
}

/// Holdings in page order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportTable {
    records: Vec<HoldingRecord>,
}

impl ExportTable {
    pub fn new(records: Vec<HoldingRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[HoldingRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HoldingRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all known current values
    pub fn total_value(&self) -> f64 {
        self.records.iter().filter_map(|r| r.current_value).sum()
    }
}

impl<'a> IntoIterator for &'a ExportTable {
    type Item = &'a HoldingRecord;
    type IntoIter = std::slice::Iter<'a, HoldingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Scan page text for holdings blocks.
///
/// Never fails: lines that do not start a complete block are skipped.
pub fn parse_holdings(text: &PlainText) -> ExportTable {
    let lines = text.lines();
    let mut records = Vec::new();
    let mut start = 0;

    while start < lines.len() {
        match recognizer::match_block(&lines[start..]) {
            Ok(record) => {
                log::debug!("Holding at line {}: {}", start + 1, record.fund_name);
                records.push(record);
                start += BLOCK_LEN;
            }
            Err(rejection) => {
                // Only windows that got past the two label lines are worth reporting
                if rejection.state.is_numeric() {
                    log::debug!(
                        "Dropped partial holding '{}' at line {}: {:?} rejected {:?}",
                        lines[start],
                        start + 1,
                        rejection.state,
                        rejection.line
                    );
                }
                start += 1;
            }
        }
    }

    log::info!("Parsed {} holdings from {} lines", records.len(), lines.len());
    ExportTable::new(records)
}

/// Parse a currency, percent, or plain number.
///
/// Strips `$`, `%`, thousands separators, and whitespace. A leading sign or
/// surrounding parentheses mark a negative amount.
pub fn parse_amount(s: &str) -> Option<f64> {
    let s = s.trim();
    let negative = s.starts_with('-')
        || s.starts_with('\u{2212}')
        || (s.starts_with('(') && s.ends_with(')'));

    let cleaned: String = s
        .chars()
        .filter(|c| {
            !matches!(*c, '$' | '%' | ',' | '+' | '-' | '\u{2212}' | '(' | ')') && !c.is_whitespace()
        })
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let value = cleaned.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if negative { -value } else { value })
}

/// Parse an allocation percentage, rejecting values outside 0 - 100.
pub fn parse_percent(s: &str) -> Option<f64> {
    parse_amount(s).filter(|v| (0.0..=100.0).contains(v))
}
