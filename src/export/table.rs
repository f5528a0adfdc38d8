//! Text renderings of holdings for the terminal.

use super::CSV_HEADER;
use crate::holdings::{ExportTable, HoldingRecord};

const MISSING: &str = "N/A";

/// Format an amount as US currency: `$12,345.67`, `-$5.00`
pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let dollars = group_thousands(cents / 100);
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, dollars, cents % 100)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| MISSING.to_string())
}

fn format_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{}%", v))
        .unwrap_or_else(|| MISSING.to_string())
}

fn format_money(value: Option<f64>) -> String {
    value.map(format_currency).unwrap_or_else(|| MISSING.to_string())
}

fn cells(record: &HoldingRecord) -> [String; 6] {
    [
        record.fund_name.clone(),
        record.asset_class.clone(),
        format_percent(record.allocation_percent),
        format_money(record.current_value),
        format_number(record.shares),
        format_money(record.price_per_share),
    ]
}

/// Render the table with aligned columns, numbers right-aligned.
pub fn render_table(table: &ExportTable) -> String {
    if table.is_empty() {
        return "No holdings found.".to_string();
    }

    let rows: Vec<[String; 6]> = table.iter().map(cells).collect();

    let mut widths = CSV_HEADER.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = CSV_HEADER
        .iter()
        .zip(widths)
        .map(|(h, w)| format!("{:<w$}", h, w = w))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');

    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(col, (cell, w))| {
                if col < 2 {
                    format!("{:<w$}", cell, w = w)
                } else {
                    format!("{:>w$}", cell, w = w)
                }
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }

    out.push_str(&format!(
        "{} holdings, total value {}\n",
        table.len(),
        format_currency(table.total_value())
    ));
    out
}

/// Render each record as a block of lines in page order, blocks separated
/// by a blank line.
pub fn format_holdings_text(table: &ExportTable) -> String {
    table
        .iter()
        .map(|record| cells(record).join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}
