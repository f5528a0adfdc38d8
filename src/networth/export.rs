//! Net worth CSV and text output.

use super::NetWorth;
use crate::error::ExportError;
use crate::export::format_currency;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const NETWORTH_CSV_HEADER: [&str; 6] =
    ["Account", "Type", "Balance", "Category", "Provider", "Date"];

const UNKNOWN: &str = "Unknown";
const TOTAL_ACCOUNT: &str = "TOTAL NET WORTH";

/// Write one row per account plus a closing `TOTAL NET WORTH` row.
///
/// Returns the number of account rows.
pub fn write_networth_csv<W: Write>(net_worth: &NetWorth, writer: W) -> Result<usize, ExportError> {
    let mut csv = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv.write_record(NETWORTH_CSV_HEADER)?;

    for account in &net_worth.accounts {
        let balance = format!("{:.2}", account.balance);
        csv.write_record([
            account.account.as_str(),
            account.account_type.as_deref().unwrap_or(UNKNOWN),
            balance.as_str(),
            account.category.label(),
            account.provider.as_str(),
            account.as_of.as_deref().unwrap_or(UNKNOWN),
        ])?;
    }

    let total = format!("{:.2}", net_worth.total);
    csv.write_record([
        TOTAL_ACCOUNT,
        "Total",
        total.as_str(),
        "Total",
        "Summary",
        net_worth.total_source.label(),
    ])?;

    csv.flush()?;
    Ok(net_worth.accounts.len())
}

pub fn save_networth_csv(net_worth: &NetWorth, path: &Path) -> Result<usize, ExportError> {
    let file = File::create(path)?;
    let rows = write_networth_csv(net_worth, file)?;
    log::info!("Saved {} accounts to {}", rows, path.display());
    Ok(rows)
}

/// Human-readable summary, accounts grouped by category.
pub fn format_networth_text(net_worth: &NetWorth) -> String {
    let mut lines = vec!["NET WORTH SUMMARY".to_string(), "=".repeat(50), String::new()];

    for (category, accounts) in net_worth.by_category() {
        let label = category.label();
        lines.push(format!("{}:", label.to_uppercase()));
        lines.push("-".repeat(label.len() + 1));
        for account in accounts {
            lines.push(format!("  Account:      {}", account.account));
            lines.push(format!(
                "  Type:         {}",
                account.account_type.as_deref().unwrap_or(UNKNOWN)
            ));
            lines.push(format!("  Balance:      {}", format_currency(account.balance)));
            lines.push(String::new());
        }
        lines.push(String::new());
    }

    lines.push(format!("{}:", TOTAL_ACCOUNT));
    lines.push("=".repeat(TOTAL_ACCOUNT.len() + 1));
    lines.push(format!(
        "{} ({})",
        format_currency(net_worth.total),
        net_worth.total_source.label().to_lowercase()
    ));
    lines.push(format!("Total Accounts: {}", net_worth.accounts.len()));

    lines.join("\n")
}
