//! Holdings export
//!
//! CSV serialization of an [`ExportTable`] plus terminal and text renderings.

pub mod table;

pub use table::{format_currency, format_holdings_text, render_table};

use crate::error::ExportError;
use crate::holdings::{ExportTable, HoldingRecord};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Column header of every export, in field order
pub const CSV_HEADER: [&str; 6] = [
    "Fund Name",
    "Asset Class",
    "Allocation %",
    "Current Value",
    "Shares",
    "Price Per Share",
];

type CsvRow = (
    String,
    String,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

/// Write the table as comma-separated UTF-8 with a header row.
///
/// Missing figures are written as empty cells. Returns the number of rows.
pub fn write_csv<W: Write>(table: &ExportTable, writer: W) -> Result<usize, ExportError> {
    let mut csv = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    for record in table {
        csv.serialize((
            &record.fund_name,
            &record.asset_class,
            record.allocation_percent,
            record.current_value,
            record.shares,
            record.price_per_share,
        ))?;
    }

    csv.flush()?;
    Ok(table.len())
}

/// Write the table to a CSV file at `path`.
pub fn save_csv(table: &ExportTable, path: &Path) -> Result<usize, ExportError> {
    let file = File::create(path)?;
    let rows = write_csv(table, file)?;
    log::info!("Saved {} holdings to {}", rows, path.display());
    Ok(rows)
}

/// Read an export back, mapping columns by position.
pub fn read_csv<R: Read>(reader: R) -> Result<ExportTable, ExportError> {
    let mut csv = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = csv.headers()?.clone();
    if headers.iter().ne(CSV_HEADER.iter().copied()) {
        return Err(ExportError::Header(headers.iter().collect::<Vec<_>>().join(",")));
    }

    let mut records = Vec::new();
    for row in csv.records() {
        let (fund_name, asset_class, allocation_percent, current_value, shares, price_per_share): CsvRow =
            row?.deserialize(None)?;
        records.push(HoldingRecord {
            fund_name,
            asset_class,
            allocation_percent,
            current_value,
            shares,
            price_per_share,
        });
    }

    Ok(ExportTable::new(records))
}
