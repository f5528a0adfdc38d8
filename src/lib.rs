//! Extract portfolio holdings from saved Empower account pages.
//!
//! The pipeline is archive bytes → [`archive::extract_text`] →
//! [`holdings::parse_holdings`] → [`export::write_csv`]. Net worth pages go
//! through [`networth::extract_net_worth`] instead.

pub mod archive;
pub mod config;
pub mod error;
pub mod export;
pub mod files;
pub mod holdings;
pub mod networth;
pub mod stats;

use archive::PlainText;
use error::Result;
use holdings::{ExportTable, IntegrityCheck};
use serde::{Deserialize, Serialize};

/// Everything extracted from one archive
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub format: String,
    pub url: Option<String>,
    pub holdings: ExportTable,
    pub integrity: Option<IntegrityCheck>,
    #[serde(skip)]
    pub text: PlainText,
}

/// Decode an archive and parse its holdings table.
pub fn extract_holdings(bytes: &[u8]) -> Result<Extraction> {
    let archive = archive::read_archive(bytes)?;
    let holdings = holdings::parse_holdings(&archive.text);
    let integrity = holdings::check_integrity(&archive.text, &holdings);

    Ok(Extraction {
        format: archive.format,
        url: archive.url,
        holdings,
        integrity,
        text: archive.text,
    })
}
