//! Error types for archive decoding and export.

use thiserror::Error;

/// Result alias for archive decoding.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// The captured page could not be turned into text.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Archive is empty")]
    Empty,

    #[error("Archive too large ({size} bytes, maximum {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("Not a recognizable webarchive or MHTML file")]
    UnrecognizedArchive,

    #[error("Malformed {format}: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },

    #[error("Archive contains no HTML resource")]
    NoHtmlResource,

    #[error("Cannot decode '{encoding}' transfer encoding: {message}")]
    TransferEncoding { encoding: String, message: String },
}

impl DecodeError {
    pub(crate) fn malformed(format: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            format,
            message: message.into(),
        }
    }
}

/// The page text holds no recognizable net worth account list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetWorthError {
    #[error("No net worth indicators found")]
    NoIndicators,

    #[error("Account table (Account / Type / Balance) not found")]
    NoAccountTable,

    #[error("No account information found in the expected format")]
    NoAccounts,
}

/// Writing or reading a CSV export failed.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected CSV header: {0}")]
    Header(String),
}
