//! Archived Page Text Extraction
//!
//! Decodes saved web page captures (Safari webarchive, MHTML) and flattens
//! the primary HTML resource into lines of visible text.

pub mod html;
pub mod mhtml;
pub mod webarchive;

use crate::error::{DecodeError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Maximum archive size (64 MB)
pub const MAX_ARCHIVE_SIZE: usize = 64 * 1024 * 1024;

/// MIME types treated as the page's HTML
const HTML_MIME_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// HTML payload pulled out of an archive, still in its declared charset
#[derive(Debug, Clone)]
pub struct HtmlResource {
    pub mime_type: String,
    pub charset: Option<String>,
    pub url: Option<String>,
    pub data: Vec<u8>,
}

impl HtmlResource {
    /// Decode the payload into a string using the declared charset.
    pub fn decode(&self) -> String {
        decode_charset(&self.data, self.charset.as_deref()).into_owned()
    }
}

/// Visible page text, one text run per line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainText {
    lines: Vec<String>,
}

impl PlainText {
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Join the lines back into a single newline separated string.
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

impl From<&str> for PlainText {
    fn from(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { lines }
    }
}

/// Result of reading an archive
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveText {
    pub format: String,
    pub url: Option<String>,
    pub text: PlainText,
}

/// Archive format reader trait
pub trait ArchiveReader: Send + Sync {
    /// Check if this reader recognizes the given bytes
    fn detect(&self, bytes: &[u8]) -> bool;

    /// Locate and transfer-decode the primary HTML resource
    fn html_resource(&self, bytes: &[u8]) -> Result<HtmlResource>;

    /// Get the format name
    fn format_name(&self) -> &'static str;
}

/// All available archive readers, in detection order
pub fn get_readers() -> Vec<Box<dyn ArchiveReader>> {
    vec![
        Box::new(webarchive::WebArchiveReader::new()),
        Box::new(mhtml::MhtmlReader::new()),
    ]
}

fn validate_archive(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    if bytes.len() > MAX_ARCHIVE_SIZE {
        return Err(DecodeError::TooLarge {
            size: bytes.len(),
            max: MAX_ARCHIVE_SIZE,
        });
    }

    Ok(())
}

/// Read an archive using format auto-detection
pub fn read_archive(bytes: &[u8]) -> Result<ArchiveText> {
    validate_archive(bytes)?;

    let readers = get_readers();
    let reader = readers
        .iter()
        .find(|reader| reader.detect(bytes))
        .ok_or(DecodeError::UnrecognizedArchive)?;

    let resource = reader.html_resource(bytes)?;
    log::debug!(
        "Using {} resource {} ({} bytes, charset {})",
        resource.mime_type,
        resource.url.as_deref().unwrap_or("<no url>"),
        resource.data.len(),
        resource.charset.as_deref().unwrap_or("utf-8")
    );

    let lines = html::html_to_lines(&resource.decode());
    log::info!(
        "Extracted {} text lines from {}",
        lines.len(),
        reader.format_name()
    );

    Ok(ArchiveText {
        format: reader.format_name().to_string(),
        url: resource.url,
        text: PlainText::from_lines(lines),
    })
}

/// Decode an archive into plain text lines
pub fn extract_text(bytes: &[u8]) -> Result<PlainText> {
    read_archive(bytes).map(|archive| archive.text)
}

/// Whether a declared MIME type denotes an HTML document
pub fn is_html_mime(mime_type: &str) -> bool {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    HTML_MIME_TYPES.contains(&essence.as_str())
}

/// Decode bytes in the given charset label, falling back to UTF-8
pub fn decode_charset<'a>(data: &'a [u8], charset: Option<&str>) -> Cow<'a, str> {
    let encoding = charset
        .and_then(|label| encoding_rs::Encoding::for_label(label.trim().as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);

    let (text, actual, had_errors) = encoding.decode(data);
    if had_errors {
        log::warn!(
            "Replaced invalid {} sequences while decoding HTML",
            actual.name()
        );
    }
    text
}
