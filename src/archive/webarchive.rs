//! Safari WebArchive reader
//!
//! A webarchive is a property list (usually binary) with a `WebMainResource`
//! dictionary and an optional `WebSubresources` array.

use super::{is_html_mime, ArchiveReader, HtmlResource};
use crate::error::{DecodeError, Result};
use plist::{Dictionary, Value};
use std::io::Cursor;

const BPLIST_MAGIC: &[u8] = b"bplist00";
const FORMAT: &str = "webarchive";

const MAIN_RESOURCE: &str = "WebMainResource";
const SUBRESOURCES: &str = "WebSubresources";
const RESOURCE_DATA: &str = "WebResourceData";
const RESOURCE_MIME_TYPE: &str = "WebResourceMIMEType";
const RESOURCE_ENCODING: &str = "WebResourceTextEncodingName";
const RESOURCE_URL: &str = "WebResourceURL";

pub struct WebArchiveReader {
    xml_markers: Vec<&'static str>,
}

impl WebArchiveReader {
    pub fn new() -> Self {
        Self {
            xml_markers: vec!["<plist", "<!DOCTYPE plist"],
        }
    }

    fn resource_from(&self, dict: &Dictionary) -> Option<HtmlResource> {
        let mime_type = dict.get(RESOURCE_MIME_TYPE).and_then(Value::as_string)?;
        if !is_html_mime(mime_type) {
            return None;
        }

        let data = dict.get(RESOURCE_DATA).and_then(Value::as_data)?;

        Some(HtmlResource {
            mime_type: mime_type.to_string(),
            charset: dict
                .get(RESOURCE_ENCODING)
                .and_then(Value::as_string)
                .map(str::to_string),
            url: dict
                .get(RESOURCE_URL)
                .and_then(Value::as_string)
                .map(str::to_string),
            data: data.to_vec(),
        })
    }
}

impl Default for WebArchiveReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveReader for WebArchiveReader {
    fn detect(&self, bytes: &[u8]) -> bool {
        if bytes.starts_with(BPLIST_MAGIC) {
            return true;
        }

        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
        head.trim_start().starts_with("<?xml")
            && self.xml_markers.iter().any(|marker| head.contains(marker))
    }

    fn html_resource(&self, bytes: &[u8]) -> Result<HtmlResource> {
        let value = Value::from_reader(Cursor::new(bytes))
            .map_err(|e| DecodeError::malformed(FORMAT, e.to_string()))?;

        let root = value
            .as_dictionary()
            .ok_or_else(|| DecodeError::malformed(FORMAT, "top-level object is not a dictionary"))?;

        let main = root.get(MAIN_RESOURCE).and_then(Value::as_dictionary);
        let subresources = root
            .get(SUBRESOURCES)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        if main.is_none() && subresources.is_empty() {
            return Err(DecodeError::malformed(
                FORMAT,
                format!("missing {}", MAIN_RESOURCE),
            ));
        }

        main.into_iter()
            .chain(subresources.iter().filter_map(Value::as_dictionary))
            .find_map(|dict| self.resource_from(dict))
            .ok_or(DecodeError::NoHtmlResource)
    }

    fn format_name(&self) -> &'static str {
        FORMAT
    }
}

/// Build a webarchive in memory. Used by tests across the crate.
#[cfg(test)]
pub(crate) fn build_webarchive(main: Option<(&str, &str)>, subresources: &[(&str, &str)]) -> Vec<u8> {
    fn resource(mime_type: &str, data: &str, url: &str) -> Value {
        let mut dict = Dictionary::new();
        dict.insert(RESOURCE_MIME_TYPE.to_string(), Value::String(mime_type.to_string()));
        dict.insert(RESOURCE_ENCODING.to_string(), Value::String("UTF-8".to_string()));
        dict.insert(RESOURCE_URL.to_string(), Value::String(url.to_string()));
        dict.insert(RESOURCE_DATA.to_string(), Value::Data(data.as_bytes().to_vec()));
        Value::Dictionary(dict)
    }

    let mut root = Dictionary::new();
    if let Some((mime_type, data)) = main {
        root.insert(
            MAIN_RESOURCE.to_string(),
            resource(mime_type, data, "https://participant.empower-retirement.com/dashboard"),
        );
    }
    if !subresources.is_empty() {
        let items = subresources
            .iter()
            .enumerate()
            .map(|(i, (mime_type, data))| {
                resource(mime_type, data, &format!("https://example.com/resource/{}", i))
            })
            .collect();
        root.insert(SUBRESOURCES.to_string(), Value::Array(items));
    }

    let mut bytes = Vec::new();
    Value::Dictionary(root)
        .to_writer_binary(&mut bytes)
        .expect("write binary plist");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<html><body><h2>Holdings</h2><p>Equity</p></body></html>";

    #[test]
    fn test_detect() {
        let reader = WebArchiveReader::new();
        assert!(reader.detect(b"bplist00\x00\x01"));
        assert!(reader.detect(b"<?xml version=\"1.0\"?>\n<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\">"));
        assert!(!reader.detect(b"<?xml version=\"1.0\"?><svg></svg>"));
        assert!(!reader.detect(b"MIME-Version: 1.0"));
    }

    #[test]
    fn test_main_resource() {
        let bytes = build_webarchive(Some(("text/html", PAGE)), &[("text/css", "p {}")]);
        let resource = WebArchiveReader::new().html_resource(&bytes).unwrap();
        assert_eq!(resource.mime_type, "text/html");
        assert_eq!(resource.charset.as_deref(), Some("UTF-8"));
        assert_eq!(resource.data, PAGE.as_bytes());
    }

    #[test]
    fn test_falls_back_to_first_html_subresource() {
        let bytes = build_webarchive(
            Some(("image/png", "PNG")),
            &[("text/css", "p {}"), ("text/html", PAGE), ("text/html", "<p>second</p>")],
        );
        let resource = WebArchiveReader::new().html_resource(&bytes).unwrap();
        assert_eq!(resource.data, PAGE.as_bytes());
        assert_eq!(resource.url.as_deref(), Some("https://example.com/resource/1"));
    }

    #[test]
    fn test_no_html_resource() {
        let bytes = build_webarchive(Some(("image/png", "PNG")), &[("text/css", "p {}")]);
        assert!(matches!(
            WebArchiveReader::new().html_resource(&bytes),
            Err(DecodeError::NoHtmlResource)
        ));
    }

    #[test]
    fn test_missing_main_resource_is_malformed() {
        let bytes = build_webarchive(None, &[]);
        assert!(matches!(
            WebArchiveReader::new().html_resource(&bytes),
            Err(DecodeError::Malformed { .. })
        ));
    }

    #[test]
    fn test_truncated_plist_is_malformed() {
        let bytes = build_webarchive(Some(("text/html", PAGE)), &[]);
        assert!(matches!(
            WebArchiveReader::new().html_resource(&bytes[..bytes.len() / 2]),
            Err(DecodeError::Malformed { .. })
        ));
    }
}
