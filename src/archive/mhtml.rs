//! MHTML reader
//!
//! Parses `multipart/related` page captures (Chrome "Save as single file",
//! `.mhtml` / `.mht`) and returns the first `text/html` part.

use super::{is_html_mime, ArchiveReader, HtmlResource};
use crate::error::{DecodeError, Result};
use base64::Engine;
use std::collections::HashMap;

const FORMAT: &str = "mhtml";

/// Bytes of the file inspected during detection
const DETECT_WINDOW: usize = 4096;

/// A MIME part with parsed headers
#[derive(Debug, Clone)]
struct MimePart {
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl MimePart {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn content_type(&self) -> ContentType {
        self.header("Content-Type")
            .map(ContentType::parse)
            .unwrap_or_else(|| ContentType::parse("text/plain"))
    }
}

/// `Content-Type` header split into essence and parameters
#[derive(Debug, Clone, PartialEq)]
struct ContentType {
    mime_type: String,
    params: HashMap<String, String>,
}

impl ContentType {
    fn parse(value: &str) -> Self {
        let mut pieces = value.split(';');
        let mime_type = pieces.next().unwrap_or_default().trim().to_ascii_lowercase();

        let params = pieces
            .filter_map(|piece| {
                let (key, value) = piece.split_once('=')?;
                let value = value.trim().trim_matches('"');
                Some((key.trim().to_ascii_lowercase(), value.to_string()))
            })
            .collect();

        Self { mime_type, params }
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    fn is_multipart(&self) -> bool {
        self.mime_type.starts_with("multipart/")
    }
}

pub struct MhtmlReader {
    detect_patterns: Vec<&'static str>,
}

impl MhtmlReader {
    pub fn new() -> Self {
        Self {
            detect_patterns: vec![
                "mime-version:",
                "content-type: multipart/related",
                "snapshot-content-location:",
            ],
        }
    }

    /// Walk the message depth first and collect leaf parts in document order.
    fn collect_parts(&self, part: MimePart, out: &mut Vec<MimePart>) -> Result<()> {
        let content_type = part.content_type();
        if !content_type.is_multipart() {
            out.push(part);
            return Ok(());
        }

        let boundary = content_type.param("boundary").ok_or_else(|| {
            DecodeError::malformed(FORMAT, "multipart content without boundary")
        })?;

        for body in split_multipart(&part.body, boundary) {
            self.collect_parts(parse_part(body), out)?;
        }
        Ok(())
    }
}

impl Default for MhtmlReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveReader for MhtmlReader {
    fn detect(&self, bytes: &[u8]) -> bool {
        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(DETECT_WINDOW)])
            .to_ascii_lowercase();
        self.detect_patterns
            .iter()
            .any(|pattern| head.contains(pattern))
    }

    fn html_resource(&self, bytes: &[u8]) -> Result<HtmlResource> {
        let message = parse_part(bytes);
        if message.headers.is_empty() {
            return Err(DecodeError::malformed(FORMAT, "missing MIME headers"));
        }

        let mut parts = Vec::new();
        self.collect_parts(message, &mut parts)?;

        let part = parts
            .into_iter()
            .find(|part| is_html_mime(&part.content_type().mime_type))
            .ok_or(DecodeError::NoHtmlResource)?;

        let content_type = part.content_type();
        let encoding = part
            .header("Content-Transfer-Encoding")
            .unwrap_or("7bit")
            .trim()
            .to_ascii_lowercase();

        Ok(HtmlResource {
            mime_type: content_type.mime_type.clone(),
            charset: content_type.param("charset").map(str::to_string),
            url: part.header("Content-Location").map(str::to_string),
            data: decode_transfer(&part.body, &encoding)?,
        })
    }

    fn format_name(&self) -> &'static str {
        FORMAT
    }
}

/// Split a raw part into unfolded headers and body.
fn parse_part(raw: &[u8]) -> MimePart {
    let (header_block, body) = match find_header_end(raw) {
        Some((end, sep_len)) => (&raw[..end], &raw[end + sep_len..]),
        None => (raw, &raw[raw.len()..]),
    };

    let text = String::from_utf8_lossy(header_block);
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in text.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    MimePart {
        headers,
        body: body.to_vec(),
    }
}

/// Position and length of the blank line ending a header block.
fn find_header_end(raw: &[u8]) -> Option<(usize, usize)> {
    let crlf = find(raw, b"\r\n\r\n").map(|pos| (pos, 4));
    let lf = find(raw, b"\n\n").map(|pos| (pos, 2));
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Split a multipart body on its boundary, skipping preamble and epilogue.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{}", boundary);
    let delimiter = delimiter.as_bytes();

    let mut parts = Vec::new();
    let Some(first) = find(body, delimiter) else {
        return parts;
    };
    let mut rest = &body[first + delimiter.len()..];

    loop {
        if rest.starts_with(b"--") {
            break;
        }
        let Some(next) = find(rest, delimiter) else {
            // Unterminated final part
            parts.push(trim_part(rest));
            break;
        };
        parts.push(trim_part(&rest[..next]));
        rest = &rest[next + delimiter.len()..];
    }

    parts
}

/// Drop the line break after a delimiter and the one before the next.
fn trim_part(part: &[u8]) -> &[u8] {
    let part = part
        .strip_prefix(b"\r\n")
        .or_else(|| part.strip_prefix(b"\n"))
        .unwrap_or(part);
    part.strip_suffix(b"\r\n")
        .or_else(|| part.strip_suffix(b"\n"))
        .unwrap_or(part)
}

fn decode_transfer(body: &[u8], encoding: &str) -> Result<Vec<u8>> {
    match encoding {
        "base64" => {
            let compact: Vec<u8> = body
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| DecodeError::TransferEncoding {
                    encoding: encoding.to_string(),
                    message: e.to_string(),
                })
        }
        "quoted-printable" => {
            quoted_printable::decode(body, quoted_printable::ParseMode::Robust).map_err(|e| {
                DecodeError::TransferEncoding {
                    encoding: encoding.to_string(),
                    message: e.to_string(),
                }
            })
        }
        "7bit" | "8bit" | "binary" => Ok(body.to_vec()),
        other => Err(DecodeError::TransferEncoding {
            encoding: other.to_string(),
            message: "unsupported encoding".to_string(),
        }),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
