use mime::Mime;

use super::BackendError;
use crate::models::{AnalysisReport, AnalysisResponse};

/// One body part of a `multipart/*` message.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Part {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Decode a stack analysis response body according to its `Content-Type`.
pub fn parse_analysis_response(
    content_type: &str,
    body: &[u8],
) -> Result<AnalysisResponse, BackendError> {
    let media: Mime = content_type
        .parse()
        .map_err(|_| BackendError::UnsupportedContentType(content_type.to_string()))?;

    if media.type_() == mime::APPLICATION && media.subtype() == mime::JSON {
        return Ok(AnalysisResponse::Json(serde_json::from_slice(body)?));
    }

    if media.type_() == mime::MULTIPART && media.subtype().as_str() == "mixed" {
        let boundary = media
            .get_param(mime::BOUNDARY)
            .ok_or_else(|| BackendError::Multipart("missing boundary parameter".to_string()))?;
        return parse_mixed(body, boundary.as_str());
    }

    Err(BackendError::UnsupportedContentType(
        media.essence_str().to_string(),
    ))
}

fn parse_mixed(body: &[u8], boundary: &str) -> Result<AnalysisResponse, BackendError> {
    let mut report: Option<AnalysisReport> = None;
    let mut html: Option<Vec<u8>> = None;

    for part in parse_multipart(body, boundary)? {
        let part_type = part.header("Content-Type").unwrap_or("text/plain");
        let essence = part_type
            .parse::<Mime>()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|_| part_type.to_string());

        match essence.as_str() {
            "application/json" => report = Some(serde_json::from_slice(&part.body)?),
            "text/html" => html = Some(part.body),
            _ => return Err(BackendError::UnknownPart(part_type.to_string())),
        }
    }

    let report = report
        .ok_or_else(|| BackendError::Multipart("response has no application/json part".to_string()))?;
    Ok(AnalysisResponse::Mixed { report, html })
}

/// Split a multipart body into its parts.
///
/// Preamble and epilogue are discarded. Both CRLF and bare LF line endings
/// are accepted.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Result<Vec<Part>, BackendError> {
    let delimiter = format!("--{}", boundary).into_bytes();

    let mut pos = if body.starts_with(&delimiter) && ends_delimiter(&body[delimiter.len()..]) {
        0
    } else {
        find_delimiter(body, &delimiter, 0)
            .ok_or_else(|| BackendError::Multipart("missing opening boundary".to_string()))?
    };

    let mut parts = Vec::new();
    loop {
        pos += delimiter.len();
        if body[pos..].starts_with(b"--") {
            return Ok(parts);
        }

        // skip transport padding up to the end of the delimiter line
        let line_end = find(body, b"\n", pos)
            .ok_or_else(|| BackendError::Multipart("truncated boundary line".to_string()))?;
        pos = line_end + 1;

        let next = find_delimiter(body, &delimiter, pos - 1)
            .ok_or_else(|| BackendError::Multipart("missing closing boundary".to_string()))?;

        let mut end = next - 1;
        if end > pos && body[end - 1] == b'\r' {
            end -= 1;
        }
        parts.push(parse_part(&body[pos..end.max(pos)]));
        pos = next;
    }
}

/// Offset of the next delimiter starting a line at or after `from`.
///
/// Lines that merely begin with the delimiter text are part of the body.
fn find_delimiter(body: &[u8], delimiter: &[u8], from: usize) -> Option<usize> {
    let mut line_delimiter = b"\n".to_vec();
    line_delimiter.extend_from_slice(delimiter);

    let mut from = from;
    loop {
        let at = find(body, &line_delimiter, from)? + 1;
        if ends_delimiter(&body[at + delimiter.len()..]) {
            return Some(at);
        }
        from = at;
    }
}

/// A delimiter is followed by `--`, or by optional whitespace and a line end.
fn ends_delimiter(rest: &[u8]) -> bool {
    if rest.starts_with(b"--") {
        return true;
    }
    let padding = rest.iter().take_while(|b| matches!(b, b' ' | b'\t')).count();
    let rest = &rest[padding..];
    rest.is_empty() || rest.starts_with(b"\r\n") || rest.starts_with(b"\n")
}

fn parse_part(raw: &[u8]) -> Part {
    let (head, body) = if raw.starts_with(b"\r\n") {
        (&raw[..0], &raw[2..])
    } else if raw.starts_with(b"\n") {
        (&raw[..0], &raw[1..])
    } else if let Some(i) = find(raw, b"\r\n\r\n", 0) {
        (&raw[..i], &raw[i + 4..])
    } else if let Some(i) = find(raw, b"\n\n", 0) {
        (&raw[..i], &raw[i + 2..])
    } else {
        (raw, &raw[raw.len()..])
    };

    let headers = String::from_utf8_lossy(head)
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    Part {
        headers,
        body: body.to_vec(),
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}
