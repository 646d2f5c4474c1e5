//! HTTP/1.x response parsing for WARC `response` blocks.
//!
//! Body decoding is best effort: a broken chunked framing or a corrupt gzip
//! stream falls back to the bytes as stored, so a bad body never ends the file.

use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};
use tracing::debug;

use crate::warc::find_header;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Split a response block into status, headers and body.
    ///
    /// Returns `None` when the block has no recognisable status line.
    pub fn parse(block: &[u8]) -> Option<Self> {
        let (head_end, body_start) = find_head_end(block)?;
        let head = String::from_utf8_lossy(&block[..head_end]);
        let mut lines = head.lines();

        let status_line = lines.next()?;
        let mut parts = status_line.split_whitespace();
        if !parts.next()?.starts_with("HTTP/") {
            return None;
        }
        let status = parts.next()?.parse().ok()?;

        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();

        Some(Self {
            status,
            headers,
            body: block[body_start..].to_vec(),
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> &str {
        self.header("Content-Type").unwrap_or("")
    }

    pub fn is_html(&self) -> bool {
        self.content_type().to_ascii_lowercase().contains("text/html")
    }

    /// Body with transfer and content encodings removed.
    pub fn decoded_body(self) -> Vec<u8> {
        let chunked = self
            .header("Transfer-Encoding")
            .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"));
        let encoding = self
            .header("Content-Encoding")
            .map(|v| v.trim().to_ascii_lowercase());

        let mut body = self.body;
        if chunked {
            match dechunk(&body) {
                Some(plain) => body = plain,
                None => debug!("archive.http.dechunk_failed"),
            }
        }

        match encoding.as_deref() {
            Some("gzip") | Some("x-gzip") => {
                inflate(GzDecoder::new(body.as_slice()), "gzip").unwrap_or(body)
            }
            Some("deflate") => inflate(ZlibDecoder::new(body.as_slice()), "deflate").unwrap_or(body),
            _ => body,
        }
    }
}

fn inflate<R: Read>(mut decoder: R, kind: &'static str) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    match decoder.read_to_end(&mut out) {
        Ok(_) => Some(out),
        Err(err) => {
            debug!(encoding = kind, error = %err, "archive.http.inflate_failed");
            None
        }
    }
}

/// Returns (end of head, start of body).
fn find_head_end(block: &[u8]) -> Option<(usize, usize)> {
    if let Some(pos) = find(block, b"\r\n\r\n") {
        return Some((pos, pos + 4));
    }
    find(block, b"\n\n").map(|pos| (pos, pos + 2))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn dechunk(mut data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len());
    loop {
        let line_end = find(data, b"\r\n")?;
        let size_field = std::str::from_utf8(&data[..line_end]).ok()?;
        let size_hex = size_field.split(';').next()?.trim();
        let size = usize::from_str_radix(size_hex, 16).ok()?;
        data = &data[line_end + 2..];
        if size == 0 {
            return Some(out);
        }
        if data.len() < size {
            return None;
        }
        out.extend_from_slice(&data[..size]);
        data = data.get(size..)?;
        data = data.strip_prefix(b"\r\n").unwrap_or(data);
    }
}
