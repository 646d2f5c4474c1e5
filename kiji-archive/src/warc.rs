//! WARC record framing: version line, headers, `Content-Length` block.
//!
//! The version line is checked for a `WARC/` prefix and then dropped.

use std::io::{BufRead, Read};

use crate::ArchiveError;

/// One WARC record with its block still undecoded.
#[derive(Debug, Clone)]
pub struct WarcRecord {
    pub headers: Vec<(String, String)>,
    pub block: Vec<u8>,
}

impl WarcRecord {
    /// Case-insensitive header lookup; first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn record_type(&self) -> Option<&str> {
        self.header("WARC-Type")
    }

    pub fn target_uri(&self) -> Option<&str> {
        self.header("WARC-Target-URI")
    }
}

pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Read one line, without its trailing `\r\n` / `\n`. `None` at EOF.
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> Result<Option<String>, ArchiveError> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Read the next record. Blank lines between records are skipped; `Ok(None)`
/// means a clean end of stream.
pub fn read_record<R: BufRead>(reader: &mut R) -> Result<Option<WarcRecord>, ArchiveError> {
    let mut buf = Vec::with_capacity(256);

    let version = loop {
        match read_line(reader, &mut buf)? {
            None => return Ok(None),
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => break line,
        }
    };
    if !version.starts_with("WARC/") {
        return Err(ArchiveError::Malformed(format!(
            "expected WARC version line, found {:?}",
            truncate(&version, 40)
        )));
    }

    let mut headers: Vec<(String, String)> = Vec::new();
    loop {
        let line = read_line(reader, &mut buf)?.ok_or_else(|| {
            ArchiveError::Malformed("stream ended inside record headers".into())
        })?;
        if line.is_empty() {
            break;
        }
        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
                continue;
            }
        }
        let (name, value) = line.split_once(':').ok_or_else(|| {
            ArchiveError::Malformed(format!("header without colon: {:?}", truncate(&line, 40)))
        })?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    let length: u64 = find_header(&headers, "Content-Length")
        .ok_or_else(|| ArchiveError::Malformed("record without Content-Length".into()))?
        .parse()
        .map_err(|_| ArchiveError::Malformed("unparseable Content-Length".into()))?;

    let mut block = Vec::new();
    let read = reader.take(length).read_to_end(&mut block)?;
    if (read as u64) < length {
        return Err(ArchiveError::Malformed(format!(
            "block truncated: expected {length} bytes, got {read}"
        )));
    }

    Ok(Some(WarcRecord {
        headers,
        block,
    }))
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
