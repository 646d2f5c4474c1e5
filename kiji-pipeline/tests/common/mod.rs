#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use kiji_config::{JobSpec, OutputFormat};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness capture.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

pub fn warc_response(uri: &str, content_type: &str, body: &str) -> Vec<u8> {
    let block = format!("HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\n\r\n{body}");
    let mut out = format!(
        "WARC/1.0\r\nWARC-Type: response\r\nWARC-Target-URI: {uri}\r\nContent-Length: {}\r\n\r\n",
        block.len()
    )
    .into_bytes();
    out.extend_from_slice(block.as_bytes());
    out.extend_from_slice(b"\r\n\r\n");
    out
}

/// Write an archive of HTML responses, `(uri, html)` in order.
pub fn write_archive(path: &Path, pages: &[(&str, &str)]) {
    let mut data = Vec::new();
    for (uri, html) in pages {
        data.extend(warc_response(uri, "text/html; charset=UTF-8", html));
    }
    fs::write(path, data).unwrap();
}

pub fn job(name: &str, inputs: Vec<PathBuf>, output: PathBuf, format: OutputFormat) -> JobSpec {
    JobSpec {
        name: name.into(),
        inputs,
        output,
        format,
    }
}
