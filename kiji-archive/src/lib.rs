//! Archive reading: WARC files in, HTML response records out.
//!
//! - [`ArchiveReader`]: lazy iterator of [`RawRecord`]s over one archive
//! - [`discover_archives`]: expand input directories into archive files
//! - [`warc`] / [`http`]: record framing and HTTP payload decoding
//!
//! Only `response` records whose HTTP `Content-Type` contains `text/html` are
//! yielded. A reader stops for good after its first error; the caller decides
//! whether to move on to the next file.

pub mod http;
pub mod warc;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use kiji_common::RawRecord;
use thiserror::Error;
use tracing::{debug, warn};

use crate::http::HttpResponse;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O error while reading archive: {0}")]
    Io(#[from] io::Error),
    #[error("malformed WARC record: {0}")]
    Malformed(String),
}

/// Boxed reader used for archives opened from disk.
pub type ArchiveStream = Box<dyn BufRead + Send>;

/// Iterator over the HTML responses of one archive.
pub struct ArchiveReader<R> {
    inner: R,
    done: bool,
    records_seen: u64,
}

impl ArchiveReader<ArchiveStream> {
    /// Open a `.warc` or gzip-compressed `.warc.gz` file.
    ///
    /// Compression is detected from the leading magic bytes, not the name.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let open_err = |source| ArchiveError::Open {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(open_err)?;
        let mut reader = BufReader::new(file);
        let compressed = reader.fill_buf().map_err(open_err)?.starts_with(&GZIP_MAGIC);

        let stream: ArchiveStream = if compressed {
            Box::new(BufReader::new(MultiGzDecoder::new(reader)))
        } else {
            Box::new(reader)
        };
        Ok(Self::new(stream))
    }
}

impl<R: BufRead> ArchiveReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            done: false,
            records_seen: 0,
        }
    }

    /// WARC records consumed so far, of any type.
    pub fn records_seen(&self) -> u64 {
        self.records_seen
    }

    fn next_html_response(&mut self) -> Result<Option<RawRecord>, ArchiveError> {
        while let Some(record) = warc::read_record(&mut self.inner)? {
            self.records_seen += 1;
            if record.record_type() != Some("response") {
                continue;
            }
            let Some(url) = record.target_uri().map(str::to_string) else {
                warn!("archive.response.missing_target_uri");
                continue;
            };
            let Some(response) = HttpResponse::parse(&record.block) else {
                debug!(%url, "archive.response.not_http");
                continue;
            };
            if !response.is_html() {
                continue;
            }
            let content_type = response.content_type().to_string();
            return Ok(Some(RawRecord {
                url,
                content_type,
                payload: response.decoded_body(),
            }));
        }
        Ok(None)
    }
}

impl<R: BufRead> Iterator for ArchiveReader<R> {
    type Item = Result<RawRecord, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_html_response() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for ArchiveReader<R> {}

/// True for `*.warc` and `*.warc.gz` file names.
pub fn is_archive_name(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    name.ends_with(".warc") || name.ends_with(".warc.gz")
}

/// Expand inputs into archive paths.
///
/// Directories contribute their archive files (not recursive), sorted by
/// name; any other input is kept as given so that a missing file is reported
/// when it is opened.
pub fn discover_archives(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            out.push(input.clone());
            continue;
        }
        match std::fs::read_dir(input) {
            Ok(entries) => {
                let mut found: Vec<PathBuf> = entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.is_file() && is_archive_name(p))
                    .collect();
                found.sort();
                debug!(dir = %input.display(), count = found.len(), "archive.discover.dir");
                out.extend(found);
            }
            Err(err) => {
                warn!(dir = %input.display(), error = %err, "archive.discover.read_dir_failed");
            }
        }
    }
    out
}
