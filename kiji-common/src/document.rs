//! Document types, one per pipeline stage.
//!
//! Each stage consumes the previous stage's type by value and produces the
//! next one, so a document is never revisited once it has moved on.

use serde::{Deserialize, Serialize};

/// Date value used when no timestamp could be found or parsed.
pub const UNKNOWN_DATE: &str = "Unknown";

/// One captured HTTP response with an HTML payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub url: String,
    pub content_type: String,
    pub payload: Vec<u8>,
}

impl RawRecord {
    /// Decode the payload as UTF-8, dropping invalid byte sequences.
    ///
    /// ```
    /// use kiji_common::RawRecord;
    ///
    /// let raw = RawRecord {
    ///     url: "https://example.com/".into(),
    ///     content_type: "text/html".into(),
    ///     payload: b"ab\xffcd".to_vec(),
    /// };
    /// assert_eq!(raw.decode_payload(), "abcd");
    /// ```
    pub fn decode_payload(&self) -> String {
        let mut out = String::with_capacity(self.payload.len());
        for chunk in self.payload.utf8_chunks() {
            out.push_str(chunk.valid());
        }
        out
    }
}

/// Visible text plus outbound links, straight out of the HTML extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub url: String,
    pub text: String,
    /// Document order; duplicates and relative URLs are kept.
    pub links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    pub url: String,
    pub text: String,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedDocument {
    pub url: String,
    /// `YYYY-MM-DD HH:MM`, or [`UNKNOWN_DATE`].
    pub date: String,
    pub text: String,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedDocument {
    pub url: String,
    pub date: String,
    /// Proper nouns wrapped as `<NE>surface</NE>`.
    pub text: String,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedDocument {
    pub url: String,
    pub date: String,
    pub text: String,
    /// At most one entry.
    pub links: Vec<String>,
}

/// Final persisted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub index: u64,
    pub date: String,
    pub text: String,
    /// Links joined with [`CorpusRecord::LINK_DELIMITER`].
    pub links: String,
}

impl CorpusRecord {
    pub const LINK_DELIMITER: &'static str = ",";

    pub fn new(index: u64, doc: &CleanedDocument) -> Self {
        Self {
            index,
            date: doc.date.clone(),
            text: doc.text.clone(),
            links: doc.links.join(Self::LINK_DELIMITER),
        }
    }
}
