//! Line-level near-duplicate collapse within a single document.
//!
//! Two lines are near-duplicates when their [`similarity`] exceeds the
//! threshold. A line is dropped when any *later* line is its near-duplicate,
//! so from each group of similar lines only the last one survives, in its
//! original position. Comparison is quadratic in the number of lines.

use kiji_common::CleanedDocument;
use tracing::debug;

pub const DEFAULT_THRESHOLD: u8 = 90;

const LINE_SEPARATOR: char = '\n';

/// Normalized edit-distance similarity on a 0..=100 scale.
///
/// ```
/// use kiji_dedup::similarity;
///
/// assert_eq!(similarity("abc", "abc"), 100);
/// assert_eq!(similarity("", ""), 100);
/// assert_eq!(similarity("abcd", "wxyz"), 0);
/// ```
pub fn similarity(a: &str, b: &str) -> u8 {
    (strsim::normalized_levenshtein(a, b) * 100.0).round() as u8
}

#[derive(Debug, Clone, Copy)]
pub struct NearDedup {
    threshold: u8,
}

impl Default for NearDedup {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl NearDedup {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Collapse near-duplicate lines. Returns the document and the number of
    /// lines dropped.
    pub fn dedup(&self, mut doc: CleanedDocument) -> (CleanedDocument, usize) {
        let (text, dropped) = self.dedup_text(&doc.text);
        if dropped > 0 {
            debug!(url = %doc.url, dropped, "dedup.near.collapsed");
            doc.text = text;
        }
        (doc, dropped)
    }

    pub fn dedup_text(&self, text: &str) -> (String, usize) {
        let lines: Vec<&str> = text.split(LINE_SEPARATOR).collect();
        let kept: Vec<&str> = lines
            .iter()
            .enumerate()
            .filter(|&(i, line)| {
                !lines[i + 1..]
                    .iter()
                    .any(|later| similarity(line, later) > self.threshold)
            })
            .map(|(_, line)| *line)
            .collect();

        let dropped = lines.len() - kept.len();
        (kept.join("\n"), dropped)
    }
}
