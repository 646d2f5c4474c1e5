use kiji_common::{CleanedDocument, ContentHash, RunState};
use tracing::debug;

/// Whole-document dedup keyed on a digest of the cleaned text.
///
/// The seen set lives in the caller's [`RunState`], so one state per output
/// target gives one dedup scope per output target.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactDedup;

impl ExactDedup {
    pub fn new() -> Self {
        Self
    }

    /// Returns `true` if the document is new and should continue down the
    /// pipeline. A rejected document leaves the state unchanged and consumes no index.
    pub fn admit(&self, state: &mut RunState, doc: &CleanedDocument) -> bool {
        let hash = ContentHash::of(&doc.text);
        if state.insert_hash(hash) {
            return true;
        }
        debug!(url = %doc.url, hash = %hash, "dedup.exact.duplicate");
        false
    }
}
