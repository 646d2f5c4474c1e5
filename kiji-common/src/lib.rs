//! Common types shared across the Kiji crates.
//!
//! This crate defines the document model that flows through the cleaning
//! pipeline, the run-scoped dedup/index state, observability helpers, and the
//! shared error type. It stays dependency-light so every stage crate can
//! depend on it.
//!
//! # Overview
//!
//! - [`document`]: one type per pipeline stage, from [`RawRecord`] to [`CorpusRecord`]
//! - [`RunState`]: seen-hash set and index counter for one output target
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`KijiError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use kiji_common::{ContentHash, RunState};
//!
//! let mut state = RunState::new();
//! let hash = ContentHash::of("記事本文");
//! assert!(state.insert_hash(hash));
//! assert!(!state.insert_hash(hash));
//! assert_eq!(state.peek_index(), 0);
//! ```

pub mod document;
pub mod observability;
pub mod state;

pub use document::{
    CleanedDocument, CorpusRecord, DatedDocument, ExtractedDocument, NormalizedDocument,
    RawRecord, TaggedDocument, UNKNOWN_DATE,
};
pub use state::{ContentHash, RunState};

/// Error types used across the Kiji workspace.
#[derive(thiserror::Error, Debug)]
pub enum KijiError {
    /// A rule set, lexicon, or other data file was invalid.
    #[error("Data file error: {0}")]
    DataFile(String),

    /// The output sink rejected a record.
    #[error("Sink error: {0}")]
    Sink(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenient alias for results that use [`KijiError`].
pub type Result<T> = std::result::Result<T, KijiError>;
