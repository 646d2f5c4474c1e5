//! Duplicate filtering for cleaned documents.
//!
//! - [`ExactDedup`]: drop whole documents whose cleaned text was already
//!   seen in the current [`RunState`](kiji_common::RunState)
//! - [`NearDedup`]: inside one document, collapse near-identical lines and
//!   keep the latest occurrence

pub mod exact;
pub mod near;

pub use exact::ExactDedup;
pub use near::{similarity, NearDedup, DEFAULT_THRESHOLD};
