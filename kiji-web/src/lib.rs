//! HTML extraction for archived pages.
//!
//! - [`HtmlExtractor`]: prune structural/boilerplate subtrees, then collect
//!   visible text and anchor targets (`extract`)

pub mod extract;

pub use extract::HtmlExtractor;
