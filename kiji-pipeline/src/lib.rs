//! Archive-to-corpus cleaning pipeline.
//!
//! - [`Pipeline`]: extraction, normalization, dating, tagging, pruning and
//!   dedup over one record at a time
//! - [`RecordWriter`]: index assignment over a [`RecordSink`] (CSV file or a
//!   directory of text files)
//! - [`run_job`]: drive every archive of a job through both, producing a
//!   [`JobReport`]
//!
//! # Examples
//!
//! ```rust
//! use kiji_common::{RawRecord, RunState};
//! use kiji_pipeline::{Outcome, Pipeline};
//!
//! let pipeline = Pipeline::default();
//! let mut state = RunState::new();
//! let raw = RawRecord {
//!     url: "https://news.example.jp/1".into(),
//!     content_type: "text/html".into(),
//!     payload: "<p>2023年06月21日 14:30 東京で会見</p>".as_bytes().to_vec(),
//! };
//! match pipeline.process(raw, &mut state) {
//!     Outcome::Retained { doc, .. } => {
//!         assert_eq!(doc.date, "2023-06-21 14:30");
//!         assert_eq!(doc.text, "<NE>東京</NE>で会見");
//!     }
//!     other => panic!("{other:?}"),
//! }
//! ```

pub mod job;
pub mod pipeline;
pub mod sink;

pub use job::{run_job, JobReport};
pub use pipeline::{Outcome, Pipeline};
pub use sink::{text_file_name, CsvSink, RecordSink, RecordWriter, TextDirSink};
