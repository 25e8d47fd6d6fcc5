#![forbid(unsafe_code)]

//! Flat-file adapter for the scale version graph engine.
//!
//! Delimited text goes in, normalized [`FlatRecord`](skala_core::FlatRecord)s
//! come out; export rows go back out as delimited text. The adapter owns all
//! delimiter sensitivity and column guessing so the core never sees raw file
//! contents.
//!
//! Ingest and export are deliberately asymmetric: an exported file fed back
//! in is parsed like any other source material and re-derives its structure
//! through the pipeline; the rows are never read back as a graph.

mod reader;
mod writer;

pub use reader::{ColumnMap, detect_delimiter, infer_columns, parse_records};
pub use writer::{EXPORT_HEADER, write_rows};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The input contains no usable rows")]
    Empty,

    #[error("Could not locate a text column among {columns} columns")]
    NoTextColumn { columns: usize },
}
