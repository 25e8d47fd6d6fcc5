#![forbid(unsafe_code)]

//! `skala` manages versioned definitions of a psychometric assessment
//! instrument: one root definition plus a tree of derived adaptations, each
//! produced with help from an external generative text service and tracked
//! for semantic drift against its ancestry.
//!
//! # Features
//!
//! - `flat`: enable the flat-file adapter (`skala::flat`) for delimiter-
//!   detecting ingest and flat export writing

pub use skala_core::*;

#[cfg(feature = "flat")]
pub mod flat {
    pub use skala_flat::{
        ColumnMap, EXPORT_HEADER, Error, Result, detect_delimiter, infer_columns, parse_records,
        write_rows,
    };
}
