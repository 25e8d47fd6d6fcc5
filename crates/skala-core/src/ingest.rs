//! Normalized ingest records.
//!
//! The flat-file adapter (a separate crate) turns delimited text into
//! [`FlatRecord`]s; the engine sends them to the oracle for structuring. When
//! every record already carries a dimension label, no oracle round trip is
//! needed and [`structure_labeled_records`] groups them deterministically.

use serde::{Deserialize, Serialize};

use crate::validate::{StructuredDimension, StructuredItem, StructuredScale};

/// One normalized row of ingested source material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub id: String,
    /// Dimension label, when the source material had one.
    pub dimension: Option<String>,
    pub text: String,
}

/// Groups fully labeled records into a structured scale without consulting
/// the oracle.
///
/// Dimension order follows first appearance; item order within a dimension
/// follows record order. Returns `None` when the records are empty or any
/// record lacks a label; those inputs need the oracle's structuring pass.
pub fn structure_labeled_records(
    scale_name: &str,
    records: &[FlatRecord],
) -> Option<StructuredScale> {
    if records.is_empty() {
        return None;
    }

    let mut dimensions: Vec<StructuredDimension> = Vec::new();
    for record in records {
        let label = record.dimension.as_deref()?;
        let item = StructuredItem {
            text: record.text.clone(),
            rubric: Vec::new(),
        };
        match dimensions.iter_mut().find(|d| d.name == label) {
            Some(dimension) => dimension.items.push(item),
            None => dimensions.push(StructuredDimension {
                name: label.to_string(),
                items: vec![item],
            }),
        }
    }

    Some(StructuredScale {
        scale_name: scale_name.to_string(),
        dimensions,
    })
}
