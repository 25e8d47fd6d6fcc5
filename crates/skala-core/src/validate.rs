//! Gates for externally-generated payloads.
//!
//! The generative service is an opaque text-in/JSON-out oracle; nothing it
//! returns is trusted. Both gates hand-walk the raw `serde_json::Value` and
//! reject on the first shape violation with a diagnostic naming the exact
//! field path, so the UI can show "dimensions[1].items[0].text" instead of
//! "invalid response". Only after a payload passes a gate is anything built
//! from it.

use std::fmt;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::ScaleNode;

/// One adapted statement as supplied by the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptedItem {
    pub text: String,
    /// Fresh semantic tags, when the oracle supplied any. Empty means "not
    /// supplied": the assembler falls back to the source baseline.
    pub current_rubric: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptedDimension {
    pub name: String,
    pub items: Vec<AdaptedItem>,
}

/// A validated adaptation payload. Construction goes through
/// [`validate_adaptation`] only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptedScale {
    pub scale_name: String,
    pub dimensions: Vec<AdaptedDimension>,
}

/// One statement of a freshly structured (root) scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredItem {
    pub text: String,
    pub rubric: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredDimension {
    pub name: String,
    pub items: Vec<StructuredItem>,
}

/// A validated structuring payload for the ingest path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredScale {
    pub scale_name: String,
    pub dimensions: Vec<StructuredDimension>,
}

/// Outcome of the ingest sanity gate: the oracle may short-circuit the whole
/// pipeline by declaring the input not to be a scale at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuringReview {
    Accepted(StructuredScale),
    Rejected { reason: String },
}

/// Non-fatal structural drift between an adaptation and its source node.
/// Drift is suspicious, not disqualifying; a human stays the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralWarning {
    DimensionCountDrift { expected: usize, got: usize },
    ItemCountDrift {
        dimension: String,
        expected: usize,
        got: usize,
    },
}

impl fmt::Display for StructuralWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralWarning::DimensionCountDrift { expected, got } => write!(
                f,
                "adaptation has {got} dimensions where the source has {expected}"
            ),
            StructuralWarning::ItemCountDrift {
                dimension,
                expected,
                got,
            } => write!(
                f,
                "dimension \"{dimension}\" has {got} items where the source has {expected}"
            ),
        }
    }
}

fn adaptation_error(field: impl Into<String>, message: impl Into<String>) -> Error {
    Error::InvalidAdaptation {
        field: field.into(),
        message: message.into(),
    }
}

fn structuring_error(field: impl Into<String>, message: impl Into<String>) -> Error {
    Error::InvalidStructuring {
        field: field.into(),
        message: message.into(),
    }
}

fn non_empty_str<'a>(
    value: &'a Value,
    field: &str,
    err: fn(&str, &str) -> Error,
) -> Result<&'a str> {
    let Some(s) = value.as_str() else {
        return Err(err(field, "expected a string"));
    };
    if s.trim().is_empty() {
        return Err(err(field, "must not be empty"));
    }
    Ok(s)
}

fn string_list(value: &Value, field: &str, err: fn(&str, &str) -> Error) -> Result<Vec<String>> {
    let Some(entries) = value.as_array() else {
        return Err(err(field, "expected a list of tag strings"));
    };
    let mut out = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let Some(tag) = entry.as_str() else {
            return Err(err(&format!("{field}[{i}]"), "expected a tag string"));
        };
        out.push(tag.to_string());
    }
    Ok(out)
}

// Wrappers keep `fn(&str, &str) -> Error` passable as a plain fn pointer.
fn adapt_err(field: &str, message: &str) -> Error {
    adaptation_error(field, message)
}

fn structure_err(field: &str, message: &str) -> Error {
    structuring_error(field, message)
}

fn parse_dimensions<T>(
    payload: &Value,
    err: fn(&str, &str) -> Error,
    mut build_item: impl FnMut(&Value, &str) -> Result<T>,
) -> Result<Vec<(String, Vec<T>)>> {
    let Some(dimensions) = payload.get("dimensions") else {
        return Err(err("dimensions", "missing required field"));
    };
    let Some(dimensions) = dimensions.as_array() else {
        return Err(err("dimensions", "expected a list"));
    };
    if dimensions.is_empty() {
        return Err(err("dimensions", "must not be empty"));
    }

    let mut out = Vec::with_capacity(dimensions.len());
    for (d, dimension) in dimensions.iter().enumerate() {
        let path = format!("dimensions[{d}]");
        if !dimension.is_object() {
            return Err(err(&path, "expected an object"));
        }
        let name = match dimension.get("name") {
            Some(name) => non_empty_str(name, &format!("{path}.name"), err)?,
            None => return Err(err(&format!("{path}.name"), "missing required field")),
        };

        let Some(items) = dimension.get("items") else {
            return Err(err(&format!("{path}.items"), "missing required field"));
        };
        let Some(items) = items.as_array() else {
            return Err(err(&format!("{path}.items"), "expected a list"));
        };
        if items.is_empty() {
            return Err(err(&format!("{path}.items"), "must not be empty"));
        }

        let mut built = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{path}.items[{i}]");
            if !item.is_object() {
                return Err(err(&item_path, "expected an object"));
            }
            built.push(build_item(item, &item_path)?);
        }
        out.push((name.to_string(), built));
    }
    Ok(out)
}

/// Validates a raw adaptation payload against the required shape, comparing
/// its structure to `source` for non-fatal drift warnings.
///
/// Any missing or mistyped required field is a hard rejection: the caller
/// must not proceed to assembly. Count drift against the source is returned
/// (and logged) but never blocks.
pub fn validate_adaptation(
    payload: &Value,
    source: &ScaleNode,
) -> Result<(AdaptedScale, Vec<StructuralWarning>)> {
    if !payload.is_object() {
        return Err(adaptation_error("$", "expected a JSON object"));
    }

    let scale_name = match payload.get("scale_name") {
        Some(name) => non_empty_str(name, "scale_name", adapt_err)?.to_string(),
        None => return Err(adaptation_error("scale_name", "missing required field")),
    };

    let dimensions = parse_dimensions(payload, adapt_err, |item, item_path| {
        let text = match item.get("text") {
            Some(text) => non_empty_str(text, &format!("{item_path}.text"), adapt_err)?,
            None => {
                return Err(adaptation_error(
                    format!("{item_path}.text"),
                    "missing required field",
                ));
            }
        };
        let current_rubric = match item.get("current_rubric") {
            Some(tags) => string_list(tags, &format!("{item_path}.current_rubric"), adapt_err)?,
            None => Vec::new(),
        };
        Ok(AdaptedItem {
            text: text.to_string(),
            current_rubric,
        })
    })?;

    let adapted = AdaptedScale {
        scale_name,
        dimensions: dimensions
            .into_iter()
            .map(|(name, items)| AdaptedDimension { name, items })
            .collect(),
    };

    let mut warnings = Vec::new();
    if adapted.dimensions.len() != source.dimensions.len() {
        warnings.push(StructuralWarning::DimensionCountDrift {
            expected: source.dimensions.len(),
            got: adapted.dimensions.len(),
        });
    }
    for (dimension, source_dimension) in adapted.dimensions.iter().zip(source.dimensions.iter()) {
        if dimension.items.len() != source_dimension.items.len() {
            warnings.push(StructuralWarning::ItemCountDrift {
                dimension: dimension.name.clone(),
                expected: source_dimension.items.len(),
                got: dimension.items.len(),
            });
        }
    }
    for warning in &warnings {
        tracing::warn!(scale = %adapted.scale_name, "structural drift: {warning}");
    }

    Ok((adapted, warnings))
}

/// Validates a raw structuring payload from the ingest path.
///
/// The oracle reviews whether the input is a legitimate scale at all before
/// structuring it; `is_scale: false` short-circuits with its reason and no
/// structure is required alongside it.
pub fn validate_structuring(payload: &Value) -> Result<StructuringReview> {
    if !payload.is_object() {
        return Err(structuring_error("$", "expected a JSON object"));
    }

    let Some(is_scale) = payload.get("is_scale") else {
        return Err(structuring_error("is_scale", "missing required field"));
    };
    let Some(is_scale) = is_scale.as_bool() else {
        return Err(structuring_error("is_scale", "expected a boolean"));
    };

    if !is_scale {
        let reason = payload
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("the input does not look like a measurement scale")
            .to_string();
        return Ok(StructuringReview::Rejected { reason });
    }

    let scale_name = match payload.get("scale_name") {
        Some(name) => non_empty_str(name, "scale_name", structure_err)?.to_string(),
        None => return Err(structuring_error("scale_name", "missing required field")),
    };

    let dimensions = parse_dimensions(payload, structure_err, |item, item_path| {
        let text = match item.get("text") {
            Some(text) => non_empty_str(text, &format!("{item_path}.text"), structure_err)?,
            None => {
                return Err(structuring_error(
                    format!("{item_path}.text"),
                    "missing required field",
                ));
            }
        };
        let rubric = match item.get("rubric") {
            Some(tags) => string_list(tags, &format!("{item_path}.rubric"), structure_err)?,
            None => Vec::new(),
        };
        Ok(StructuredItem {
            text: text.to_string(),
            rubric,
        })
    })?;

    Ok(StructuringReview::Accepted(StructuredScale {
        scale_name,
        dimensions: dimensions
            .into_iter()
            .map(|(name, items)| StructuredDimension { name, items })
            .collect(),
    }))
}
