//! The seam to the external generative text service.
//!
//! The service itself is out of scope: it is an opaque text-in/JSON-out
//! oracle reached through [`GenerativeService`]. This module owns the wire
//! shapes the transport sends and the distinct transport failure kinds it
//! reports back, so every caller surfaces them the same way.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ingest::FlatRecord;
use crate::model::ScaleNode;

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Failures of the transport collaborator, each surfaced distinctly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("The generative service is unreachable; check the network connection")]
    Offline,

    #[error("The generative service did not answer in time")]
    Timeout,

    #[error("The generative service is rate limiting requests; try again in a moment")]
    RateLimited,

    #[error("The generative service failed with status {status}")]
    Server { status: u16 },

    #[error("The generative service rejected the request with status {status}")]
    Client { status: u16 },
}

/// One source dimension as sent to the oracle: name plus bare item texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDimension {
    pub name: String,
    pub items: Vec<String>,
}

/// Request for a branch adaptation of an existing node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptationRequest {
    pub source_scale_name: String,
    pub source_dimensions: Vec<SourceDimension>,
    /// Free-text description of the desired adaptation, verbatim from the
    /// user ("bahasa Gen-Z", "formal register", ...).
    pub adaptation_intent: String,
}

impl AdaptationRequest {
    pub fn from_node(node: &ScaleNode, intent: impl Into<String>) -> Self {
        Self {
            source_scale_name: node.name.clone(),
            source_dimensions: node
                .dimensions
                .iter()
                .map(|dimension| SourceDimension {
                    name: dimension.name.clone(),
                    items: dimension.items.iter().map(|i| i.text.clone()).collect(),
                })
                .collect(),
            adaptation_intent: intent.into(),
        }
    }
}

/// Request to structure normalized flat records into a root scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuringRequest {
    pub records: Vec<FlatRecord>,
}

/// The external oracle. Implementations live with the transport collaborator
/// (HTTP client, test double, payload files); the engine only awaits them.
///
/// The returned payloads are untrusted and must pass the gates in
/// [`crate::validate`] before anything is built from them.
#[allow(async_fn_in_trait)] // runtime-agnostic by design; no executor is prescribed
pub trait GenerativeService {
    async fn structure_scale(&self, request: &StructuringRequest) -> TransportResult<Value>;

    async fn adapt_scale(&self, request: &AdaptationRequest) -> TransportResult<Value>;
}
