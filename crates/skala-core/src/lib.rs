#![forbid(unsafe_code)]

//! Scale version graph engine (headless).
//!
//! Manages versioned definitions of a psychometric assessment instrument: a
//! root definition plus a tree of derived adaptations, each produced with
//! help from an external generative text service and tracked for semantic
//! drift against its ancestry.
//!
//! Design goals:
//! - structural invariants enforced at one gateway (the store); everything
//!   else reads only
//! - deterministic, reproducible branch layout (position is a pure function
//!   of parent and branch index)
//! - untrusted oracle output gated before anything is built from it
//! - runtime-agnostic async APIs (no specific executor required)

pub mod adapt;
pub mod assemble;
pub mod engine;
pub mod error;
pub mod export;
pub mod graph;
pub mod ingest;
pub mod layout;
pub mod model;
pub mod store;
pub mod validate;

pub use adapt::{
    AdaptationRequest, GenerativeService, SourceDimension, StructuringRequest, TransportError,
};
pub use engine::{BranchOutcome, BranchTicket, Engine};
pub use error::{Error, Result};
pub use export::ExportRow;
pub use ingest::FlatRecord;
pub use layout::{BranchSlot, LayoutConstants, ROOT_POSITION};
pub use model::{Dimension, Item, Placement, Position, RubricSource, ScaleNode};
pub use store::{ItemEdit, NodePatch, ScaleStore, StoreEvent, StoreObserver, StoreOptions};
pub use validate::{
    AdaptedDimension, AdaptedItem, AdaptedScale, StructuralWarning, StructuredDimension,
    StructuredItem, StructuredScale, StructuringReview,
};
