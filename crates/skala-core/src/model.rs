//! Node, dimension, and item types of the scale version graph.
//!
//! A family is one root definition plus a tree of derived branches. Lineage
//! fields (`placement`, `depth`, `position` of a branch, item baselines) are
//! fixed at construction: no mutator exists for them, so the immutability
//! invariants hold by construction rather than by runtime checking.

use serde::{Deserialize, Serialize};

/// Canvas coordinates of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Where a node sits in the family tree.
///
/// `Branch` carries the lineage fields that the flat representation kept as
/// loose optional fields (`parent_id`, `branch_index`); a branch without them
/// is unrepresentable, and `position_locked` becomes the derived fact
/// "not the root".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    Root,
    Branch { parent_id: String, branch_index: u32 },
}

/// Provenance of an item's current rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RubricSource {
    #[serde(rename = "externally-generated")]
    Generated,
    #[serde(rename = "inherited-from-parent")]
    Inherited,
    #[serde(rename = "manually-edited")]
    Manual,
}

/// One self-report statement with its semantic lineage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique within the owning node.
    pub item_id: String,
    /// The positionally corresponding ancestor item, traced transitively
    /// toward the root. Root items reference themselves.
    pub origin_item_id: String,
    pub text: String,
    /// Semantic tags inherited at creation. Never reassigned afterwards.
    pub baseline_rubric: Vec<String>,
    /// The present tags; may diverge from the baseline over the node's life.
    pub current_rubric: Vec<String>,
    pub rubric_source: RubricSource,
}

impl Item {
    /// Display fact only: whether the current rubric still matches the
    /// baseline. Divergence is suspicious, not invalid.
    pub fn rubric_in_sync(&self) -> bool {
        self.current_rubric == self.baseline_rubric
    }
}

/// A named group of items within a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub items: Vec<Item>,
}

/// One versioned definition of the assessment instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleNode {
    pub id: String,
    pub name: String,
    pub placement: Placement,
    /// 0 for the root, parent depth + 1 otherwise.
    pub depth: u32,
    pub position: Position,
    /// UI expand/collapse flag, shallow-merged via the store's update.
    pub collapsed: bool,
    pub dimensions: Vec<Dimension>,
}

impl ScaleNode {
    /// Builds a root node. Branches are only ever built by the assembler.
    pub fn root(
        id: impl Into<String>,
        name: impl Into<String>,
        position: Position,
        dimensions: Vec<Dimension>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            placement: Placement::Root,
            depth: 0,
            position,
            collapsed: false,
            dimensions,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.placement, Placement::Root)
    }

    pub fn parent_id(&self) -> Option<&str> {
        match &self.placement {
            Placement::Root => None,
            Placement::Branch { parent_id, .. } => Some(parent_id),
        }
    }

    pub fn branch_index(&self) -> Option<u32> {
        match &self.placement {
            Placement::Root => None,
            Placement::Branch { branch_index, .. } => Some(*branch_index),
        }
    }

    /// Branch positions are computed once and frozen; only the root may be
    /// dragged by the presentation layer.
    pub fn position_locked(&self) -> bool {
        !self.is_root()
    }

    pub fn item_count(&self) -> usize {
        self.dimensions.iter().map(|d| d.items.len()).sum()
    }

    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.dimensions
            .iter()
            .flat_map(|d| d.items.iter())
            .find(|i| i.item_id == item_id)
    }
}
