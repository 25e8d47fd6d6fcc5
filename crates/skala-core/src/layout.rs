//! Deterministic branch placement.
//!
//! A branch's canvas position is a pure function of its parent's position,
//! the parent's depth, and the branch's own index. Nothing else: no sibling
//! count, no measured box sizes, no mutation order. That is what allows the
//! result to be frozen forever on the node (`position_locked`): recomputing
//! later, under any collection ordering, reproduces the identical point.

use crate::model::{Position, ScaleNode};

/// Canonical placement of a freshly imported root.
pub const ROOT_POSITION: Position = Position { x: 100.0, y: 250.0 };

/// Placement used when the parent is missing or carries a non-finite
/// position.
pub const FALLBACK_SLOT: BranchSlot = BranchSlot {
    position: Position { x: 100.0, y: 100.0 },
    depth: 1,
    branch_index: 0,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConstants {
    /// Horizontal distance between a parent column and its branch column.
    pub horizontal_step: f64,
    /// Assumed node box height; real rendered heights never feed back in.
    pub estimated_height: f64,
    pub vertical_gap: f64,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            horizontal_step: 550.0,
            estimated_height: 180.0,
            vertical_gap: 24.0,
        }
    }
}

impl LayoutConstants {
    pub fn row_height(&self) -> f64 {
        self.estimated_height + self.vertical_gap
    }
}

/// A computed slot for a new branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchSlot {
    pub position: Position,
    pub depth: u32,
    pub branch_index: u32,
}

/// Computes the slot for branch number `branch_index` under `parent`.
///
/// Branches alternate around the parent's row: index 0 one row above,
/// index 1 one row below, index 2 two rows above, and so on outward.
pub fn next_branch_position(
    parent: Option<&ScaleNode>,
    branch_index: u32,
    constants: &LayoutConstants,
) -> BranchSlot {
    let Some(parent) = parent else {
        return FALLBACK_SLOT;
    };
    if !parent.position.is_finite() {
        return FALLBACK_SLOT;
    }

    let layer = f64::from(branch_index / 2 + 1);
    let direction = if branch_index % 2 == 0 { -1.0 } else { 1.0 };

    BranchSlot {
        position: Position {
            x: parent.position.x + constants.horizontal_step,
            y: parent.position.y + direction * layer * constants.row_height(),
        },
        depth: parent.depth + 1,
        branch_index,
    }
}
