//! Pure construction of fully populated nodes.
//!
//! The assemblers never touch the store and never call the oracle: they take
//! a validated payload plus a computed slot and return a complete node for
//! the store to admit. Identical inputs always produce identical nodes.

use crate::layout::BranchSlot;
use crate::model::{Dimension, Item, Placement, Position, RubricSource, ScaleNode};
use crate::validate::{AdaptedScale, StructuredScale};

/// Builds a branch node from a validated adaptation of `source`.
///
/// Dimension and item correspondence with the source is positional, not
/// name-based. Item ids are `"{new_id}-item-{n}"` with `n` counting across
/// the whole node, never resetting per dimension. Where the adaptation has
/// more items than the source at some position, the extra items carry the
/// literal origin `"unknown"` and an empty baseline.
pub fn assemble_branch(
    adapted: &AdaptedScale,
    source: &ScaleNode,
    slot: BranchSlot,
    new_id: &str,
) -> ScaleNode {
    let mut counter = 0usize;
    let mut dimensions = Vec::with_capacity(adapted.dimensions.len());

    for (d, dimension) in adapted.dimensions.iter().enumerate() {
        let source_items = source.dimensions.get(d).map(|s| s.items.as_slice());
        let mut items = Vec::with_capacity(dimension.items.len());

        for (i, item) in dimension.items.iter().enumerate() {
            counter += 1;
            let source_item = source_items.and_then(|s| s.get(i));

            let origin_item_id = match source_item {
                Some(origin) => origin.item_id.clone(),
                None => "unknown".to_string(),
            };
            let baseline_rubric = source_item
                .map(|origin| origin.baseline_rubric.clone())
                .unwrap_or_default();
            let (current_rubric, rubric_source) = if item.current_rubric.is_empty() {
                (baseline_rubric.clone(), RubricSource::Inherited)
            } else {
                (item.current_rubric.clone(), RubricSource::Generated)
            };

            items.push(Item {
                item_id: format!("{new_id}-item-{counter}"),
                origin_item_id,
                text: item.text.clone(),
                baseline_rubric,
                current_rubric,
                rubric_source,
            });
        }

        dimensions.push(Dimension {
            name: dimension.name.clone(),
            items,
        });
    }

    ScaleNode {
        id: new_id.to_string(),
        name: adapted.scale_name.clone(),
        placement: Placement::Branch {
            parent_id: source.id.clone(),
            branch_index: slot.branch_index,
        },
        depth: slot.depth,
        position: slot.position,
        collapsed: false,
        dimensions,
    }
}

/// Builds the root node of a fresh family from a validated structuring
/// result. Root items are their own origin, and the oracle's tags seed both
/// rubric generations.
pub fn assemble_root(structured: &StructuredScale, id: &str, position: Position) -> ScaleNode {
    let mut counter = 0usize;
    let mut dimensions = Vec::with_capacity(structured.dimensions.len());

    for dimension in &structured.dimensions {
        let mut items = Vec::with_capacity(dimension.items.len());
        for item in &dimension.items {
            counter += 1;
            let item_id = format!("{id}-item-{counter}");
            items.push(Item {
                origin_item_id: item_id.clone(),
                item_id,
                text: item.text.clone(),
                baseline_rubric: item.rubric.clone(),
                current_rubric: item.rubric.clone(),
                rubric_source: RubricSource::Generated,
            });
        }
        dimensions.push(Dimension {
            name: dimension.name.clone(),
            items,
        });
    }

    ScaleNode::root(id, structured.scale_name.clone(), position, dimensions)
}
