//! Flat export rows.
//!
//! The export is one-way by design: re-ingesting an exported file parses it
//! as fresh source material and re-derives structure through the pipeline; it
//! never reconstructs the graph from these rows.

use serde::Serialize;

use crate::graph::NodeMap;

/// Separator for rubric tags within a single cell.
pub const RUBRIC_JOIN: &str = ";";

/// One exported item row. `parent_scale_id` is empty for the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub scale_id: String,
    pub scale_name: String,
    pub parent_scale_id: String,
    pub dimension_name: String,
    pub item_id: String,
    pub origin_item_id: String,
    pub item_text: String,
    pub baseline_rubric: String,
    pub current_rubric: String,
}

/// Flattens every node into rows: nodes in collection order, dimensions and
/// items in their stored order.
pub fn export_rows(nodes: &NodeMap) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for node in nodes.values() {
        for dimension in &node.dimensions {
            for item in &dimension.items {
                rows.push(ExportRow {
                    scale_id: node.id.clone(),
                    scale_name: node.name.clone(),
                    parent_scale_id: node.parent_id().unwrap_or("").to_string(),
                    dimension_name: dimension.name.clone(),
                    item_id: item.item_id.clone(),
                    origin_item_id: item.origin_item_id.clone(),
                    item_text: item.text.clone(),
                    baseline_rubric: item.baseline_rubric.join(RUBRIC_JOIN),
                    current_rubric: item.current_rubric.join(RUBRIC_JOIN),
                });
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dimension, Item, Placement, Position, RubricSource, ScaleNode};

    fn item(id: &str, tags: &[&str]) -> Item {
        Item {
            item_id: id.to_string(),
            origin_item_id: id.to_string(),
            text: format!("text {id}"),
            baseline_rubric: tags.iter().map(|t| t.to_string()).collect(),
            current_rubric: tags.iter().map(|t| t.to_string()).collect(),
            rubric_source: RubricSource::Generated,
        }
    }

    #[test]
    fn rows_flatten_the_family_in_order() {
        let mut nodes = NodeMap::new();
        let root = ScaleNode::root(
            "root",
            "Skala Asli",
            Position::new(100.0, 250.0),
            vec![Dimension {
                name: "Ekstraversi".to_string(),
                items: vec![item("root-item-1", &["sociable", "warm"])],
            }],
        );
        let branch = ScaleNode {
            id: "b".to_string(),
            name: "Skala Gen-Z".to_string(),
            placement: Placement::Branch {
                parent_id: "root".to_string(),
                branch_index: 0,
            },
            depth: 1,
            position: Position::new(650.0, 46.0),
            collapsed: false,
            dimensions: vec![Dimension {
                name: "Ekstraversi".to_string(),
                items: vec![item("b-item-1", &[])],
            }],
        };
        nodes.insert(root.id.clone(), root);
        nodes.insert(branch.id.clone(), branch);

        let rows = export_rows(&nodes);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].scale_id, "root");
        assert_eq!(rows[0].parent_scale_id, "");
        assert_eq!(rows[0].baseline_rubric, "sociable;warm");

        assert_eq!(rows[1].scale_id, "b");
        assert_eq!(rows[1].parent_scale_id, "root");
        assert_eq!(rows[1].current_rubric, "");
    }
}
