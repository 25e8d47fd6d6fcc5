//! Read-only structural queries over the node collection.
//!
//! Every function here is pure: no mutation, no failure. Unknown ids yield
//! empty results so render code can query freely while the store mutates
//! elsewhere. The collection is insertion-ordered (`IndexMap`), and none of
//! the results depend on that order beyond the ordering of returned lists.

use std::collections::VecDeque;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::model::ScaleNode;

/// The node collection. Owned by the store; queries only borrow it.
pub type NodeMap = IndexMap<String, ScaleNode>;

/// Direct children of `parent_id`, in collection order.
pub fn children<'a>(nodes: &'a NodeMap, parent_id: &str) -> Vec<&'a ScaleNode> {
    nodes
        .values()
        .filter(|n| n.parent_id() == Some(parent_id))
        .collect()
}

/// Every transitive child of `root_id`, breadth-first, excluding `root_id`
/// itself.
pub fn descendants(nodes: &NodeMap, root_id: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(root_id);
    while let Some(current) = queue.pop_front() {
        for child in children(nodes, current) {
            out.push(child.id.clone());
            queue.push_back(&child.id);
        }
    }
    out
}

/// The set removed by a cascade delete of `target_id`: the target plus every
/// transitive descendant.
///
/// Grown by fixed-point iteration over full collection scans. The result is
/// independent of the collection's iteration order: each pass only tests
/// membership of `parent_id` in the set built so far, and passes repeat until
/// a full scan adds nothing.
pub fn cascade_delete_set(nodes: &NodeMap, target_id: &str) -> Vec<String> {
    if !nodes.contains_key(target_id) {
        return Vec::new();
    }

    let mut ordered = vec![target_id.to_string()];
    let mut members: FxHashSet<&str> = FxHashSet::default();
    members.insert(target_id);

    loop {
        let mut grew = false;
        for node in nodes.values() {
            if members.contains(node.id.as_str()) {
                continue;
            }
            let Some(parent) = node.parent_id() else {
                continue;
            };
            if members.contains(parent) {
                members.insert(node.id.as_str());
                ordered.push(node.id.clone());
                grew = true;
            }
        }
        if !grew {
            break;
        }
    }

    ordered
}

/// All root nodes. A well-formed family has exactly one; the store enforces
/// that, this query does not assume it.
pub fn roots(nodes: &NodeMap) -> Vec<&ScaleNode> {
    nodes.values().filter(|n| n.is_root()).collect()
}

/// The first root found, if any.
pub fn root(nodes: &NodeMap) -> Option<&ScaleNode> {
    nodes.values().find(|n| n.is_root())
}

/// The parent node of `id`, if `id` is a branch whose parent is present.
pub fn parent<'a>(nodes: &'a NodeMap, id: &str) -> Option<&'a ScaleNode> {
    let node = nodes.get(id)?;
    nodes.get(node.parent_id()?)
}

/// Nodes sharing `id`'s parent, excluding `id` itself. Empty for the root
/// and for unknown ids.
pub fn siblings<'a>(nodes: &'a NodeMap, id: &str) -> Vec<&'a ScaleNode> {
    let Some(parent_id) = nodes.get(id).and_then(|n| n.parent_id()) else {
        return Vec::new();
    };
    nodes
        .values()
        .filter(|n| n.id != id && n.parent_id() == Some(parent_id))
        .collect()
}

/// Number of direct branches under `parent_id`, optionally restricted to
/// child ids starting with `id_prefix`.
pub fn branch_count(nodes: &NodeMap, parent_id: &str, id_prefix: Option<&str>) -> usize {
    children(nodes, parent_id)
        .into_iter()
        .filter(|n| id_prefix.is_none_or(|p| n.id.starts_with(p)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Placement, Position, ScaleNode};

    fn root_node(id: &str) -> ScaleNode {
        ScaleNode::root(id, id, Position::new(100.0, 250.0), vec![])
    }

    fn branch(id: &str, parent: &str, index: u32, depth: u32) -> ScaleNode {
        ScaleNode {
            id: id.to_string(),
            name: id.to_string(),
            placement: Placement::Branch {
                parent_id: parent.to_string(),
                branch_index: index,
            },
            depth,
            position: Position::new(0.0, 0.0),
            collapsed: false,
            dimensions: vec![],
        }
    }

    /// root -> a -> b -> c, plus a second child of root.
    fn family() -> NodeMap {
        let mut nodes = NodeMap::new();
        for node in [
            root_node("root"),
            branch("a", "root", 0, 1),
            branch("b", "a", 0, 2),
            branch("c", "b", 0, 3),
            branch("d", "root", 1, 1),
        ] {
            nodes.insert(node.id.clone(), node);
        }
        nodes
    }

    fn reversed(nodes: &NodeMap) -> NodeMap {
        let mut out = NodeMap::new();
        for node in nodes.values().rev() {
            out.insert(node.id.clone(), node.clone());
        }
        out
    }

    #[test]
    fn children_of_root() {
        let nodes = family();
        let ids: Vec<&str> = children(&nodes, "root").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["a", "d"]);
    }

    #[test]
    fn children_of_unknown_id_is_empty() {
        let nodes = family();
        assert!(children(&nodes, "nope").is_empty());
        assert!(descendants(&nodes, "nope").is_empty());
        assert!(siblings(&nodes, "nope").is_empty());
        assert!(cascade_delete_set(&nodes, "nope").is_empty());
    }

    #[test]
    fn descendants_is_breadth_first_and_excludes_self() {
        let nodes = family();
        assert_eq!(descendants(&nodes, "root"), ["a", "d", "b", "c"]);
        assert_eq!(descendants(&nodes, "a"), ["b", "c"]);
        assert!(descendants(&nodes, "c").is_empty());
    }

    #[test]
    fn cascade_set_on_chain_is_exactly_the_subtree() {
        let nodes = family();
        let set = cascade_delete_set(&nodes, "a");
        assert_eq!(set, ["a", "b", "c"]);
    }

    #[test]
    fn cascade_set_is_iteration_order_independent() {
        let nodes = family();
        let forward = cascade_delete_set(&nodes, "a");
        let mut forward_sorted = forward.clone();
        forward_sorted.sort();

        let mut backward = cascade_delete_set(&reversed(&nodes), "a");
        backward.sort();
        assert_eq!(forward_sorted, backward);
    }

    #[test]
    fn cascade_set_of_leaf_is_just_the_leaf() {
        let nodes = family();
        assert_eq!(cascade_delete_set(&nodes, "d"), ["d"]);
    }

    #[test]
    fn roots_and_root() {
        let nodes = family();
        assert_eq!(roots(&nodes).len(), 1);
        assert_eq!(root(&nodes).unwrap().id, "root");
        assert!(root(&NodeMap::new()).is_none());
    }

    #[test]
    fn parent_and_siblings() {
        let nodes = family();
        assert_eq!(parent(&nodes, "b").unwrap().id, "a");
        assert!(parent(&nodes, "root").is_none());

        let sibs: Vec<&str> = siblings(&nodes, "a").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(sibs, ["d"]);
        assert!(siblings(&nodes, "root").is_empty());
    }

    #[test]
    fn branch_count_with_prefix_filter() {
        let nodes = family();
        assert_eq!(branch_count(&nodes, "root", None), 2);
        assert_eq!(branch_count(&nodes, "root", Some("a")), 1);
        assert_eq!(branch_count(&nodes, "root", Some("z")), 0);
    }
}
