//! The single authorized mutation gateway for the node collection.
//!
//! Every structural change to a family goes through [`ScaleStore`]; all other
//! components only ever borrow the collection read-only. The store owns the
//! "currently active node" reference and a post-commit observer list, the
//! seam where persistence, undo, or a minimap would subscribe instead of
//! being wired into the gateway itself.

use std::fmt;

use crate::error::{Error, Result};
use crate::graph::{self, NodeMap};
use crate::model::{Item, RubricSource, ScaleNode};

/// Validation mode for [`ScaleStore::add`].
///
/// Strict is the default. Relaxed admits any node unchecked; it exists for
/// bulk restores of already-trusted data and is not a recommended default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub strict: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::strict()
    }
}

impl StoreOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn relaxed() -> Self {
        Self { strict: false }
    }
}

/// Fired after a mutation has landed in the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Added { id: String },
    Removed { ids: Vec<String> },
    Updated { id: String },
    Cleared,
}

pub type StoreObserver = Box<dyn Fn(&StoreEvent) + Send>;

/// A single edit applied to an item through [`ScaleStore::update`].
///
/// Only the two mutable item fields are reachable: text and the current
/// rubric. Lineage fields have no edit variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEdit {
    Text {
        item_id: String,
        text: String,
    },
    Rubric {
        item_id: String,
        tags: Vec<String>,
        source: RubricSource,
    },
}

/// Partial node update, shallow-merged by [`ScaleStore::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub collapsed: Option<bool>,
    pub item_edits: Vec<ItemEdit>,
}

fn item_mut<'a>(node: &'a mut ScaleNode, item_id: &str) -> Option<&'a mut Item> {
    node.dimensions
        .iter_mut()
        .flat_map(|d| d.items.iter_mut())
        .find(|item| item.item_id == item_id)
}

pub struct ScaleStore {
    nodes: NodeMap,
    active: Option<String>,
    options: StoreOptions,
    observers: Vec<StoreObserver>,
}

impl fmt::Debug for ScaleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScaleStore")
            .field("nodes", &self.nodes.len())
            .field("active", &self.active)
            .field("options", &self.options)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for ScaleStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

impl ScaleStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            nodes: NodeMap::new(),
            active: None,
            options,
            observers: Vec::new(),
        }
    }

    /// Read-only view of the collection, in insertion order.
    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    pub fn get(&self, id: &str) -> Option<&ScaleNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Registers a post-commit observer. Observers run synchronously, after
    /// the mutation has landed, in subscription order.
    pub fn subscribe(&mut self, observer: StoreObserver) {
        self.observers.push(observer);
    }

    fn notify(&self, event: &StoreEvent) {
        for observer in &self.observers {
            observer(event);
        }
    }

    /// Admits a node into the collection.
    ///
    /// In strict mode the node's shape is validated first and a rejection
    /// names the offending field; in relaxed mode the node is admitted
    /// unchecked.
    pub fn add(&mut self, node: ScaleNode) -> Result<()> {
        if self.options.strict {
            self.validate_for_add(&node)?;
        }
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        tracing::debug!(%id, total = self.nodes.len(), "node added");
        self.notify(&StoreEvent::Added { id });
        Ok(())
    }

    fn validate_for_add(&self, node: &ScaleNode) -> Result<()> {
        fn reject(field: &str, message: impl Into<String>) -> Result<()> {
            Err(Error::InvalidNode {
                field: field.to_string(),
                message: message.into(),
            })
        }

        if node.id.trim().is_empty() {
            return reject("id", "must not be empty");
        }
        if self.nodes.contains_key(&node.id) {
            return reject("id", format!("duplicate id \"{}\"", node.id));
        }
        if node.name.trim().is_empty() {
            return reject("name", "must not be empty");
        }
        if node.dimensions.is_empty() {
            return reject("dimensions", "a scale node needs at least one dimension");
        }
        if !node.position.is_finite() {
            return reject("position", "coordinates must be finite numbers");
        }

        match node.parent_id() {
            None => {
                if node.depth != 0 {
                    return reject("depth", "the root sits at depth 0");
                }
                if graph::root(&self.nodes).is_some() {
                    return reject(
                        "placement",
                        "the family already has a root; clear the collection before importing another",
                    );
                }
            }
            Some(parent_id) => {
                let Some(parent) = self.nodes.get(parent_id) else {
                    return reject(
                        "parent_id",
                        format!("references \"{parent_id}\", which is not in the collection"),
                    );
                };
                if node.depth != parent.depth + 1 {
                    return reject("depth", "a branch sits one level below its parent");
                }
            }
        }

        Ok(())
    }

    /// Removes a single node. Unknown ids are a no-op; the root is refused.
    /// A matching active selection is cleared.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let Some(node) = self.nodes.get(id) else {
            return Ok(false);
        };
        if node.is_root() {
            return Err(Error::RootProtected);
        }
        self.nodes.shift_remove(id);
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        tracing::debug!(%id, "node removed");
        self.notify(&StoreEvent::Removed {
            ids: vec![id.to_string()],
        });
        Ok(true)
    }

    /// Removes a whole cascade set in one committed step.
    ///
    /// The set is expected to be the output of
    /// [`graph::cascade_delete_set`]; a set containing the root is refused
    /// before anything is removed, so the collection is never left with a
    /// partial subtree.
    pub fn remove_cascade(&mut self, ids: &[String]) -> Result<usize> {
        if ids
            .iter()
            .any(|id| self.nodes.get(id).is_some_and(ScaleNode::is_root))
        {
            return Err(Error::RootProtected);
        }

        let mut removed = Vec::new();
        for id in ids {
            if self.nodes.shift_remove(id).is_some() {
                removed.push(id.clone());
            }
        }
        if removed.is_empty() {
            return Ok(0);
        }
        if self
            .active
            .as_ref()
            .is_some_and(|active| removed.contains(active))
        {
            self.active = None;
        }
        tracing::debug!(count = removed.len(), "cascade removed");
        let count = removed.len();
        self.notify(&StoreEvent::Removed { ids: removed });
        Ok(count)
    }

    /// Shallow-merges `patch` into an existing node. Unknown node ids are a
    /// no-op; unknown item ids within the patch are skipped.
    pub fn update(&mut self, id: &str, patch: NodePatch) -> Result<bool> {
        let Some(node) = self.nodes.get_mut(id) else {
            return Ok(false);
        };

        if let Some(collapsed) = patch.collapsed {
            node.collapsed = collapsed;
        }
        for edit in patch.item_edits {
            match edit {
                ItemEdit::Text { item_id, text } => match item_mut(node, &item_id) {
                    Some(item) => item.text = text,
                    None => tracing::debug!(%id, %item_id, "patch skipped an unknown item"),
                },
                ItemEdit::Rubric {
                    item_id,
                    tags,
                    source,
                } => match item_mut(node, &item_id) {
                    Some(item) => {
                        item.current_rubric = tags;
                        item.rubric_source = source;
                    }
                    None => tracing::debug!(%id, %item_id, "patch skipped an unknown item"),
                },
            }
        }

        self.notify(&StoreEvent::Updated { id: id.to_string() });
        Ok(true)
    }

    /// Empties the collection. Invoked when a new root import replaces the
    /// whole family.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.active = None;
        self.notify(&StoreEvent::Cleared);
    }

    /// Moves the active selection. `None` deselects; an unknown id is
    /// refused.
    pub fn set_active(&mut self, id: Option<&str>) -> Result<()> {
        match id {
            None => {
                self.active = None;
                Ok(())
            }
            Some(id) => {
                if !self.nodes.contains_key(id) {
                    return Err(Error::UnknownNode { id: id.to_string() });
                }
                self.active = Some(id.to_string());
                Ok(())
            }
        }
    }
}
