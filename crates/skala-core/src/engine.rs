//! Thin orchestration over the store: validate → assemble → commit.
//!
//! The engine owns the store and sequences every pipeline. External oracle
//! calls are the only suspension points; each operation class holds its own
//! in-progress guard for their duration (a second attempt is rejected, not
//! queued), and a structural generation counter is captured when a call
//! starts and revalidated when its result comes back, so a result that
//! outlived the graph it was computed against is discarded instead of
//! applied. Guards are released by drop, on every exit path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use uuid::Uuid;

use crate::adapt::{AdaptationRequest, GenerativeService, StructuringRequest};
use crate::assemble::{assemble_branch, assemble_root};
use crate::error::{Error, Result};
use crate::export::{self, ExportRow};
use crate::graph::{self, NodeMap};
use crate::ingest::FlatRecord;
use crate::layout::{self, LayoutConstants, ROOT_POSITION};
use crate::model::{RubricSource, ScaleNode};
use crate::store::{ItemEdit, NodePatch, ScaleStore, StoreObserver};
use crate::validate::{self, StructuralWarning, StructuredScale, StructuringReview};

#[derive(Debug, Clone, Default)]
struct OpGuard {
    flag: Arc<AtomicBool>,
}

impl OpGuard {
    fn acquire(&self, operation: &'static str) -> Result<GuardRelease> {
        if self.flag.swap(true, Ordering::SeqCst) {
            return Err(Error::OperationInProgress { operation });
        }
        Ok(GuardRelease {
            flag: Arc::clone(&self.flag),
        })
    }
}

/// Releases the owning operation guard when dropped, which is how every exit
/// path (success, validation failure, transport failure) frees the guard.
#[derive(Debug)]
struct GuardRelease {
    flag: Arc<AtomicBool>,
}

impl Drop for GuardRelease {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// In-flight handle for one adaptation round trip.
///
/// Created by [`Engine::begin_branch`] before the oracle call, consumed by
/// [`Engine::complete_branch`] after it. Dropping the ticket (transport
/// failure, abandoned call) releases the branching guard.
#[derive(Debug)]
pub struct BranchTicket {
    source_id: String,
    generation: u64,
    _guard: GuardRelease,
}

/// Result of a committed branch adaptation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchOutcome {
    pub node_id: String,
    /// Non-fatal structural drift noted by the validator.
    pub warnings: Vec<StructuralWarning>,
}

#[derive(Debug)]
pub struct Engine {
    store: ScaleStore,
    layout: LayoutConstants,
    branching: OpGuard,
    importing: OpGuard,
    generation: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            store: ScaleStore::default(),
            layout: LayoutConstants::default(),
            branching: OpGuard::default(),
            importing: OpGuard::default(),
            generation: 0,
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the layout constants. Intended for call sites that need a
    /// denser or wider canvas; the defaults match the reference canvas.
    pub fn with_layout(mut self, layout: LayoutConstants) -> Self {
        self.layout = layout;
        self
    }

    // ---- read surface -----------------------------------------------------

    pub fn nodes(&self) -> &NodeMap {
        self.store.nodes()
    }

    pub fn node(&self, id: &str) -> Option<&ScaleNode> {
        self.store.get(id)
    }

    pub fn root(&self) -> Option<&ScaleNode> {
        graph::root(self.store.nodes())
    }

    pub fn children(&self, id: &str) -> Vec<&ScaleNode> {
        graph::children(self.store.nodes(), id)
    }

    pub fn descendants(&self, id: &str) -> Vec<String> {
        graph::descendants(self.store.nodes(), id)
    }

    pub fn siblings(&self, id: &str) -> Vec<&ScaleNode> {
        graph::siblings(self.store.nodes(), id)
    }

    pub fn branch_count(&self, id: &str, id_prefix: Option<&str>) -> usize {
        graph::branch_count(self.store.nodes(), id, id_prefix)
    }

    pub fn active(&self) -> Option<&ScaleNode> {
        self.store.active().and_then(|id| self.store.get(id))
    }

    pub fn export_rows(&self) -> Vec<ExportRow> {
        export::export_rows(self.store.nodes())
    }

    /// Registers a post-commit observer on the underlying store.
    pub fn subscribe(&mut self, observer: StoreObserver) {
        self.store.subscribe(observer);
    }

    // ---- selection and local edits ---------------------------------------

    pub fn select(&mut self, id: Option<&str>) -> Result<()> {
        self.store.set_active(id)
    }

    /// Local edit; does not touch the structural generation, so an in-flight
    /// adaptation elsewhere is unaffected.
    pub fn set_collapsed(&mut self, id: &str, collapsed: bool) -> Result<bool> {
        self.store.update(
            id,
            NodePatch {
                collapsed: Some(collapsed),
                item_edits: Vec::new(),
            },
        )
    }

    pub fn edit_item_text(&mut self, node_id: &str, item_id: &str, text: &str) -> Result<bool> {
        self.store.update(
            node_id,
            NodePatch {
                collapsed: None,
                item_edits: vec![ItemEdit::Text {
                    item_id: item_id.to_string(),
                    text: text.to_string(),
                }],
            },
        )
    }

    /// Applies a re-extracted or hand-edited rubric to one item.
    pub fn edit_item_rubric(
        &mut self,
        node_id: &str,
        item_id: &str,
        tags: Vec<String>,
        source: RubricSource,
    ) -> Result<bool> {
        self.store.update(
            node_id,
            NodePatch {
                collapsed: None,
                item_edits: vec![ItemEdit::Rubric {
                    item_id: item_id.to_string(),
                    tags,
                    source,
                }],
            },
        )
    }

    // ---- import pipeline --------------------------------------------------

    /// Structures flat records through the oracle and installs the result as
    /// a fresh family. The oracle may reject the input outright
    /// ([`Error::NotAScale`]); a structural change that lands while the call
    /// is in flight discards the result ([`Error::Superseded`]).
    pub async fn import_root<P: GenerativeService>(
        &mut self,
        provider: &P,
        records: Vec<FlatRecord>,
    ) -> Result<String> {
        let _guard = self.importing.acquire("import")?;
        let generation = self.generation;

        let request = StructuringRequest { records };
        let payload = provider.structure_scale(&request).await?;

        if generation != self.generation {
            tracing::debug!("structuring result discarded after concurrent mutation");
            return Err(Error::Superseded);
        }

        match validate::validate_structuring(&payload)? {
            StructuringReview::Rejected { reason } => Err(Error::NotAScale { reason }),
            StructuringReview::Accepted(structured) => self.import_structured(&structured),
        }
    }

    /// Installs a structured scale as the new family: the collection is
    /// cleared first (single active family), then the assembled root is
    /// admitted and selected. Returns the new root id.
    pub fn import_structured(&mut self, structured: &StructuredScale) -> Result<String> {
        if structured.scale_name.trim().is_empty() {
            return Err(Error::InvalidNode {
                field: "name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if structured.dimensions.is_empty() {
            return Err(Error::InvalidNode {
                field: "dimensions".to_string(),
                message: "a scale node needs at least one dimension".to_string(),
            });
        }

        let id = fresh_id();
        let root = assemble_root(structured, &id, ROOT_POSITION);

        self.store.clear();
        self.store.add(root)?;
        self.store.set_active(Some(&id))?;
        self.generation += 1;
        tracing::info!(%id, name = %structured.scale_name, "family imported");
        Ok(id)
    }

    // ---- branching pipeline -----------------------------------------------

    /// Starts a branch adaptation: acquires the branching guard, captures
    /// the structural generation, and builds the oracle request. No mutation
    /// happens here.
    pub fn begin_branch(&self, source_id: &str, intent: &str) -> Result<(BranchTicket, AdaptationRequest)> {
        let Some(source) = self.store.get(source_id) else {
            return Err(Error::UnknownNode {
                id: source_id.to_string(),
            });
        };
        let guard = self.branching.acquire("branching")?;
        let request = AdaptationRequest::from_node(source, intent);
        let ticket = BranchTicket {
            source_id: source_id.to_string(),
            generation: self.generation,
            _guard: guard,
        };
        Ok((ticket, request))
    }

    /// Finishes a branch adaptation from the oracle's raw payload: generation
    /// revalidation, shape gate, slot computation, assembly, and the single
    /// committing `add`. Insertion is the last step; any earlier failure
    /// leaves the collection untouched.
    pub fn complete_branch(&mut self, ticket: BranchTicket, payload: &Value) -> Result<BranchOutcome> {
        let BranchTicket {
            source_id,
            generation,
            _guard,
        } = ticket;

        if generation != self.generation {
            tracing::debug!(%source_id, "adaptation result discarded after concurrent mutation");
            return Err(Error::Superseded);
        }
        let source = self
            .store
            .get(&source_id)
            .cloned()
            .ok_or_else(|| Error::UnknownNode {
                id: source_id.clone(),
            })?;

        let (adapted, warnings) = validate::validate_adaptation(payload, &source)?;

        let branch_index = next_branch_index(self.store.nodes(), &source_id);
        let slot = layout::next_branch_position(Some(&source), branch_index, &self.layout);
        let node_id = fresh_id();
        let node = assemble_branch(&adapted, &source, slot, &node_id);

        self.store.add(node)?;
        self.store.set_active(Some(&node_id))?;
        self.generation += 1;
        tracing::info!(%node_id, source = %source_id, "branch committed");
        Ok(BranchOutcome { node_id, warnings })
    }

    /// The full adaptation round trip: begin, await the oracle, complete.
    pub async fn branch<P: GenerativeService>(
        &mut self,
        provider: &P,
        source_id: &str,
        intent: &str,
    ) -> Result<BranchOutcome> {
        let (ticket, request) = self.begin_branch(source_id, intent)?;
        let payload = match provider.adapt_scale(&request).await {
            Ok(payload) => payload,
            Err(err) => return Err(err.into()),
        };
        self.complete_branch(ticket, &payload)
    }

    // ---- deletion ---------------------------------------------------------

    /// The ids a cascade delete of `id` would remove, for the UI's
    /// confirmation prompt. The root is refused before any cascade set is
    /// computed; unknown ids yield an empty preview.
    pub fn cascade_preview(&self, id: &str) -> Result<Vec<String>> {
        if self.store.get(id).is_some_and(ScaleNode::is_root) {
            return Err(Error::RootProtected);
        }
        Ok(graph::cascade_delete_set(self.store.nodes(), id))
    }

    /// Removes `id` and every descendant as one committed step. Unknown ids
    /// are a no-op returning 0.
    pub fn delete_branch(&mut self, id: &str) -> Result<usize> {
        if self.store.get(id).is_some_and(ScaleNode::is_root) {
            return Err(Error::RootProtected);
        }
        let ids = graph::cascade_delete_set(self.store.nodes(), id);
        if ids.is_empty() {
            return Ok(0);
        }
        let count = self.store.remove_cascade(&ids)?;
        self.generation += 1;
        Ok(count)
    }
}

fn fresh_id() -> String {
    format!("scale-{}", Uuid::new_v4())
}

/// Next branch index under `parent_id`: one past the highest index ever
/// assigned among the surviving children. A freed index is not reused, so a
/// freed layout slot is never double-occupied.
fn next_branch_index(nodes: &NodeMap, parent_id: &str) -> u32 {
    graph::children(nodes, parent_id)
        .iter()
        .filter_map(|n| n.branch_index())
        .max()
        .map_or(0, |max| max + 1)
}
