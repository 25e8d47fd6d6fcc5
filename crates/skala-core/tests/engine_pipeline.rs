use std::cell::RefCell;
use std::collections::VecDeque;

use futures::executor::block_on;
use serde_json::{Value, json};
use skala_core::adapt::{
    AdaptationRequest, GenerativeService, StructuringRequest, TransportError, TransportResult,
};
use skala_core::{Engine, Error, FlatRecord, Position};

/// Plays back canned oracle payloads and records the requests it saw.
struct ScriptedOracle {
    structure: Value,
    adaptations: RefCell<VecDeque<Value>>,
    last_adaptation_request: RefCell<Option<AdaptationRequest>>,
}

impl ScriptedOracle {
    fn new(structure: Value, adaptations: Vec<Value>) -> Self {
        Self {
            structure,
            adaptations: RefCell::new(adaptations.into()),
            last_adaptation_request: RefCell::new(None),
        }
    }
}

impl GenerativeService for ScriptedOracle {
    async fn structure_scale(&self, _request: &StructuringRequest) -> TransportResult<Value> {
        Ok(self.structure.clone())
    }

    async fn adapt_scale(&self, request: &AdaptationRequest) -> TransportResult<Value> {
        *self.last_adaptation_request.borrow_mut() = Some(request.clone());
        Ok(self
            .adaptations
            .borrow_mut()
            .pop_front()
            .expect("script exhausted"))
    }
}

/// Fails every call with one fixed transport error.
struct DownOracle(TransportError);

impl GenerativeService for DownOracle {
    async fn structure_scale(&self, _request: &StructuringRequest) -> TransportResult<Value> {
        Err(self.0.clone())
    }

    async fn adapt_scale(&self, _request: &AdaptationRequest) -> TransportResult<Value> {
        Err(self.0.clone())
    }
}

fn records() -> Vec<FlatRecord> {
    vec![
        FlatRecord {
            id: "1".to_string(),
            dimension: Some("Ekstraversi".to_string()),
            text: "Saya mudah bergaul dengan orang baru".to_string(),
        },
        FlatRecord {
            id: "2".to_string(),
            dimension: Some("Neurotisisme".to_string()),
            text: "Saya mudah merasa cemas".to_string(),
        },
    ]
}

fn structuring_payload() -> Value {
    json!({
        "is_scale": true,
        "scale_name": "Skala Asli",
        "dimensions": [
            {"name": "Ekstraversi", "items": [
                {"text": "Saya mudah bergaul dengan orang baru", "rubric": ["sociable"]},
            ]},
            {"name": "Neurotisisme", "items": [
                {"text": "Saya mudah merasa cemas", "rubric": ["anxious"]},
            ]},
        ],
    })
}

fn adaptation_payload(name: &str, first_text: &str) -> Value {
    json!({
        "scale_name": name,
        "dimensions": [
            {"name": "Ekstraversi", "items": [
                {"text": first_text, "current_rubric": ["sociable", "casual"]},
            ]},
            {"name": "Neurotisisme", "items": [
                {"text": "aku gampang overthinking"},
            ]},
        ],
    })
}

#[test]
fn full_family_lifecycle() {
    let oracle = ScriptedOracle::new(
        structuring_payload(),
        vec![
            adaptation_payload("Skala Gen-Z", "gue gampang nyambung sama orang baru"),
            adaptation_payload("Skala Boomer", "Saya luwes berkenalan dengan siapa pun"),
            adaptation_payload("Skala Boomer Muda", "Saya cepat akrab"),
        ],
    );

    let mut engine = Engine::new();

    // Import lands the root at the canonical position.
    let root_id = block_on(engine.import_root(&oracle, records())).unwrap();
    let root = engine.node(&root_id).unwrap();
    assert_eq!(root.name, "Skala Asli");
    assert_eq!(root.position, Position::new(100.0, 250.0));
    assert_eq!(root.depth, 0);

    // First branch sits one row above the parent.
    let gen_z = block_on(engine.branch(&oracle, &root_id, "bahasa Gen-Z")).unwrap();
    assert!(gen_z.warnings.is_empty());
    let gen_z_node = engine.node(&gen_z.node_id).unwrap();
    assert_eq!(gen_z_node.name, "Skala Gen-Z");
    assert_eq!(gen_z_node.position, Position::new(650.0, 46.0));
    assert_eq!(gen_z_node.depth, 1);
    assert_eq!(gen_z_node.branch_index(), Some(0));

    // The request sent to the oracle carried the source and the intent.
    let request = oracle.last_adaptation_request.borrow().clone().unwrap();
    assert_eq!(request.source_scale_name, "Skala Asli");
    assert_eq!(request.adaptation_intent, "bahasa Gen-Z");
    assert_eq!(request.source_dimensions.len(), 2);

    // Second branch mirrors the first below the parent row.
    let boomer = block_on(engine.branch(&oracle, &root_id, "bahasa generasi Boomer")).unwrap();
    let boomer_node = engine.node(&boomer.node_id).unwrap();
    assert_eq!(boomer_node.position, Position::new(650.0, 454.0));
    assert_eq!(boomer_node.branch_index(), Some(1));

    // Rubric lineage: inherited where the oracle stayed silent.
    let inherited = &boomer_node.dimensions[1].items[0];
    assert_eq!(inherited.baseline_rubric, vec!["anxious"]);
    assert_eq!(inherited.current_rubric, vec!["anxious"]);

    // Structural queries see the two siblings.
    let sibling_ids: Vec<&str> = engine
        .siblings(&gen_z.node_id)
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(sibling_ids, [boomer.node_id.as_str()]);
    assert_eq!(engine.descendants(&root_id).len(), 2);
    assert_eq!(engine.branch_count(&root_id, None), 2);

    // Deleting Gen-Z removes exactly one node and leaves Boomer untouched.
    assert_eq!(engine.cascade_preview(&gen_z.node_id).unwrap().len(), 1);
    assert_eq!(engine.delete_branch(&gen_z.node_id).unwrap(), 1);
    assert!(engine.node(&gen_z.node_id).is_none());
    assert!(engine.node(&boomer.node_id).is_some());
    assert_eq!(engine.nodes().len(), 2);

    // A branch off Boomer starts its own index sequence one column over.
    let nested = block_on(engine.branch(&oracle, &boomer.node_id, "lebih santai")).unwrap();
    let nested_node = engine.node(&nested.node_id).unwrap();
    assert_eq!(nested_node.position, Position::new(1200.0, 250.0));
    assert_eq!(nested_node.depth, 2);
    assert_eq!(nested_node.branch_index(), Some(0));
    assert_eq!(nested_node.parent_id(), Some(boomer.node_id.as_str()));
}

#[test]
fn cascade_delete_takes_the_whole_subtree() {
    let oracle = ScriptedOracle::new(
        structuring_payload(),
        vec![
            adaptation_payload("A", "a"),
            adaptation_payload("B", "b"),
            adaptation_payload("C", "c"),
        ],
    );

    let mut engine = Engine::new();
    let root_id = block_on(engine.import_root(&oracle, records())).unwrap();
    let a = block_on(engine.branch(&oracle, &root_id, "x")).unwrap().node_id;
    let b = block_on(engine.branch(&oracle, &a, "x")).unwrap().node_id;
    let c = block_on(engine.branch(&oracle, &b, "x")).unwrap().node_id;

    let preview = engine.cascade_preview(&a).unwrap();
    assert_eq!(preview, vec![a.clone(), b.clone(), c.clone()]);

    assert_eq!(engine.delete_branch(&a).unwrap(), 3);
    assert_eq!(engine.nodes().len(), 1);
    assert!(engine.root().is_some());
}

#[test]
fn oracle_rejection_short_circuits_the_import() {
    let oracle = ScriptedOracle::new(
        json!({"is_scale": false, "reason": "daftar belanja, bukan skala"}),
        vec![],
    );
    let mut engine = Engine::new();
    let err = block_on(engine.import_root(&oracle, records())).unwrap_err();
    match err {
        Error::NotAScale { reason } => assert_eq!(reason, "daftar belanja, bukan skala"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(engine.nodes().is_empty());
}

#[test]
fn transport_failures_surface_distinctly_and_release_the_guard() {
    let oracle = ScriptedOracle::new(structuring_payload(), vec![adaptation_payload("A", "a")]);
    let mut engine = Engine::new();
    let root_id = block_on(engine.import_root(&oracle, records())).unwrap();

    let down = DownOracle(TransportError::Timeout);
    let err = block_on(engine.branch(&down, &root_id, "x")).unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::Timeout)));
    assert_eq!(engine.nodes().len(), 1);

    // The branching guard was released by the failed attempt.
    let ok = block_on(engine.branch(&oracle, &root_id, "x")).unwrap();
    assert!(engine.node(&ok.node_id).is_some());
}

#[test]
fn invalid_payload_leaves_the_graph_untouched() {
    let oracle = ScriptedOracle::new(
        structuring_payload(),
        vec![json!({"dimensions": "nope"}), adaptation_payload("A", "a")],
    );
    let mut engine = Engine::new();
    let root_id = block_on(engine.import_root(&oracle, records())).unwrap();

    let err = block_on(engine.branch(&oracle, &root_id, "x")).unwrap_err();
    assert!(matches!(err, Error::InvalidAdaptation { .. }));
    assert_eq!(engine.nodes().len(), 1);

    // Pipeline is immediately usable again.
    assert!(block_on(engine.branch(&oracle, &root_id, "x")).is_ok());
}

#[test]
fn export_rows_flatten_the_family_one_way() {
    let oracle = ScriptedOracle::new(
        structuring_payload(),
        vec![adaptation_payload("Skala Gen-Z", "gue gampang nyambung")],
    );
    let mut engine = Engine::new();
    let root_id = block_on(engine.import_root(&oracle, records())).unwrap();
    let branch = block_on(engine.branch(&oracle, &root_id, "bahasa Gen-Z")).unwrap();

    let rows = engine.export_rows();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].scale_id, root_id);
    assert_eq!(rows[0].parent_scale_id, "");
    assert_eq!(rows[0].baseline_rubric, "sociable");
    assert!(rows.iter().any(|r| {
        r.scale_id == branch.node_id
            && r.parent_scale_id == root_id
            && r.current_rubric == "sociable;casual"
    }));
}
