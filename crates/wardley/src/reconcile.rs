//! Reconciliation of parsed text against stored map records.
//!
//! Planning is pure: [`plan`] compares a [`ParseResult`] with the current
//! [`MapSnapshot`] and lists the record operations that bring the store in
//! line with the text. [`apply`] replays a plan against any [`MapStore`],
//! carrying on past individual failures so one rejected request does not
//! strand the rest of the edit.
//!
//! Components match stored nodes by display text. A matched node keeps its
//! identity and only moves when it drifted further than the configured
//! tolerance; everything else is created or deleted.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use wardley_core::{
    record::{EdgeRecord, MapSnapshot, Metadata, NodeRecord, RecordId, kind_metadata},
    semantic::Component,
};
use wardley_parser::{ParseResult, validate};

use crate::config::ReconcileConfig;

/// Reasons a parse result cannot be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("map text has {syntax} syntax error(s) and {validation} validation error(s)")]
    Invalid { syntax: usize, validation: usize },

    #[error("map text declares no components")]
    Empty,
}

/// A node in a plan: either already stored, or the n-th node the plan creates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRef {
    Existing(RecordId),
    Created(usize),
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Existing(id) => write!(f, "node {id}"),
            NodeRef::Created(index) => write!(f, "new node #{index}"),
        }
    }
}

/// Move a stored node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeUpdate {
    id: RecordId,
    x_pct: f64,
    y_pct: f64,
}

impl NodeUpdate {
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn x_pct(&self) -> f64 {
        self.x_pct
    }

    pub fn y_pct(&self) -> f64 {
        self.y_pct
    }
}

/// A node to create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewNode {
    text: String,
    x_pct: f64,
    y_pct: f64,
    metadata: Metadata,
}

impl NewNode {
    fn from_component(component: &Component) -> Self {
        Self {
            text: component.name().to_string(),
            x_pct: component.x_pct(),
            y_pct: component.y_pct(),
            metadata: kind_metadata(component.kind()),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn x_pct(&self) -> f64 {
        self.x_pct
    }

    pub fn y_pct(&self) -> f64 {
        self.y_pct
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// An edge to create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NewEdge {
    source: NodeRef,
    target: NodeRef,
}

impl NewEdge {
    pub fn source(&self) -> &NodeRef {
        &self.source
    }

    pub fn target(&self) -> &NodeRef {
        &self.target
    }
}

/// Record operations that bring a store in line with parsed text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcilePlan {
    title: Option<String>,
    update_nodes: Vec<NodeUpdate>,
    create_nodes: Vec<NewNode>,
    delete_nodes: Vec<RecordId>,
    create_edges: Vec<NewEdge>,
    delete_edges: Vec<RecordId>,
}

impl ReconcilePlan {
    /// The map title from the text.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn update_nodes(&self) -> &[NodeUpdate] {
        &self.update_nodes
    }

    pub fn create_nodes(&self) -> &[NewNode] {
        &self.create_nodes
    }

    pub fn delete_nodes(&self) -> &[RecordId] {
        &self.delete_nodes
    }

    pub fn create_edges(&self) -> &[NewEdge] {
        &self.create_edges
    }

    pub fn delete_edges(&self) -> &[RecordId] {
        &self.delete_edges
    }

    /// Returns `true` when no record changes are needed.
    pub fn is_empty(&self) -> bool {
        self.update_nodes.is_empty()
            && self.create_nodes.is_empty()
            && self.delete_nodes.is_empty()
            && self.create_edges.is_empty()
            && self.delete_edges.is_empty()
    }
}

fn drifted(node: &NodeRecord, component: &Component, tolerance: f64) -> bool {
    (node.x_pct() - component.x_pct()).abs() > tolerance
        || (node.y_pct() - component.y_pct()).abs() > tolerance
}

/// Plan the record changes that make `current` match `parsed`.
///
/// # Errors
///
/// Returns [`ReconcileError::Invalid`] when the text has syntax or
/// validation errors, and [`ReconcileError::Empty`] when it declares no
/// components. Both guard against wiping a stored map with a half-typed
/// document.
pub fn plan(
    parsed: &ParseResult,
    current: &MapSnapshot,
    config: &ReconcileConfig,
) -> Result<ReconcilePlan, ReconcileError> {
    let validation = validate(parsed).len();
    if !parsed.is_clean() || validation > 0 {
        return Err(ReconcileError::Invalid {
            syntax: parsed.errors().len(),
            validation,
        });
    }
    if parsed.components().is_empty() {
        return Err(ReconcileError::Empty);
    }

    let existing: HashMap<&str, &NodeRecord> = current
        .nodes()
        .iter()
        .map(|node| (node.text(), node))
        .collect();

    let mut plan = ReconcilePlan {
        title: parsed.title().map(str::to_string),
        ..ReconcilePlan::default()
    };

    // One entry per distinct name, in first-declaration order, placed where
    // its last declaration puts it.
    let mut refs: IndexMap<&str, NodeRef> = IndexMap::new();
    for declared in parsed.components() {
        let name = declared.name();
        if refs.contains_key(name) {
            continue;
        }
        let Some(component) = parsed.component(name) else {
            continue;
        };

        let node_ref = match existing.get(name) {
            Some(node) => {
                if drifted(node, component, config.position_tolerance()) {
                    plan.update_nodes.push(NodeUpdate {
                        id: node.id().clone(),
                        x_pct: component.x_pct(),
                        y_pct: component.y_pct(),
                    });
                }
                NodeRef::Existing(node.id().clone())
            }
            None => {
                plan.create_nodes.push(NewNode::from_component(component));
                NodeRef::Created(plan.create_nodes.len() - 1)
            }
        };
        refs.insert(name, node_ref);
    }

    let kept: HashSet<&RecordId> = refs
        .values()
        .filter_map(|node_ref| match node_ref {
            NodeRef::Existing(id) => Some(id),
            NodeRef::Created(_) => None,
        })
        .collect();
    plan.delete_nodes = current
        .nodes()
        .iter()
        .map(NodeRecord::id)
        .filter(|id| !kept.contains(id))
        .cloned()
        .collect();

    let surviving: Vec<&EdgeRecord> = current
        .edges()
        .iter()
        .filter(|edge| kept.contains(edge.source_id()) && kept.contains(edge.target_id()))
        .collect();
    let stored_keys: HashSet<NewEdge> = surviving
        .iter()
        .map(|edge| NewEdge {
            source: NodeRef::Existing(edge.source_id().clone()),
            target: NodeRef::Existing(edge.target_id().clone()),
        })
        .collect();

    let mut wanted: HashSet<NewEdge> = HashSet::new();
    for edge in parsed.edges() {
        let (Some(source), Some(target)) = (refs.get(edge.source()), refs.get(edge.target()))
        else {
            continue;
        };
        let key = NewEdge {
            source: source.clone(),
            target: target.clone(),
        };
        if !stored_keys.contains(&key) && !wanted.contains(&key) {
            plan.create_edges.push(key.clone());
        }
        wanted.insert(key);
    }

    plan.delete_edges = surviving
        .iter()
        .filter(|edge| {
            !wanted.contains(&NewEdge {
                source: NodeRef::Existing(edge.source_id().clone()),
                target: NodeRef::Existing(edge.target_id().clone()),
            })
        })
        .map(|edge| edge.id().clone())
        .collect();

    debug!(
        updates = plan.update_nodes.len(),
        creates = plan.create_nodes.len(),
        deletes = plan.delete_nodes.len(),
        edge_creates = plan.create_edges.len(),
        edge_deletes = plan.delete_edges.len();
        "Planned reconciliation"
    );

    Ok(plan)
}

/// Storage operations a plan is applied through.
pub trait MapStore {
    type Error: std::error::Error;

    /// Record the map title.
    fn set_title(&mut self, title: Option<&str>) -> Result<(), Self::Error>;

    fn update_node(&mut self, id: &RecordId, x_pct: f64, y_pct: f64) -> Result<(), Self::Error>;

    /// Store a new node and return the identity the store assigned to it.
    fn create_node(&mut self, node: &NewNode) -> Result<RecordId, Self::Error>;

    fn delete_node(&mut self, id: &RecordId) -> Result<(), Self::Error>;

    /// Store a new edge and return the identity the store assigned to it.
    fn create_edge(
        &mut self,
        source: &RecordId,
        target: &RecordId,
    ) -> Result<RecordId, Self::Error>;

    fn delete_edge(&mut self, id: &RecordId) -> Result<(), Self::Error>;
}

/// One plan step that did not take effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyFailure {
    operation: String,
    reason: String,
}

impl ApplyFailure {
    fn new(operation: impl Into<String>, reason: impl fmt::Display) -> Self {
        let failure = Self {
            operation: operation.into(),
            reason: reason.to_string(),
        };
        warn!(
            operation = failure.operation.as_str(),
            reason = failure.reason.as_str();
            "Reconcile step failed"
        );
        failure
    }

    /// What was attempted, e.g. `delete node 7`.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Outcome of applying a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplyReport {
    nodes_updated: usize,
    nodes_created: usize,
    nodes_deleted: usize,
    edges_created: usize,
    edges_deleted: usize,
    failures: Vec<ApplyFailure>,
}

impl ApplyReport {
    pub fn nodes_updated(&self) -> usize {
        self.nodes_updated
    }

    pub fn nodes_created(&self) -> usize {
        self.nodes_created
    }

    pub fn nodes_deleted(&self) -> usize {
        self.nodes_deleted
    }

    pub fn edges_created(&self) -> usize {
        self.edges_created
    }

    pub fn edges_deleted(&self) -> usize {
        self.edges_deleted
    }

    /// Steps that failed or were skipped, in execution order.
    pub fn failures(&self) -> &[ApplyFailure] {
        &self.failures
    }

    /// Returns `true` when every step took effect.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Apply a plan to a store.
///
/// Steps run in order: title, node updates, node creations, node deletions,
/// edge creations, edge deletions. A failed step is logged and recorded in
/// the report and the remaining steps still run. Edges that reference a node
/// whose creation failed are skipped.
pub fn apply<S: MapStore>(plan: &ReconcilePlan, store: &mut S) -> ApplyReport {
    let mut report = ApplyReport::default();

    if let Err(err) = store.set_title(plan.title()) {
        report.failures.push(ApplyFailure::new("set title", err));
    }

    for update in plan.update_nodes() {
        match store.update_node(update.id(), update.x_pct(), update.y_pct()) {
            Ok(()) => report.nodes_updated += 1,
            Err(err) => report
                .failures
                .push(ApplyFailure::new(format!("update node {}", update.id()), err)),
        }
    }

    let mut created: Vec<Option<RecordId>> = Vec::with_capacity(plan.create_nodes().len());
    for node in plan.create_nodes() {
        match store.create_node(node) {
            Ok(id) => {
                report.nodes_created += 1;
                created.push(Some(id));
            }
            Err(err) => {
                report
                    .failures
                    .push(ApplyFailure::new(format!("create node `{}`", node.text()), err));
                created.push(None);
            }
        }
    }

    for id in plan.delete_nodes() {
        match store.delete_node(id) {
            Ok(()) => report.nodes_deleted += 1,
            Err(err) => report
                .failures
                .push(ApplyFailure::new(format!("delete node {id}"), err)),
        }
    }

    let resolve = |node_ref: &NodeRef| match node_ref {
        NodeRef::Existing(id) => Some(id.clone()),
        NodeRef::Created(index) => created.get(*index).cloned().flatten(),
    };
    for edge in plan.create_edges() {
        let operation = format!("create edge {}->{}", edge.source(), edge.target());
        let (Some(source), Some(target)) = (resolve(edge.source()), resolve(edge.target())) else {
            report
                .failures
                .push(ApplyFailure::new(operation, "endpoint was not created"));
            continue;
        };
        match store.create_edge(&source, &target) {
            Ok(_) => report.edges_created += 1,
            Err(err) => report.failures.push(ApplyFailure::new(operation, err)),
        }
    }

    for id in plan.delete_edges() {
        match store.delete_edge(id) {
            Ok(()) => report.edges_deleted += 1,
            Err(err) => report
                .failures
                .push(ApplyFailure::new(format!("delete edge {id}"), err)),
        }
    }

    info!(
        updated = report.nodes_updated,
        created = report.nodes_created,
        deleted = report.nodes_deleted,
        failures = report.failures.len();
        "Applied reconciliation plan"
    );

    report
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use wardley_core::semantic::ComponentKind;
    use wardley_parser::parse;

    use super::*;

    fn stored() -> MapSnapshot {
        MapSnapshot::new(
            Some("Old".to_string()),
            vec![
                NodeRecord::new("1", "Customer", 65.0, 95.0)
                    .with_metadata(kind_metadata(ComponentKind::Anchor)),
                NodeRecord::new("2", "Cup of Tea", 61.0, 79.0),
                NodeRecord::new("3", "Kettle", 43.0, 35.0),
            ],
            vec![
                EdgeRecord::new("10", "1", "2"),
                EdgeRecord::new("11", "2", "3"),
            ],
        )
    }

    fn plan_for(source: &str) -> ReconcilePlan {
        plan(&parse(source), &stored(), &ReconcileConfig::default()).unwrap()
    }

    #[test]
    fn test_unchanged_map_needs_no_changes() {
        let plan = plan_for(
            "title Old\nanchor Customer [0.95, 0.65]\ncomponent Cup of Tea [0.79, 0.61]\ncomponent Kettle [0.35, 0.43]\nCustomer->Cup of Tea\nCup of Tea->Kettle",
        );

        assert!(plan.is_empty(), "{plan:?}");
    }

    #[test]
    fn test_small_drift_is_ignored() {
        let plan = plan_for(
            "anchor Customer [0.954, 0.646]\ncomponent Cup of Tea [0.79, 0.61]\ncomponent Kettle [0.35, 0.43]\nCustomer->Cup of Tea\nCup of Tea->Kettle",
        );

        assert!(plan.update_nodes().is_empty());
    }

    #[test]
    fn test_moved_component_is_updated() {
        let plan = plan_for(
            "anchor Customer [0.95, 0.65]\ncomponent Cup of Tea [0.70, 0.61]\ncomponent Kettle [0.35, 0.43]",
        );

        assert_eq!(plan.update_nodes().len(), 1);
        let update = &plan.update_nodes()[0];
        assert_eq!(update.id().as_str(), "2");
        assert_approx_eq!(f64, update.y_pct(), 70.0);
        assert_approx_eq!(f64, update.x_pct(), 61.0);
    }

    #[test]
    fn test_new_and_removed_components() {
        let plan = plan_for(
            "anchor Customer [0.95, 0.65]\ncomponent Cup of Tea [0.79, 0.61]\nanchor Business [0.9, 0.3]\nBusiness->Cup of Tea\nCustomer->Cup of Tea",
        );

        assert_eq!(plan.create_nodes().len(), 1);
        assert_eq!(plan.create_nodes()[0].text(), "Business");
        assert_eq!(
            plan.create_nodes()[0].metadata(),
            &kind_metadata(ComponentKind::Anchor)
        );
        assert_eq!(plan.delete_nodes(), &[RecordId::new("3")]);
        assert_eq!(
            plan.create_edges(),
            &[NewEdge {
                source: NodeRef::Created(0),
                target: NodeRef::Existing(RecordId::new("2")),
            }]
        );
        // The Cup of Tea->Kettle edge goes away with the Kettle node.
        assert!(plan.delete_edges().is_empty());
    }

    #[test]
    fn test_removed_edge_is_deleted() {
        let plan = plan_for(
            "anchor Customer [0.95, 0.65]\ncomponent Cup of Tea [0.79, 0.61]\ncomponent Kettle [0.35, 0.43]\nCustomer->Cup of Tea",
        );

        assert_eq!(plan.delete_edges(), &[RecordId::new("11")]);
        assert!(plan.create_edges().is_empty());
    }

    #[test]
    fn test_repeated_edges_are_planned_once() {
        let plan = plan_for(
            "anchor Customer [0.95, 0.65]\ncomponent Cup of Tea [0.79, 0.61]\ncomponent Kettle [0.35, 0.43]\nCustomer->Kettle\nCustomer->Kettle; again\nCustomer->Cup of Tea\nCup of Tea->Kettle",
        );

        assert_eq!(plan.create_edges().len(), 1);
    }

    #[test]
    fn test_redeclared_component_uses_last_position() {
        let plan = plan(
            &parse("component Tea [0.2, 0.2]\ncomponent Tea [0.6, 0.8]"),
            &MapSnapshot::default(),
            &ReconcileConfig::default(),
        )
        .unwrap();

        assert_eq!(plan.create_nodes().len(), 1);
        assert_approx_eq!(f64, plan.create_nodes()[0].y_pct(), 60.0);
    }

    #[test]
    fn test_invalid_text_is_refused() {
        let current = stored();
        let config = ReconcileConfig::default();

        assert_eq!(
            plan(&parse("component A [0.5, 0.5]\nA->B\nnonsense"), &current, &config),
            Err(ReconcileError::Invalid {
                syntax: 1,
                validation: 1
            })
        );
        assert_eq!(
            plan(&parse("// nothing yet"), &current, &config),
            Err(ReconcileError::Empty)
        );
    }

    #[derive(Debug, Error)]
    #[error("store rejected {0}")]
    struct Rejected(String);

    /// Records calls and rejects anything naming `Broken`.
    #[derive(Default)]
    struct RecordingStore {
        calls: Vec<String>,
        next_id: usize,
    }

    impl MapStore for RecordingStore {
        type Error = Rejected;

        fn set_title(&mut self, title: Option<&str>) -> Result<(), Rejected> {
            self.calls.push(format!("title {title:?}"));
            Ok(())
        }

        fn update_node(&mut self, id: &RecordId, _: f64, _: f64) -> Result<(), Rejected> {
            self.calls.push(format!("update {id}"));
            Ok(())
        }

        fn create_node(&mut self, node: &NewNode) -> Result<RecordId, Rejected> {
            if node.text() == "Broken" {
                return Err(Rejected(node.text().to_string()));
            }
            self.next_id += 1;
            self.calls.push(format!("create {}", node.text()));
            Ok(RecordId::new(format!("n{}", self.next_id)))
        }

        fn delete_node(&mut self, id: &RecordId) -> Result<(), Rejected> {
            self.calls.push(format!("delete {id}"));
            Ok(())
        }

        fn create_edge(
            &mut self,
            source: &RecordId,
            target: &RecordId,
        ) -> Result<RecordId, Rejected> {
            self.calls.push(format!("link {source}->{target}"));
            Ok(RecordId::new("edge"))
        }

        fn delete_edge(&mut self, id: &RecordId) -> Result<(), Rejected> {
            self.calls.push(format!("unlink {id}"));
            Ok(())
        }
    }

    #[test]
    fn test_apply_runs_steps_in_order() {
        let plan = plan_for(
            "title New\nanchor Customer [0.95, 0.65]\ncomponent Cup of Tea [0.70, 0.61]\ncomponent Milk [0.5, 0.5]\nCup of Tea->Milk",
        );
        let mut store = RecordingStore::default();

        let report = apply(&plan, &mut store);

        assert!(report.is_complete());
        assert_eq!(
            store.calls,
            vec![
                "title Some(\"New\")",
                "update 2",
                "create Milk",
                "delete 3",
                "link 2->n1",
                "unlink 10",
            ]
        );
        assert_eq!(report.nodes_created(), 1);
        assert_eq!(report.edges_deleted(), 1);
    }

    #[test]
    fn test_apply_continues_past_failures() {
        let plan = plan_for(
            "anchor Customer [0.95, 0.65]\ncomponent Broken [0.5, 0.5]\ncomponent Milk [0.4, 0.4]\nCustomer->Broken\nCustomer->Milk",
        );
        let mut store = RecordingStore::default();

        let report = apply(&plan, &mut store);

        assert_eq!(report.nodes_created(), 1);
        assert_eq!(report.edges_created(), 1);
        assert_eq!(report.failures().len(), 2);
        assert_eq!(report.failures()[0].operation(), "create node `Broken`");
        assert_eq!(report.failures()[0].reason(), "store rejected Broken");
        assert_eq!(
            report.failures()[1].operation(),
            "create edge node 1->new node #0"
        );
        assert!(store.calls.contains(&"link 1->n1".to_string()));
    }
}
