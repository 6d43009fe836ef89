//! In-memory [`MapStore`] over a [`MapSnapshot`].

use log::trace;
use thiserror::Error;

use wardley_core::record::{EdgeRecord, MapSnapshot, NodeRecord, RecordId};

use crate::reconcile::{MapStore, NewNode};

/// Errors raised by [`SnapshotStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("node {0} not found")]
    UnknownNode(RecordId),

    #[error("edge {0} not found")]
    UnknownEdge(RecordId),
}

/// A store holding a whole map in memory.
///
/// New records get numeric ids following the largest numeric id already
/// present. Deleting a node deletes the edges touching it.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    title: Option<String>,
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    next_id: u64,
}

impl SnapshotStore {
    pub fn new(snapshot: MapSnapshot) -> Self {
        let (title, nodes, edges) = snapshot.into_parts();
        let next_id = nodes
            .iter()
            .map(NodeRecord::id)
            .chain(edges.iter().map(EdgeRecord::id))
            .filter_map(|id| id.as_str().parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);

        Self {
            title,
            nodes,
            edges,
            next_id,
        }
    }

    /// The map as it stands after the operations applied so far.
    pub fn into_snapshot(self) -> MapSnapshot {
        MapSnapshot::new(self.title, self.nodes, self.edges)
    }

    fn allocate_id(&mut self) -> RecordId {
        let id = RecordId::from(self.next_id);
        self.next_id += 1;
        id
    }

    fn contains_node(&self, id: &RecordId) -> bool {
        self.nodes.iter().any(|node| node.id() == id)
    }
}

impl MapStore for SnapshotStore {
    type Error = StoreError;

    fn set_title(&mut self, title: Option<&str>) -> Result<(), StoreError> {
        self.title = title.map(str::to_string);
        Ok(())
    }

    fn update_node(&mut self, id: &RecordId, x_pct: f64, y_pct: f64) -> Result<(), StoreError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|node| node.id() == id)
            .ok_or_else(|| StoreError::UnknownNode(id.clone()))?;
        node.set_position(x_pct, y_pct);
        Ok(())
    }

    fn create_node(&mut self, node: &NewNode) -> Result<RecordId, StoreError> {
        let id = self.allocate_id();
        trace!(id = id.as_str(), text = node.text(); "Creating node");
        self.nodes.push(
            NodeRecord::new(id.clone(), node.text(), node.x_pct(), node.y_pct())
                .with_metadata(node.metadata().clone()),
        );
        Ok(id)
    }

    fn delete_node(&mut self, id: &RecordId) -> Result<(), StoreError> {
        if !self.contains_node(id) {
            return Err(StoreError::UnknownNode(id.clone()));
        }
        self.nodes.retain(|node| node.id() != id);
        self.edges
            .retain(|edge| edge.source_id() != id && edge.target_id() != id);
        Ok(())
    }

    fn create_edge(
        &mut self,
        source: &RecordId,
        target: &RecordId,
    ) -> Result<RecordId, StoreError> {
        for endpoint in [source, target] {
            if !self.contains_node(endpoint) {
                return Err(StoreError::UnknownNode(endpoint.clone()));
            }
        }
        let id = self.allocate_id();
        self.edges
            .push(EdgeRecord::new(id.clone(), source.clone(), target.clone()));
        Ok(id)
    }

    fn delete_edge(&mut self, id: &RecordId) -> Result<(), StoreError> {
        let before = self.edges.len();
        self.edges.retain(|edge| edge.id() != id);
        if self.edges.len() == before {
            return Err(StoreError::UnknownEdge(id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wardley_core::{record::kind_metadata, semantic::ComponentKind};
    use wardley_parser::{generate, parse};

    use super::*;
    use crate::{config::ReconcileConfig, reconcile};

    fn stored() -> MapSnapshot {
        MapSnapshot::new(
            None,
            vec![
                NodeRecord::new("4", "Customer", 65.0, 95.0)
                    .with_metadata(kind_metadata(ComponentKind::Anchor)),
                NodeRecord::new("7", "Kettle", 43.0, 35.0),
            ],
            vec![EdgeRecord::new("9", "4", "7")],
        )
    }

    #[test]
    fn test_ids_continue_after_largest_numeric_id() {
        let mut store = SnapshotStore::new(stored());
        let node = reconcile::plan(
            &parse("component Tea [0.5, 0.5]"),
            &MapSnapshot::default(),
            &ReconcileConfig::default(),
        )
        .unwrap()
        .create_nodes()[0]
            .clone();

        assert_eq!(store.create_node(&node).unwrap().as_str(), "10");
        assert_eq!(store.create_node(&node).unwrap().as_str(), "11");
    }

    #[test]
    fn test_delete_node_removes_its_edges() {
        let mut store = SnapshotStore::new(stored());

        store.delete_node(&RecordId::new("7")).unwrap();

        let snapshot = store.into_snapshot();
        assert_eq!(snapshot.nodes().len(), 1);
        assert!(snapshot.edges().is_empty());
    }

    #[test]
    fn test_unknown_records_are_errors() {
        let mut store = SnapshotStore::new(stored());
        let ghost = RecordId::new("99");

        assert_eq!(
            store.update_node(&ghost, 1.0, 1.0),
            Err(StoreError::UnknownNode(ghost.clone()))
        );
        assert_eq!(
            store.delete_edge(&ghost),
            Err(StoreError::UnknownEdge(ghost.clone()))
        );
        assert_eq!(
            store.create_edge(&RecordId::new("4"), &ghost),
            Err(StoreError::UnknownNode(ghost))
        );
    }

    #[test]
    fn test_applied_plan_regenerates_the_text() {
        let source = "\
title Tea Shop

anchor Customer [0.95, 0.65]
component Cup of Tea [0.79, 0.61]

Customer->Cup of Tea";
        let plan =
            reconcile::plan(&parse(source), &stored(), &ReconcileConfig::default()).unwrap();
        let mut store = SnapshotStore::new(stored());

        let report = reconcile::apply(&plan, &mut store);

        assert!(report.is_complete(), "{:?}", report.failures());
        assert_eq!(generate(&store.into_snapshot()), source);
    }
}
