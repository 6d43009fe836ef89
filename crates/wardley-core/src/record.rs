//! Persisted node and edge records exchanged with the storage layer.
//!
//! The engine never owns these identities. It reads the
//! `(text, x_pct, y_pct, metadata)` shape handed to it and hands back the same
//! shape when planning changes.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::semantic::{ComponentKind, KIND_METADATA_KEY};

/// Open-ended metadata attached to a record.
pub type Metadata = serde_json::Map<String, Value>;

/// Opaque identity of a persisted record.
///
/// Storage layers hand out either numeric or string keys; both deserialize
/// into the same textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create an identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Integer(i64),
            Unsigned(u64),
            Float(f64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Integer(id) => Self(id.to_string()),
            RawId::Unsigned(id) => Self(id.to_string()),
            // `3.0` and `3` name the same key
            RawId::Float(id) if id.fract() == 0.0 => Self(format!("{id:.0}")),
            RawId::Float(id) => Self(id.to_string()),
            RawId::Text(id) => Self(id),
        })
    }
}

/// Read `null` metadata as an empty mapping.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Metadata>::deserialize(deserializer)?.unwrap_or_default())
}

/// Build metadata marking a node of the given kind.
///
/// Anchors carry `{"type": "anchor"}`; ordinary components carry nothing.
pub fn kind_metadata(kind: ComponentKind) -> Metadata {
    let mut metadata = Metadata::new();
    if kind.is_anchor() {
        metadata.insert(
            KIND_METADATA_KEY.to_string(),
            Value::String(kind.as_str().to_string()),
        );
    }
    metadata
}

/// A persisted map node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    id: RecordId,
    text: String,
    x_pct: f64,
    y_pct: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    metadata: Metadata,
}

impl NodeRecord {
    /// Create a node record.
    ///
    /// # Arguments
    ///
    /// * `id` - Storage identity
    /// * `text` - Display text, matched against component names
    /// * `x_pct` - Evolution as a percentage
    /// * `y_pct` - Visibility as a percentage
    pub fn new(id: impl Into<RecordId>, text: impl Into<String>, x_pct: f64, y_pct: f64) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            x_pct,
            y_pct,
            metadata: Metadata::new(),
        }
    }

    /// Replace the metadata mapping.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> &RecordId {
        &self.id
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

    /// Derive the component kind from the `type` metadata flag.
    pub fn kind(&self) -> ComponentKind {
        match self.metadata.get(KIND_METADATA_KEY).and_then(Value::as_str) {
            Some("anchor") => ComponentKind::Anchor,
            _ => ComponentKind::Component,
        }
    }

    /// Move the node to a new position.
    pub fn set_position(&mut self, x_pct: f64, y_pct: f64) {
        self.x_pct = x_pct;
        self.y_pct = y_pct;
    }
}

/// A persisted dependency between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    id: RecordId,
    source_id: RecordId,
    target_id: RecordId,
    #[serde(default, deserialize_with = "null_as_empty")]
    metadata: Metadata,
}

impl EdgeRecord {
    /// Create an edge record.
    pub fn new(
        id: impl Into<RecordId>,
        source_id: impl Into<RecordId>,
        target_id: impl Into<RecordId>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            metadata: Metadata::new(),
        }
    }

    /// Replace the metadata mapping.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn source_id(&self) -> &RecordId {
        &self.source_id
    }

    pub fn target_id(&self) -> &RecordId {
        &self.target_id
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// A whole map as the storage layer sees it: the input to text generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    edges: Vec<EdgeRecord>,
}

impl MapSnapshot {
    /// Create a snapshot from its parts.
    pub fn new(title: Option<String>, nodes: Vec<NodeRecord>, edges: Vec<EdgeRecord>) -> Self {
        Self {
            title,
            nodes,
            edges,
        }
    }

    /// Get the title, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    /// Look up a node by identity.
    pub fn node(&self, id: &RecordId) -> Option<&NodeRecord> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    /// Split the snapshot into `(title, nodes, edges)`.
    pub fn into_parts(self) -> (Option<String>, Vec<NodeRecord>, Vec<EdgeRecord>) {
        (self.title, self.nodes, self.edges)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_record_id_accepts_numbers_and_strings() {
        let numeric: RecordId = serde_json::from_value(json!(42)).unwrap();
        let textual: RecordId = serde_json::from_value(json!("n-7")).unwrap();

        assert_eq!(numeric, RecordId::new("42"));
        assert_eq!(textual.as_str(), "n-7");
    }

    #[test]
    fn test_record_id_accepts_large_and_float_numbers() {
        let large: RecordId = serde_json::from_value(json!(u64::MAX)).unwrap();
        let whole: RecordId = serde_json::from_value(json!(3.0)).unwrap();
        let fractional: RecordId = serde_json::from_value(json!(3.5)).unwrap();

        assert_eq!(large.as_str(), "18446744073709551615");
        assert_eq!(whole, RecordId::new("3"));
        assert_eq!(fractional.as_str(), "3.5");
    }

    #[test]
    fn test_null_metadata_reads_as_empty() {
        let node: NodeRecord = serde_json::from_value(json!({
            "id": 1, "text": "Customer", "x_pct": 65.0, "y_pct": 95.0, "metadata": null
        }))
        .unwrap();
        let edge: EdgeRecord = serde_json::from_value(json!({
            "id": 10, "source_id": 1, "target_id": 2, "metadata": null
        }))
        .unwrap();

        assert!(node.metadata().is_empty());
        assert_eq!(node.kind(), ComponentKind::Component);
        assert!(edge.metadata().is_empty());
    }

    #[test]
    fn test_node_kind_from_metadata() {
        let anchor = NodeRecord::new("1", "User", 50.0, 90.0)
            .with_metadata(kind_metadata(ComponentKind::Anchor));
        let plain = NodeRecord::new("2", "Kettle", 50.0, 40.0);
        let mut odd = Metadata::new();
        odd.insert("type".to_string(), json!(7));
        let odd = NodeRecord::new("3", "Odd", 0.0, 0.0).with_metadata(odd);

        assert_eq!(anchor.kind(), ComponentKind::Anchor);
        assert_eq!(plain.kind(), ComponentKind::Component);
        assert_eq!(odd.kind(), ComponentKind::Component);
    }

    #[test]
    fn test_kind_metadata_is_empty_for_components() {
        assert!(kind_metadata(ComponentKind::Component).is_empty());
        assert_eq!(
            kind_metadata(ComponentKind::Anchor).get("type"),
            Some(&json!("anchor"))
        );
    }

    #[test]
    fn test_snapshot_deserializes_generate_input() {
        let snapshot: MapSnapshot = serde_json::from_value(json!({
            "title": "Tea Shop",
            "nodes": [
                { "id": 1, "text": "Customer", "x_pct": 65.0, "y_pct": 95.0, "metadata": { "type": "anchor" } },
                { "id": 2, "text": "Cup of Tea", "x_pct": 61.0, "y_pct": 79.0 }
            ],
            "edges": [
                { "id": 10, "source_id": 1, "target_id": 2, "metadata": {} }
            ]
        }))
        .unwrap();

        assert_eq!(snapshot.title(), Some("Tea Shop"));
        assert_eq!(snapshot.nodes().len(), 2);
        assert_eq!(snapshot.edges()[0].source_id(), &RecordId::new("1"));
        assert_eq!(
            snapshot.node(&RecordId::new("2")).map(NodeRecord::text),
            Some("Cup of Tea")
        );
    }
}
