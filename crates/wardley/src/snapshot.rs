//! Conversion from parsed text to persisted-shaped records.

use log::debug;

use wardley_core::record::{EdgeRecord, MapSnapshot, NodeRecord, RecordId, kind_metadata};
use wardley_parser::ParseResult;

fn node_id(index: usize) -> RecordId {
    RecordId::new((index + 1).to_string())
}

/// Build a [`MapSnapshot`] from a parse result.
///
/// Every declared component becomes a node, redeclarations included, with an
/// id taken from its declaration order. Edges resolve by name to the last
/// declaration; edges naming an undeclared component are dropped.
///
/// `generate(&snapshot_from_parse(&parse(text)))` is the canonical form of
/// `text`.
///
/// # Example
///
/// ```
/// use wardley::snapshot_from_parse;
///
/// let parsed = wardley_parser::parse("component A [0.5, 0.2]\ncomponent B [0.3, 0.9]\nA->B");
/// let snapshot = snapshot_from_parse(&parsed);
///
/// assert_eq!(snapshot.nodes().len(), 2);
/// assert_eq!(snapshot.edges()[0].target_id().as_str(), "2");
/// ```
pub fn snapshot_from_parse(parsed: &ParseResult) -> MapSnapshot {
    let nodes = parsed
        .components()
        .iter()
        .enumerate()
        .map(|(index, component)| {
            NodeRecord::new(
                node_id(index),
                component.name(),
                component.x_pct(),
                component.y_pct(),
            )
            .with_metadata(kind_metadata(component.kind()))
        })
        .collect();

    let edges: Vec<EdgeRecord> = parsed
        .edges()
        .iter()
        .filter_map(|edge| {
            let source = parsed.component_index(edge.source())?;
            let target = parsed.component_index(edge.target())?;
            Some((source, target))
        })
        .enumerate()
        .map(|(index, (source, target))| {
            EdgeRecord::new(
                format!("e{}", index + 1),
                node_id(source),
                node_id(target),
            )
        })
        .collect();

    debug!(
        nodes = parsed.components().len(),
        edges = edges.len(),
        dropped = parsed.edges().len() - edges.len();
        "Built snapshot from parse result"
    );

    MapSnapshot::new(parsed.title().map(str::to_string), nodes, edges)
}
