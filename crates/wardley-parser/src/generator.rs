//! Canonical text generation from persisted map records.
//!
//! The output is what [`parse`](crate::parse) reads back, so a map edited
//! visually and a map edited as text can keep converting into each other.
//! Generation is deterministic: the same snapshot always yields the same
//! bytes, which keeps diff-based syncing of stored maps quiet when nothing
//! changed.

use std::{cmp::Ordering, collections::HashMap};

use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};

use wardley_core::{
    record::{MapSnapshot, NodeRecord, RecordId},
    semantic::PERCENT_SCALE,
};

/// Canonical node order: most visible first, then least evolved first.
fn canonical_order(a: &NodeRecord, b: &NodeRecord) -> Ordering {
    b.y_pct()
        .total_cmp(&a.y_pct())
        .then_with(|| a.x_pct().total_cmp(&b.x_pct()))
}

/// Two-decimal fixed point with exact ties rounded away from zero.
///
/// `{:.2}` alone breaks ties to even, so `0.625` would print as `0.62`.
fn fixed2(value: f64) -> String {
    match Decimal::from_f64_retain(value) {
        Some(exact) => format!(
            "{:.2}",
            exact.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        ),
        None => format!("{value:.2}"),
    }
}

fn declaration_line(node: &NodeRecord) -> String {
    format!(
        "{} {} [{}, {}]",
        node.kind(),
        node.text(),
        fixed2(node.y_pct() / PERCENT_SCALE),
        fixed2(node.x_pct() / PERCENT_SCALE)
    )
}

/// Generate canonical map text from a snapshot.
///
/// Layout:
/// 1. `title <title>` and a blank line, when the title is non-empty.
/// 2. One declaration per node, sorted by visibility descending then
///    evolution ascending, with positions at two decimal places.
/// 3. A blank line if there are any edges, then one `<source>-><target>`
///    line per edge in snapshot order.
///
/// Edges whose endpoints do not resolve to a node with non-empty text are
/// dropped silently.
///
/// # Example
///
/// ```
/// use wardley_core::record::{EdgeRecord, MapSnapshot, NodeRecord};
///
/// let snapshot = MapSnapshot::new(
///     Some("Tea Shop".to_string()),
///     vec![
///         NodeRecord::new("1", "Cup of Tea", 61.0, 79.0),
///         NodeRecord::new("2", "Tea", 80.0, 63.0),
///     ],
///     vec![EdgeRecord::new("e1", "1", "2")],
/// );
///
/// assert_eq!(
///     wardley_parser::generate(&snapshot),
///     "title Tea Shop\n\ncomponent Cup of Tea [0.79, 0.61]\ncomponent Tea [0.63, 0.80]\n\nCup of Tea->Tea"
/// );
/// ```
pub fn generate(snapshot: &MapSnapshot) -> String {
    let mut lines = Vec::new();

    if let Some(title) = snapshot.title().filter(|title| !title.is_empty()) {
        lines.push(format!("title {title}"));
        lines.push(String::new());
    }

    let mut nodes: Vec<&NodeRecord> = snapshot.nodes().iter().collect();
    nodes.sort_by(|a, b| canonical_order(a, b));
    lines.extend(nodes.iter().map(|node| declaration_line(node)));

    if !snapshot.edges().is_empty() {
        lines.push(String::new());
    }

    let names: HashMap<&RecordId, &str> = snapshot
        .nodes()
        .iter()
        .map(|node| (node.id(), node.text()))
        .collect();
    let resolve = |id: &RecordId| names.get(id).copied().filter(|name| !name.is_empty());

    let mut dropped = 0;
    for edge in snapshot.edges() {
        match (resolve(edge.source_id()), resolve(edge.target_id())) {
            (Some(source), Some(target)) => lines.push(format!("{source}->{target}")),
            _ => dropped += 1,
        }
    }

    debug!(
        nodes = nodes.len(),
        edges = snapshot.edges().len() - dropped,
        dropped;
        "Generated map text"
    );

    lines.join("\n")
}
