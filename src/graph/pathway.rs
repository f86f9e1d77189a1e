//! Approximate pathway subgraph between anchor nodes.
//!
//! Keeps the anchors plus every node adjacent to at least two distinct
//! anchors (for the usual pair `A`, `B`: `neighbors(A) ∩ neighbors(B)`), then
//! runs one closure pass over links already inside that set. This favours
//! mutual connectivity over path length; it is not a shortest-path search.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::Value;

use super::Graph;
use crate::report::{graph_from_value, graph_to_value};

fn neighbors<'a>(graph: &'a Graph, id: &'a str) -> HashSet<&'a str> {
    let mut out = HashSet::from([id]);
    for link in &graph.links {
        if link.source_id == id {
            out.insert(link.target_id.as_str());
        } else if link.target_id == id {
            out.insert(link.source_id.as_str());
        }
    }
    out
}

/// Extract the pathway subgraph connecting `anchor_ids`.
///
/// Anchors missing from the graph are ignored. With fewer than two anchors
/// present the result holds just those anchors and the links among them.
/// Node and link order follow `graph`.
pub fn extract_pathway(graph: &Graph, anchor_ids: &BTreeSet<String>) -> Graph {
    let present = graph.node_ids();
    let anchors: Vec<&str> = anchor_ids
        .iter()
        .map(String::as_str)
        .filter(|id| {
            let found = present.contains(id);
            if !found {
                log::warn!("Pathway anchor {} not in graph; ignoring", id);
            }
            found
        })
        .collect();

    let mut bridge: HashSet<&str> = anchors.iter().copied().collect();

    // how many distinct anchors each node touches
    let mut touching: HashMap<&str, usize> = HashMap::new();
    for &anchor in &anchors {
        for id in neighbors(graph, anchor) {
            *touching.entry(id).or_default() += 1;
        }
    }
    bridge.extend(
        touching
            .into_iter()
            .filter(|(_, n)| *n >= 2)
            .map(|(id, _)| id),
    );

    // single closure pass
    let mut closure = Vec::new();
    for link in &graph.links {
        if bridge.contains(link.source_id.as_str()) && bridge.contains(link.target_id.as_str()) {
            closure.push(link.source_id.as_str());
            closure.push(link.target_id.as_str());
        }
    }
    bridge.extend(closure);

    let nodes = graph
        .nodes
        .iter()
        .filter(|n| bridge.contains(n.id.as_str()))
        .cloned()
        .collect();
    let links = graph
        .links
        .iter()
        .filter(|l| bridge.contains(l.source_id.as_str()) && bridge.contains(l.target_id.as_str()))
        .cloned()
        .collect();

    let pathway = Graph { nodes, links };
    log::info!(
        "Pathway between {} anchors: {} nodes, {} links",
        anchors.len(),
        pathway.nodes.len(),
        pathway.links.len()
    );
    pathway
}

/// JSON entry point; a value without `nodes`/`links` arrays is returned unchanged.
pub fn extract_pathway_value(value: &Value, anchor_ids: &BTreeSet<String>) -> Value {
    match graph_from_value(value) {
        Ok(graph) => graph_to_value(&extract_pathway(&graph, anchor_ids)),
        Err(e) => {
            log::warn!("Pathway extraction skipped: {}", e);
            value.clone()
        }
    }
}
