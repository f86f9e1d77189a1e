//! Removes weakly connected noise nodes.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::Value;

use super::Graph;
use crate::report::{graph_from_value, graph_to_value};

#[derive(Debug, Clone, Default)]
pub struct ConnectivityOutcome {
    pub graph: Graph,
    pub removed_nodes: usize,
    pub removed_links: usize,
}

/// Per-node connection counts from the current link list.
///
/// A collapsed link counts once per upstream triple it stands for. Both
/// endpoints are counted, so a self-loop adds two to its node, as in the
/// graph builder.
pub(crate) fn connection_counts(graph: &Graph) -> HashMap<&str, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for link in &graph.links {
        let n = link.multiplicity.max(1) as usize;
        *counts.entry(link.source_id.as_str()).or_default() += n;
        *counts.entry(link.target_id.as_str()).or_default() += n;
    }
    counts
}

/// Keep anchors and nodes with more than `min_connections` links.
///
/// A node is an anchor if its id is in `anchor_ids` or it carries the anchor
/// flag. Links survive only if both endpoints survive.
pub fn filter_connectivity(
    graph: &Graph,
    anchor_ids: &BTreeSet<String>,
    min_connections: usize,
) -> ConnectivityOutcome {
    let counts = connection_counts(graph);

    let nodes: Vec<_> = graph
        .nodes
        .iter()
        .filter(|n| {
            n.is_anchor
                || anchor_ids.contains(&n.id)
                || counts.get(n.id.as_str()).copied().unwrap_or(0) > min_connections
        })
        .cloned()
        .collect();

    let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let links: Vec<_> = graph
        .links
        .iter()
        .filter(|l| kept.contains(l.source_id.as_str()) && kept.contains(l.target_id.as_str()))
        .cloned()
        .collect();

    let removed_nodes = graph.nodes.len() - nodes.len();
    let removed_links = graph.links.len() - links.len();
    log::debug!(
        "Connectivity filter removed {} nodes and {} links",
        removed_nodes,
        removed_links
    );

    ConnectivityOutcome {
        graph: Graph { nodes, links },
        removed_nodes,
        removed_links,
    }
}

/// JSON entry point for collaborators holding a serialized graph.
///
/// A value without `nodes`/`links` arrays is returned unchanged.
pub fn filter_graph_value(
    value: &Value,
    anchor_ids: &BTreeSet<String>,
    min_connections: usize,
) -> Value {
    match graph_from_value(value) {
        Ok(graph) => {
            graph_to_value(&filter_connectivity(&graph, anchor_ids, min_connections).graph)
        }
        Err(e) => {
            log::warn!("Connectivity filter skipped: {}", e);
            value.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Link, Node};
    use serde_json::json;

    fn graph(nodes: &[&str], links: &[(&str, &str)]) -> Graph {
        Graph {
            nodes: nodes.iter().map(|id| Node::new(id, id)).collect(),
            links: links.iter().map(|(s, t)| Link::new(s, t, "related to")).collect(),
        }
    }

    fn anchors(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_star_without_anchors() {
        // NCBIGene:1 has degree 2, the leaves degree 1
        let g = graph(
            &["NCBIGene:1", "MONDO:1", "NCBIGene:2"],
            &[("NCBIGene:1", "MONDO:1"), ("NCBIGene:1", "NCBIGene:2")],
        );
        let out = filter_connectivity(&g, &BTreeSet::new(), 1);
        assert_eq!(out.graph.nodes.len(), 1);
        assert_eq!(out.graph.nodes[0].id, "NCBIGene:1");
        assert!(out.graph.links.is_empty());
        assert_eq!(out.removed_nodes, 2);
        assert_eq!(out.removed_links, 2);
    }

    #[test]
    fn test_degree_one_anchor_kept() {
        let g = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let out = filter_connectivity(&g, &anchors(&["A"]), 1);
        let ids: Vec<&str> = out.graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(out.graph.links.len(), 1);
    }

    #[test]
    fn test_degree_zero_anchor_kept() {
        let g = graph(&["A", "B", "C", "D"], &[("B", "C"), ("C", "D"), ("D", "B")]);
        let out = filter_connectivity(&g, &anchors(&["A"]), 1);
        assert_eq!(out.graph.nodes.len(), 4);
        assert_eq!(out.graph.links.len(), 3);
    }

    #[test]
    fn test_anchor_flag_respected() {
        let mut g = graph(&["A", "B"], &[("A", "B")]);
        g.nodes[0].is_anchor = true;
        let out = filter_connectivity(&g, &BTreeSet::new(), 1);
        assert_eq!(out.graph.nodes.len(), 1);
        assert!(out.graph.links.is_empty());
    }

    #[test]
    fn test_no_dangling_links_after_filter() {
        let g = graph(
            &["A", "B", "C", "D", "E"],
            &[("A", "B"), ("B", "C"), ("C", "A"), ("C", "D"), ("D", "E")],
        );
        let out = filter_connectivity(&g, &anchors(&["E"]), 1);
        assert!(out.graph.dangling_links().is_empty());
        assert!(out.graph.node("E").is_some());
    }

    #[test]
    fn test_higher_threshold() {
        let g = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("A", "C")]);
        let out = filter_connectivity(&g, &BTreeSet::new(), 2);
        assert!(out.graph.nodes.is_empty());
    }

    #[test]
    fn test_collapsed_link_counts_its_multiplicity() {
        let mut g = graph(&["A", "B"], &[("A", "B")]);
        g.links[0].multiplicity = 2;
        let out = filter_connectivity(&g, &BTreeSet::new(), 1);
        assert_eq!(out.graph.nodes.len(), 2);
        assert_eq!(out.graph.links.len(), 1);
    }

    #[test]
    fn test_self_loop_counts_both_endpoints() {
        let g = graph(&["A", "B"], &[("A", "A"), ("A", "B")]);
        let counts = connection_counts(&g);
        assert_eq!(counts["A"], 3);
        assert_eq!(counts["B"], 1);

        let out = filter_connectivity(&g, &BTreeSet::new(), 2);
        let ids: Vec<&str> = out.graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A"]);
        assert_eq!(out.graph.links.len(), 1);
    }

    #[test]
    fn test_value_entry_point() {
        let value = json!({
            "nodes": [
                {"id": "A", "name": "a"},
                {"id": "B", "name": "b"},
                {"id": "C", "name": "c"}
            ],
            "links": [
                {"source": "A", "target": "B", "label": "related to"},
                {"source": "B", "target": "C", "label": "related to"}
            ]
        });
        let out = filter_graph_value(&value, &BTreeSet::new(), 1);
        assert_eq!(out["nodes"].as_array().unwrap().len(), 1);
        assert_eq!(out["nodes"][0]["id"], "B");
        assert!(out["links"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_structure_returned_unchanged() {
        let value = json!({"nodes": [{"id": "A", "name": "a"}]});
        assert_eq!(filter_graph_value(&value, &BTreeSet::new(), 1), value);

        let value = json!("not a graph");
        assert_eq!(filter_graph_value(&value, &BTreeSet::new(), 1), value);
    }
}
