//! Builds nodes and links from preprocessed triples.

use std::collections::{BTreeSet, HashMap};

use super::{Graph, Link, Node};
use crate::triples::Preprocessed;

const MIN_WEIGHT: u32 = 5;
const MAX_WEIGHT: u32 = 20;

/// Visual size for a node with `count` raw connections: `clamp(count * 3, 5, 20)`.
pub fn connection_weight(count: usize) -> u32 {
    let scaled = u32::try_from(count.saturating_mul(3)).unwrap_or(u32::MAX);
    scaled.clamp(MIN_WEIGHT, MAX_WEIGHT)
}

/// Human-readable predicate: `biolink:gene_associated_with_condition`
/// -> `gene associated with condition`.
pub fn predicate_label(predicate: &str) -> String {
    let bare = predicate
        .split_once(':')
        .map(|(_, rest)| rest)
        .unwrap_or(predicate);
    bare.replace(['_', '-'], " ").trim().to_string()
}

/// Build the raw (pre-normalization) graph.
///
/// Triples missing any textual field are skipped. A node is an anchor when
/// its collapsed id or any raw alias is in `anchor_ids`.
pub fn build_graph(pre: &Preprocessed, anchor_ids: &BTreeSet<String>) -> Graph {
    let mut nodes: Vec<Node> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<usize> = Vec::new();
    let mut links = Vec::with_capacity(pre.triples.len());
    let mut skipped = 0usize;

    for triple in &pre.triples {
        let Some((source_id, source_name, predicate, target_id, target_name)) = triple.fields()
        else {
            skipped += 1;
            continue;
        };

        for (id, name) in [(source_id, source_name), (target_id, target_name)] {
            let slot = *index.entry(id.to_string()).or_insert_with(|| {
                let mut node = Node::new(id, name);
                node.prior_ids = pre.raw_ids(id);
                node.prior_ids.insert(id.to_string());
                node.is_anchor = node.prior_ids.iter().any(|raw| anchor_ids.contains(raw));
                nodes.push(node);
                counts.push(0);
                nodes.len() - 1
            });
            counts[slot] += 1;
        }

        let mut link = Link::new(source_id, target_id, &predicate_label(predicate));
        link.evidence = triple.evidence.clone();
        links.push(link);
    }

    if skipped > 0 {
        log::debug!("Graph builder skipped {} incomplete triples", skipped);
    }

    for (node, count) in nodes.iter_mut().zip(&counts) {
        node.connection_weight = connection_weight(*count);
    }

    log::debug!("Built graph: {} nodes, {} links", nodes.len(), links.len());

    Graph { nodes, links }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreprocessConfig;
    use crate::graph::EntityType;
    use crate::triples::{preprocess_triples, IdRules, Triple};

    fn build(triples: &[Triple], anchors: &[&str]) -> Graph {
        let rules = IdRules::new(&PreprocessConfig::default()).unwrap();
        let pre = preprocess_triples(triples, &rules);
        let anchors = anchors.iter().map(|a| a.to_string()).collect();
        build_graph(&pre, &anchors)
    }

    #[test]
    fn test_connection_weight_clamped() {
        assert_eq!(connection_weight(0), 5);
        assert_eq!(connection_weight(1), 5);
        assert_eq!(connection_weight(2), 6);
        assert_eq!(connection_weight(6), 18);
        assert_eq!(connection_weight(7), 20);
        assert_eq!(connection_weight(usize::MAX), 20);
    }

    #[test]
    fn test_predicate_label() {
        assert_eq!(predicate_label("biolink:related_to"), "related to");
        assert_eq!(
            predicate_label("biolink:gene_associated_with_condition"),
            "gene associated with condition"
        );
        assert_eq!(predicate_label("treats"), "treats");
        assert_eq!(predicate_label("RO:in-taxon"), "in taxon");
    }

    #[test]
    fn test_build_nodes_and_links() {
        let graph = build(
            &[
                Triple::new("NCBIGene:1", "GeneA", "biolink:related_to", "MONDO:1", "DiseaseA")
                    .with_evidence(&["PMID:9"]),
                Triple::new("NCBIGene:1", "GeneA", "biolink:related_to", "NCBIGene:2", "GeneB"),
            ],
            &[],
        );
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.links.len(), 2);
        assert_eq!(graph.nodes[0].id, "NCBIGene:1");
        assert_eq!(graph.nodes[0].connection_weight, 6);
        assert_eq!(graph.nodes[1].entity_type, EntityType::Disease);
        assert_eq!(graph.links[0].predicate_label, "related to");
        assert_eq!(graph.links[0].evidence, vec!["PMID:9"]);
        assert!(graph.dangling_links().is_empty());
    }

    #[test]
    fn test_incomplete_triples_skipped() {
        let mut broken = Triple::new("A:1", "a", "biolink:related_to", "B:1", "b");
        broken.target_name = None;
        let graph = build(&[broken], &[]);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_versioned_ids_share_node_with_provenance() {
        let graph = build(
            &[
                Triple::new("UniProtKB:P1-2", "P1 isoform", "biolink:related_to", "MONDO:1", "D"),
                Triple::new("UniProtKB:P1", "P1", "biolink:related_to", "MONDO:2", "E"),
            ],
            &[],
        );
        let node = graph.node("UniProtKB:P1").unwrap();
        assert_eq!(node.name, "P1 isoform");
        assert!(node.prior_ids.contains("UniProtKB:P1-2"));
        assert!(node.prior_ids.contains("UniProtKB:P1"));
        assert_eq!(graph.nodes.len(), 3);
    }

    #[test]
    fn test_self_loop_counts_both_endpoints() {
        let graph = build(
            &[Triple::new("NCBIGene:1", "A", "biolink:interacts_with", "NCBIGene:1", "A")],
            &[],
        );
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].connection_weight, connection_weight(2));
    }

    #[test]
    fn test_anchor_by_raw_id() {
        let graph = build(
            &[Triple::new("UniProtKB:P1-2", "P1", "biolink:related_to", "MONDO:1", "D")],
            &["UniProtKB:P1-2"],
        );
        assert!(graph.node("UniProtKB:P1").unwrap().is_anchor);
        assert!(!graph.node("MONDO:1").unwrap().is_anchor);
    }
}
