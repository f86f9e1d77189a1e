//! Node merging and link rewriting.

use std::collections::{HashMap, HashSet};

use super::{classify_by_ontology_types, Graph, Link, Node, NodeMetadata};
use crate::normalize::{Canonical, NormalizationMap, NormalizationRecord};

/// Result of [`merge_nodes`].
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Nodes with unique ids, in first-claim order.
    pub nodes: Vec<Node>,
    /// Pre-merge id -> final id, for every node that was mapped or merged.
    pub id_map: HashMap<String, String>,
    /// How many nodes were folded into an earlier one.
    pub merged: usize,
}

impl MergeOutcome {
    /// Final id for a pre-merge id.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.id_map.get(id).map(String::as_str).unwrap_or(id)
    }
}

/// Apply canonical ids and fold nodes that share one.
///
/// Every node claims its final id (canonical if mapped, its own otherwise);
/// a node whose final id is already claimed is merged into the claimer:
/// provenance is unioned, anchor status is OR-ed, weights are summed.
pub fn merge_nodes(nodes: &[Node], records: &NormalizationMap) -> MergeOutcome {
    let mut out = MergeOutcome::default();
    let mut claimed: HashMap<String, usize> = HashMap::new();

    for node in nodes {
        let canonical = Canonical::resolve(&node.id, records);
        let final_id = match canonical {
            Canonical::Mapped(record) => record.canonical_id.as_str(),
            Canonical::Unmapped => node.id.as_str(),
        };

        match claimed.get(final_id) {
            Some(&slot) => {
                let target = &mut out.nodes[slot];
                target.prior_ids.extend(node.prior_ids.iter().cloned());
                target.prior_ids.insert(node.id.clone());
                target.is_anchor |= node.is_anchor;
                target.connection_weight =
                    target.connection_weight.saturating_add(node.connection_weight);
                // an unmapped claimer takes the record of the first mapped node folded into it
                if let Canonical::Mapped(record) = canonical {
                    if target.metadata.is_none() {
                        apply_record(target, record);
                    }
                }
                out.merged += 1;
                log::debug!("Merged {} into {}", node.id, target.id);
                out.id_map.insert(node.id.clone(), target.id.clone());
            }
            None => {
                let adopted = match canonical {
                    Canonical::Mapped(record) => {
                        out.id_map.insert(node.id.clone(), record.canonical_id.clone());
                        adopt(node, record)
                    }
                    Canonical::Unmapped => node.clone(),
                };
                claimed.insert(adopted.id.clone(), out.nodes.len());
                out.nodes.push(adopted);
            }
        }
    }

    if out.merged > 0 {
        log::info!(
            "Merged {} nodes into canonical entities ({} remain)",
            out.merged,
            out.nodes.len()
        );
    }

    out
}

fn adopt(node: &Node, record: &NormalizationRecord) -> Node {
    let mut adopted = node.clone();
    adopted.prior_ids.insert(node.id.clone());
    adopted.id = record.canonical_id.clone();
    apply_record(&mut adopted, record);
    adopted
}

/// Copy label, metadata and ontology-based type from `record`.
fn apply_record(node: &mut Node, record: &NormalizationRecord) {
    if let Some(label) = &record.label {
        node.name = label.clone();
    }
    if let Some(entity_type) = classify_by_ontology_types(&record.ontology_types) {
        node.entity_type = entity_type;
    }
    node.metadata = Some(NodeMetadata {
        label: record.label.clone(),
        description: record.description.clone(),
        ontology_types: record.ontology_types.clone(),
    });
}

/// Rewrite link endpoints through `id_map`; ids not in the map are kept.
///
/// Must run after the whole merge pass, since a canonical id may be claimed
/// by a node later in the list than the link's endpoint.
pub fn rewrite_links(links: &[Link], id_map: &HashMap<String, String>) -> Vec<Link> {
    links
        .iter()
        .map(|link| {
            let mut rewritten = link.clone();
            if let Some(id) = id_map.get(&link.source_id) {
                rewritten.source_id = id.clone();
            }
            if let Some(id) = id_map.get(&link.target_id) {
                rewritten.target_id = id.clone();
            }
            rewritten
        })
        .collect()
}

/// Collapse links made identical by rewriting.
///
/// Links sharing (source, target, label) become one link with the ordered
/// union of their evidence and summed multiplicity, so connection counts are
/// unchanged. Self-loops, including those created by merging, are kept.
pub fn collapse_duplicate_links(links: &[Link]) -> Vec<Link> {
    let mut out: Vec<Link> = Vec::with_capacity(links.len());
    let mut index: HashMap<(String, String, String), usize> = HashMap::new();

    for link in links {
        let key = (
            link.source_id.clone(),
            link.target_id.clone(),
            link.predicate_label.clone(),
        );
        match index.get(&key) {
            Some(&slot) => {
                let existing = &mut out[slot];
                let known: HashSet<String> = existing.evidence.iter().cloned().collect();
                existing.evidence.extend(
                    link.evidence
                        .iter()
                        .filter(|e| !known.contains(*e))
                        .cloned(),
                );
                existing.multiplicity = existing.multiplicity.saturating_add(link.multiplicity);
            }
            None => {
                index.insert(key, out.len());
                out.push(link.clone());
            }
        }
    }

    let collapsed = links.len() - out.len();
    if collapsed > 0 {
        log::debug!("Collapsed {} duplicate links", collapsed);
    }

    out
}

/// Merge, rewrite and collapse in one call.
pub fn resolve_graph(graph: &Graph, records: &NormalizationMap) -> (Graph, MergeOutcome) {
    let merged = merge_nodes(&graph.nodes, records);
    let rewritten = rewrite_links(&graph.links, &merged.id_map);
    let links = collapse_duplicate_links(&rewritten);
    let resolved = Graph {
        nodes: merged.nodes.clone(),
        links,
    };
    (resolved, merged)
}
