//! Knowledge graph model and the graph-shaping stages.
//!
//! Stages run in this order, each returning fresh collections:
//! [`build_graph`] -> [`merge_nodes`] -> [`rewrite_links`] /
//! [`collapse_duplicate_links`] -> [`filter_connectivity`] -> [`extract_pathway`].

mod builder;
mod classify;
mod connectivity;
mod merge;
mod pathway;

pub use builder::{build_graph, connection_weight, predicate_label};
pub use classify::{classify_by_ontology_types, classify_by_prefix};
pub use connectivity::{filter_connectivity, filter_graph_value, ConnectivityOutcome};
pub use merge::{
    collapse_duplicate_links, merge_nodes, resolve_graph, rewrite_links, MergeOutcome,
};
pub use pathway::{extract_pathway, extract_pathway_value};

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse entity classification used for grouping and coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Gene,
    Protein,
    Disease,
    Phenotype,
    Drug,
    Chemical,
    BiologicalProcess,
    Pathway,
    Anatomy,
    Cell,
    Other,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Gene => "Gene",
            EntityType::Protein => "Protein",
            EntityType::Disease => "Disease",
            EntityType::Phenotype => "Phenotype",
            EntityType::Drug => "Drug",
            EntityType::Chemical => "Chemical",
            EntityType::BiologicalProcess => "Biological Process",
            EntityType::Pathway => "Pathway",
            EntityType::Anatomy => "Anatomy",
            EntityType::Cell => "Cell",
            EntityType::Other => "Other",
        }
    }

    /// Numeric group for graph renderers (stable across releases).
    pub fn group(&self) -> u32 {
        match self {
            EntityType::Gene => 1,
            EntityType::Protein => 2,
            EntityType::Disease => 3,
            EntityType::Phenotype => 4,
            EntityType::Drug => 5,
            EntityType::Chemical => 6,
            EntityType::BiologicalProcess => 7,
            EntityType::Pathway => 8,
            EntityType::Anatomy => 9,
            EntityType::Cell => 10,
            EntityType::Other => 0,
        }
    }

    /// Inverse of [`EntityType::as_str`]; unknown names map to `Other`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Gene" => EntityType::Gene,
            "Protein" => EntityType::Protein,
            "Disease" => EntityType::Disease,
            "Phenotype" => EntityType::Phenotype,
            "Drug" => EntityType::Drug,
            "Chemical" => EntityType::Chemical,
            "Biological Process" => EntityType::BiologicalProcess,
            "Pathway" => EntityType::Pathway,
            "Anatomy" => EntityType::Anatomy,
            "Cell" => EntityType::Cell,
            _ => EntityType::Other,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive data copied from a normalization record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub ontology_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    /// Every raw id folded into this node. Never empty.
    pub prior_ids: BTreeSet<String>,
    pub name: String,
    pub entity_type: EntityType,
    /// Visual size; not a structural property.
    pub connection_weight: u32,
    pub is_anchor: bool,
    pub metadata: Option<NodeMetadata>,
}

impl Node {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            prior_ids: BTreeSet::from([id.to_string()]),
            name: name.to_string(),
            entity_type: classify_by_prefix(id),
            connection_weight: connection_weight(0),
            is_anchor: false,
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub source_id: String,
    pub target_id: String,
    pub predicate_label: String,
    pub evidence: Vec<String>,
    /// Number of upstream triples this link stands for
    pub multiplicity: u32,
}

impl Link {
    pub fn new(source_id: &str, target_id: &str, predicate_label: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            predicate_label: predicate_label.to_string(),
            evidence: Vec::new(),
            multiplicity: 1,
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source_id == id || self.target_id == id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// Links whose endpoints are missing from the node set.
    pub fn dangling_links(&self) -> Vec<&Link> {
        let ids = self.node_ids();
        self.links
            .iter()
            .filter(|l| !ids.contains(l.source_id.as_str()) || !ids.contains(l.target_id.as_str()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}
