//! Output artifacts: graph JSON, grouped relationship report, counters.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BiokgError, Result};
use crate::graph::{classify_by_prefix, EntityType, Graph, Link, Node, NodeMetadata};

/// Node as emitted to graph renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeArtifact {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub group: u32,
    #[serde(default)]
    pub val: u32,
    #[serde(default)]
    pub entity_type: Option<String>,
    /// Provenance: every raw id folded into this node
    #[serde(default)]
    pub starting_id: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_anchor: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkArtifact {
    pub source: String,
    pub target: String,
    pub label: String,
    #[serde(default = "default_link_value")]
    pub value: u32,
    #[serde(default)]
    pub evidence: Vec<String>,
}

fn default_link_value() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphArtifact {
    pub nodes: Vec<NodeArtifact>,
    pub links: Vec<LinkArtifact>,
}

impl From<&Node> for NodeArtifact {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            group: node.entity_type.group(),
            val: node.connection_weight,
            entity_type: Some(node.entity_type.to_string()),
            starting_id: node.prior_ids.iter().cloned().collect(),
            metadata: node.metadata.clone(),
            is_anchor: node.is_anchor,
        }
    }
}

impl From<NodeArtifact> for Node {
    fn from(artifact: NodeArtifact) -> Self {
        let entity_type = artifact
            .entity_type
            .as_deref()
            .map(EntityType::from_name)
            .unwrap_or_else(|| classify_by_prefix(&artifact.id));
        let mut prior_ids: BTreeSet<String> = artifact.starting_id.into_iter().collect();
        prior_ids.insert(artifact.id.clone());
        Self {
            id: artifact.id,
            prior_ids,
            name: artifact.name,
            entity_type,
            connection_weight: artifact.val,
            is_anchor: artifact.is_anchor,
            metadata: artifact.metadata,
        }
    }
}

impl From<&Link> for LinkArtifact {
    fn from(link: &Link) -> Self {
        Self {
            source: link.source_id.clone(),
            target: link.target_id.clone(),
            label: link.predicate_label.clone(),
            value: link.multiplicity,
            evidence: link.evidence.clone(),
        }
    }
}

impl From<LinkArtifact> for Link {
    fn from(artifact: LinkArtifact) -> Self {
        Self {
            source_id: artifact.source,
            target_id: artifact.target,
            predicate_label: artifact.label,
            evidence: artifact.evidence,
            multiplicity: artifact.value.max(1),
        }
    }
}

impl From<&Graph> for GraphArtifact {
    fn from(graph: &Graph) -> Self {
        Self {
            nodes: graph.nodes.iter().map(NodeArtifact::from).collect(),
            links: graph.links.iter().map(LinkArtifact::from).collect(),
        }
    }
}

impl From<GraphArtifact> for Graph {
    fn from(artifact: GraphArtifact) -> Self {
        Self {
            nodes: artifact.nodes.into_iter().map(Node::from).collect(),
            links: artifact.links.into_iter().map(Link::from).collect(),
        }
    }
}

pub fn graph_to_value(graph: &Graph) -> Value {
    serde_json::to_value(GraphArtifact::from(graph)).unwrap_or(Value::Null)
}

/// Parse a serialized graph; fails if `nodes` or `links` is not an array.
pub fn graph_from_value(value: &Value) -> Result<Graph> {
    for key in ["nodes", "links"] {
        if !value.get(key).is_some_and(Value::is_array) {
            return Err(BiokgError::InvalidGraphStructure(format!(
                "missing `{}` array",
                key
            )));
        }
    }
    let artifact: GraphArtifact = serde_json::from_value(value.clone())
        .map_err(|e| BiokgError::InvalidGraphStructure(e.to_string()))?;
    Ok(artifact.into())
}

/// Counters reported alongside the artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCounters {
    pub original_triples: usize,
    pub filtered_triples: usize,
    pub filtered_nodes: usize,
    pub final_nodes: usize,
    pub final_links: usize,
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineArtifact {
    pub graph: Graph,
    pub graph_json: GraphArtifact,
    pub report: String,
    pub counters: ReportCounters,
}

impl PipelineArtifact {
    pub fn new(graph: Graph, summary: &str, counters: ReportCounters) -> Self {
        let report = render_report(&graph, summary, &counters);
        Self {
            graph_json: GraphArtifact::from(&graph),
            graph,
            report,
            counters,
        }
    }
}

/// Relationship sentences grouped by predicate label (groups sorted).
pub fn group_sentences(graph: &Graph) -> BTreeMap<String, Vec<String>> {
    let names: HashMap<&str, &str> = graph
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.name.as_str()))
        .collect();
    let name = |id: &str| names.get(id).copied().unwrap_or(id).to_string();

    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for link in &graph.links {
        groups
            .entry(link.predicate_label.clone())
            .or_default()
            .push(format!(
                "{} {} {}",
                name(&link.source_id),
                link.predicate_label,
                name(&link.target_id)
            ));
    }
    groups
}

/// Markdown report: heading, optional filtering notice, one section per predicate.
pub fn render_report(graph: &Graph, summary: &str, counters: &ReportCounters) -> String {
    let mut out = format!("# Knowledge Graph: {}\n\n", summary);

    if counters.filtered_triples > 0 {
        out.push_str(&format!(
            "_Note: {} relationships involving {} unreliable or excluded entities \
             were filtered out._\n\n",
            counters.filtered_triples, counters.filtered_nodes
        ));
    }

    let groups = group_sentences(graph);
    if groups.is_empty() {
        out.push_str("No relationships remain after filtering.\n");
        return out;
    }

    for (predicate, sentences) in groups {
        out.push_str(&format!("### {}\n", predicate.to_uppercase()));
        for sentence in sentences {
            out.push_str(&format!("- {}\n", sentence));
        }
        out.push('\n');
    }

    out
}
