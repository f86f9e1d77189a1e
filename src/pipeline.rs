//! End-to-end graph construction.
//!
//! The run is split around its single suspension point:
//! [`Pipeline::prepare`] (sync) -> [`NodeNormalizer::normalize`] (async) ->
//! [`Pipeline::finish`] (sync). [`Pipeline::run`] chains the three.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::config::Config;
use crate::error::Result;
use crate::graph::{build_graph, extract_pathway, filter_connectivity, resolve_graph, Graph};
use crate::normalize::{NodeNormalizer, NormalizationMap};
use crate::report::{PipelineArtifact, ReportCounters};
use crate::triples::{
    filter_noise, parse_triples, preprocess_triples, IdRules, Preprocessed, QueryContext, QueryKind,
    Triple,
};

/// Graph built from triples, waiting for normalization.
#[derive(Debug, Clone)]
pub struct PreparedGraph {
    pub graph: Graph,
    pub context: QueryContext,
    pub original_triples: usize,
    pub filtered_triples: usize,
    pub filtered_nodes: usize,
}

impl PreparedGraph {
    /// Ids to send to the normalizer, in node order.
    pub fn node_ids(&self) -> Vec<String> {
        self.graph.nodes.iter().map(|n| n.id.clone()).collect()
    }
}

pub struct Pipeline {
    rules: IdRules,
    excluded_predicates: Vec<String>,
    min_connections: usize,
}

impl Pipeline {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            rules: IdRules::new(&config.preprocess)?,
            excluded_predicates: config.preprocess.excluded_predicates.clone(),
            min_connections: config.filter.min_connections,
        })
    }

    /// Preprocess, filter noise and build the raw graph.
    pub fn prepare(&self, triples: &[Triple], context: &QueryContext) -> PreparedGraph {
        let pre = preprocess_triples(triples, &self.rules);
        let filtered = filter_noise(&pre.triples, &pre.removal_ids, &self.excluded_predicates);
        let pre = Preprocessed {
            triples: filtered.triples,
            ..pre
        };
        let graph = build_graph(&pre, &context.effective_anchors());

        log::info!(
            "{}: {} triples in, {} filtered, graph has {} nodes / {} links",
            context.query_kind,
            triples.len(),
            filtered.removed_triples,
            graph.nodes.len(),
            graph.links.len()
        );

        PreparedGraph {
            graph,
            context: context.clone(),
            original_triples: triples.len(),
            filtered_triples: filtered.removed_triples,
            filtered_nodes: filtered.removed_node_ids,
        }
    }

    /// Merge, rewrite, filter and serialize.
    pub fn finish(&self, prepared: PreparedGraph, records: &NormalizationMap) -> PipelineArtifact {
        let (resolved, merged) = resolve_graph(&prepared.graph, records);

        let anchors: BTreeSet<String> = prepared
            .context
            .effective_anchors()
            .iter()
            .map(|raw| merged.resolve(self.rules.collapse(raw)).to_string())
            .collect();

        let mut graph = filter_connectivity(&resolved, &anchors, self.min_connections).graph;

        if prepared.context.query_kind == QueryKind::FindPathway {
            if anchors.len() >= 2 {
                graph = extract_pathway(&graph, &anchors);
            } else {
                log::warn!(
                    "find-pathway needs two distinct anchors, got {}; returning filtered graph",
                    anchors.len()
                );
            }
        }

        let counters = ReportCounters {
            original_triples: prepared.original_triples,
            filtered_triples: prepared.filtered_triples,
            filtered_nodes: prepared.filtered_nodes,
            final_nodes: graph.nodes.len(),
            final_links: graph.links.len(),
        };

        PipelineArtifact::new(graph, &prepared.context.summary(), counters)
    }

    /// Full run over an upstream triple list. Fails only if `triples` is not an array.
    pub async fn run(
        &self,
        triples: &Value,
        context: &QueryContext,
        normalizer: Option<&NodeNormalizer>,
    ) -> Result<PipelineArtifact> {
        let rows = triples.as_array().map_or(0, Vec::len);
        let parsed = parse_triples(triples)?;
        let mut prepared = self.prepare(&parsed, context);
        // rows skipped as malformed are still part of the input
        prepared.original_triples = rows;
        let records = match normalizer {
            Some(normalizer) => normalizer.normalize(&prepared.node_ids()).await,
            None => NormalizationMap::new(),
        };
        Ok(self.finish(prepared, &records))
    }
}
