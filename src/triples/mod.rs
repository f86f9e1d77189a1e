//! Input triples and query context.
//!
//! Upstream delivers relationships as positional JSON arrays
//! `[sourceId, sourceName, predicate, targetId, targetName, _, evidence?]`.
//! They are parsed into [`Triple`] records here, then passed through
//! [`preprocess_triples`] and [`filter_noise`].

mod noise;
mod preprocess;

pub use noise::{filter_noise, is_excluded_predicate, NoiseFilterOutcome};
pub use preprocess::{collapse_versioned_id, preprocess_triples, IdRules, Preprocessed};

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BiokgError, Result};

/// A single source --predicate--> target relationship.
///
/// Textual fields are optional because upstream rows are not guaranteed to be
/// complete; incomplete triples are dropped by the graph builder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Triple {
    pub source_id: Option<String>,
    pub source_name: Option<String>,
    pub predicate: Option<String>,
    pub target_id: Option<String>,
    pub target_name: Option<String>,
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl Triple {
    /// Convenience constructor for a fully populated triple.
    pub fn new(
        source_id: &str,
        source_name: &str,
        predicate: &str,
        target_id: &str,
        target_name: &str,
    ) -> Self {
        Self {
            source_id: Some(source_id.to_string()),
            source_name: Some(source_name.to_string()),
            predicate: Some(predicate.to_string()),
            target_id: Some(target_id.to_string()),
            target_name: Some(target_name.to_string()),
            evidence: Vec::new(),
        }
    }

    pub fn with_evidence(mut self, evidence: &[&str]) -> Self {
        self.evidence = evidence.iter().map(|e| e.to_string()).collect();
        self
    }

    /// Parse one positional row. Non-string or empty text fields become `None`.
    pub fn from_value(index: usize, value: &Value) -> Result<Self> {
        let row = value.as_array().ok_or_else(|| BiokgError::MalformedTriple {
            index,
            reason: "expected a positional array".to_string(),
        })?;

        if row.len() < 5 {
            return Err(BiokgError::MalformedTriple {
                index,
                reason: format!("expected at least 5 fields, got {}", row.len()),
            });
        }

        let text = |pos: usize| -> Option<String> {
            row.get(pos)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        Ok(Self {
            source_id: text(0),
            source_name: text(1),
            predicate: text(2),
            target_id: text(3),
            target_name: text(4),
            evidence: row.get(6).map(parse_evidence).unwrap_or_default(),
        })
    }

    /// All five textual fields, or `None` if any is missing.
    pub fn fields(&self) -> Option<(&str, &str, &str, &str, &str)> {
        Some((
            self.source_id.as_deref()?,
            self.source_name.as_deref()?,
            self.predicate.as_deref()?,
            self.target_id.as_deref()?,
            self.target_name.as_deref()?,
        ))
    }
}

fn parse_evidence(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Parse the upstream triple list.
///
/// Fails fast if `value` is not an array. Rows that are not positional arrays
/// are skipped and logged.
pub fn parse_triples(value: &Value) -> Result<Vec<Triple>> {
    let rows = value.as_array().ok_or_else(|| {
        BiokgError::InvalidInput(format!(
            "triple list must be a JSON array, got {}",
            json_kind(value)
        ))
    })?;

    let mut triples = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match Triple::from_value(index, row) {
            Ok(triple) => triples.push(triple),
            Err(e) => log::debug!("Skipping row: {}", e),
        }
    }

    Ok(triples)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Which upstream operation produced the triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryKind {
    RunQuery,
    GetEverything,
    NetworkNeighborhood,
    FindPathway,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::RunQuery => "run-query",
            QueryKind::GetEverything => "get-everything",
            QueryKind::NetworkNeighborhood => "network-neighborhood",
            QueryKind::FindPathway => "find-pathway",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = BiokgError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "run-query" => Ok(QueryKind::RunQuery),
            "get-everything" => Ok(QueryKind::GetEverything),
            "network-neighborhood" => Ok(QueryKind::NetworkNeighborhood),
            "find-pathway" => Ok(QueryKind::FindPathway),
            other => Err(BiokgError::InvalidInput(format!(
                "unknown query kind: {}",
                other
            ))),
        }
    }
}

/// Context that accompanies a triple list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryContext {
    pub query_kind: QueryKind,
    #[serde(default)]
    pub predicate_used: Option<String>,
    #[serde(default)]
    pub query_entity_id: Option<String>,
    /// Caller-designated anchors (pathway endpoints, neighborhood seeds)
    #[serde(default)]
    pub anchor_ids: BTreeSet<String>,
}

impl QueryContext {
    pub fn new(query_kind: QueryKind) -> Self {
        Self {
            query_kind,
            predicate_used: None,
            query_entity_id: None,
            anchor_ids: BTreeSet::new(),
        }
    }

    /// Anchor ids plus the query subject, which is always an anchor.
    pub fn effective_anchors(&self) -> BTreeSet<String> {
        let mut anchors = self.anchor_ids.clone();
        if let Some(entity) = &self.query_entity_id {
            anchors.insert(entity.clone());
        }
        anchors
    }

    /// One-line description used as the report heading.
    pub fn summary(&self) -> String {
        match self.query_kind {
            QueryKind::FindPathway if !self.anchor_ids.is_empty() => {
                let anchors: Vec<&str> = self.anchor_ids.iter().map(String::as_str).collect();
                format!("pathway between {}", anchors.join(" and "))
            }
            _ => {
                let mut summary = self.query_kind.to_string();
                if let Some(entity) = &self.query_entity_id {
                    summary.push_str(&format!(" for {}", entity));
                }
                if let Some(predicate) = &self.predicate_used {
                    summary.push_str(&format!(" via {}", predicate));
                }
                summary
            }
        }
    }
}
