//! Canonicalization of node ids through an external normalization service.

pub mod client;

pub use client::NodeNormalizer;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::BiokgError;

/// Canonical identity for one input id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationRecord {
    pub canonical_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub ontology_types: Vec<String>,
}

impl NormalizationRecord {
    pub fn new(canonical_id: &str) -> Self {
        Self {
            canonical_id: canonical_id.to_string(),
            label: None,
            description: None,
            ontology_types: Vec::new(),
        }
    }
}

/// Input id -> record. Ids absent from the map are unmapped, not errors.
pub type NormalizationMap = HashMap<String, NormalizationRecord>;

/// Outcome of looking an id up in a [`NormalizationMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canonical<'a> {
    Mapped(&'a NormalizationRecord),
    Unmapped,
}

impl<'a> Canonical<'a> {
    pub fn resolve(id: &str, records: &'a NormalizationMap) -> Self {
        match records.get(id) {
            Some(record) => Canonical::Mapped(record),
            None => Canonical::Unmapped,
        }
    }
}

/// Wire shape of one normalizer entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawEntry {
    #[serde(default)]
    pub id: Option<RawIdentifier>,
    #[serde(default, rename = "type")]
    pub types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawIdentifier {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RawEntry {
    /// Convert to a record; entries without `id.identifier` have no merge target.
    pub(crate) fn into_record(self, input_id: &str) -> Result<NormalizationRecord, BiokgError> {
        let id = self.id.unwrap_or_default();
        let canonical_id = id
            .identifier
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| BiokgError::NoMergeTarget(input_id.to_string()))?;

        Ok(NormalizationRecord {
            canonical_id,
            label: id.label.filter(|s| !s.trim().is_empty()),
            description: id.description.filter(|s| !s.trim().is_empty()),
            ontology_types: self.types.unwrap_or_default(),
        })
    }
}

/// Parse a normalizer response body into records, dropping null entries and
/// entries without a merge target.
pub fn parse_response(body: &serde_json::Value) -> NormalizationMap {
    let Some(entries) = body.as_object() else {
        log::warn!("Normalizer response is not a JSON object; ignoring");
        return NormalizationMap::new();
    };

    let mut records = NormalizationMap::with_capacity(entries.len());
    for (input_id, value) in entries {
        if value.is_null() {
            continue;
        }
        let entry: RawEntry = match serde_json::from_value(value.clone()) {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Unparseable normalizer entry for {}: {}", input_id, e);
                continue;
            }
        };
        match entry.into_record(input_id) {
            Ok(record) => {
                records.insert(input_id.clone(), record);
            }
            Err(e) => log::debug!("{}", e),
        }
    }
    records
}
