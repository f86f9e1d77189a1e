//! Versioned-identifier collapse and unreliable-id tagging.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;

use super::Triple;
use crate::config::PreprocessConfig;
use crate::error::{BiokgError, Result};

/// Output of [`preprocess_triples`].
#[derive(Debug, Clone, Default)]
pub struct Preprocessed {
    /// Triples with versioned ids collapsed to their base form.
    pub triples: Vec<Triple>,
    /// Collapsed id -> every raw id seen for it (always includes the raw form).
    pub aliases: HashMap<String, BTreeSet<String>>,
    /// Collapsed ids carrying an unreliable prefix.
    pub removal_ids: BTreeSet<String>,
}

impl Preprocessed {
    /// Raw ids recorded for `id`, falling back to `id` itself.
    pub fn raw_ids(&self, id: &str) -> BTreeSet<String> {
        self.aliases
            .get(id)
            .cloned()
            .unwrap_or_else(|| BTreeSet::from([id.to_string()]))
    }
}

/// Compiled identifier rules.
#[derive(Debug, Clone)]
pub struct IdRules {
    versioned: Option<Regex>,
    unreliable_prefixes: Vec<String>,
}

impl IdRules {
    pub fn new(config: &PreprocessConfig) -> Result<Self> {
        let versioned = if config.versioned_prefixes.is_empty() {
            None
        } else {
            let alternation = config
                .versioned_prefixes
                .iter()
                .map(|p| regex::escape(p.trim_end_matches(':')))
                .collect::<Vec<_>>()
                .join("|");
            // `PREFIX:BASE-<digits>`; BASE itself carries no dash
            let pattern = format!(r"^((?:{}):[^\s-]+)-\d+$", alternation);
            Some(Regex::new(&pattern).map_err(|e| {
                BiokgError::Config(format!("invalid versioned prefix pattern: {}", e))
            })?)
        };

        Ok(Self {
            versioned,
            unreliable_prefixes: config.unreliable_prefixes.clone(),
        })
    }

    /// Strip a version suffix, e.g. `UniProtKB:P04637-2` -> `UniProtKB:P04637`.
    pub fn collapse<'a>(&self, id: &'a str) -> &'a str {
        self.versioned
            .as_ref()
            .and_then(|re| re.captures(id))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or(id)
    }

    pub fn is_unreliable(&self, id: &str) -> bool {
        self.unreliable_prefixes.iter().any(|p| id.starts_with(p.as_str()))
    }
}

static DEFAULT_RULES: OnceLock<Option<IdRules>> = OnceLock::new();

/// Collapse a single id with the default rules (compiled once).
pub fn collapse_versioned_id(id: &str) -> String {
    DEFAULT_RULES
        .get_or_init(|| IdRules::new(&PreprocessConfig::default()).ok())
        .as_ref()
        .map_or(id, |rules| rules.collapse(id))
        .to_string()
}

/// Collapse versioned ids and collect removal candidates.
///
/// Returns a fresh triple list; the input is left untouched.
pub fn preprocess_triples(triples: &[Triple], rules: &IdRules) -> Preprocessed {
    let mut out = Preprocessed {
        triples: Vec::with_capacity(triples.len()),
        ..Default::default()
    };

    for triple in triples {
        let mut triple = triple.clone();
        for slot in [&mut triple.source_id, &mut triple.target_id] {
            if let Some(raw) = slot.take() {
                let collapsed = rules.collapse(&raw).to_string();
                if rules.is_unreliable(&collapsed) {
                    out.removal_ids.insert(collapsed.clone());
                }
                out.aliases
                    .entry(collapsed.clone())
                    .or_default()
                    .insert(raw);
                *slot = Some(collapsed);
            }
        }
        out.triples.push(triple);
    }

    log::debug!(
        "Preprocessed {} triples: {} distinct ids, {} flagged unreliable",
        out.triples.len(),
        out.aliases.len(),
        out.removal_ids.len()
    );

    out
}
