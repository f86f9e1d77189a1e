//! Drops triples that touch unreliable ids or carry excluded predicates.

use std::collections::BTreeSet;

use super::Triple;

/// Result of [`filter_noise`].
#[derive(Debug, Clone, Default)]
pub struct NoiseFilterOutcome {
    pub triples: Vec<Triple>,
    /// Triples dropped for any reason
    pub removed_triples: usize,
    /// Size of the unreliable-id removal set
    pub removed_node_ids: usize,
}

/// True if `predicate` matches one of `excluded`, ignoring any namespace
/// prefix on either side (`biolink:transcribed_from` == `transcribed_from`).
pub fn is_excluded_predicate(predicate: &str, excluded: &[String]) -> bool {
    let bare = strip_namespace(predicate);
    excluded.iter().any(|e| strip_namespace(e) == bare)
}

fn strip_namespace(predicate: &str) -> &str {
    predicate.rsplit_once(':').map(|(_, p)| p).unwrap_or(predicate)
}

pub fn filter_noise(
    triples: &[Triple],
    removal_ids: &BTreeSet<String>,
    excluded_predicates: &[String],
) -> NoiseFilterOutcome {
    let kept: Vec<Triple> = triples
        .iter()
        .filter(|t| {
            let touches_removed = [&t.source_id, &t.target_id]
                .into_iter()
                .flatten()
                .any(|id| removal_ids.contains(id));
            let excluded = t
                .predicate
                .as_deref()
                .is_some_and(|p| is_excluded_predicate(p, excluded_predicates));
            !touches_removed && !excluded
        })
        .cloned()
        .collect();

    let removed_triples = triples.len() - kept.len();
    if removed_triples > 0 {
        log::info!(
            "Noise filter removed {} triples ({} unreliable ids)",
            removed_triples,
            removal_ids.len()
        );
    }

    NoiseFilterOutcome {
        triples: kept,
        removed_triples,
        removed_node_ids: removal_ids.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn excluded() -> Vec<String> {
        vec!["transcribed_from".to_string()]
    }

    #[test]
    fn test_transcribed_from_always_dropped() {
        let triples = vec![
            Triple::new("NCBIGene:1", "A", "transcribed_from", "NCBIGene:2", "B"),
            Triple::new("NCBIGene:1", "A", "biolink:transcribed_from", "NCBIGene:2", "B"),
            Triple::new("NCBIGene:1", "A", "biolink:related_to", "NCBIGene:2", "B"),
        ];
        let out = filter_noise(&triples, &BTreeSet::new(), &excluded());
        assert_eq!(out.triples.len(), 1);
        assert_eq!(out.removed_triples, 2);
        assert_eq!(out.removed_node_ids, 0);
    }

    #[test]
    fn test_removal_ids_drop_either_endpoint() {
        let removal = BTreeSet::from(["CAID:CA1".to_string()]);
        let triples = vec![
            Triple::new("CAID:CA1", "v", "biolink:related_to", "NCBIGene:2", "B"),
            Triple::new("NCBIGene:2", "B", "biolink:related_to", "CAID:CA1", "v"),
            Triple::new("NCBIGene:2", "B", "biolink:related_to", "MONDO:1", "D"),
        ];
        let out = filter_noise(&triples, &removal, &excluded());
        assert_eq!(out.triples.len(), 1);
        assert_eq!(out.triples[0].target_id.as_deref(), Some("MONDO:1"));
        assert_eq!(out.removed_triples, 2);
        assert_eq!(out.removed_node_ids, 1);
    }

    #[test]
    fn test_incomplete_triples_pass_through() {
        let mut t = Triple::new("A:1", "a", "biolink:related_to", "B:1", "b");
        t.predicate = None;
        let out = filter_noise(&[t], &BTreeSet::new(), &excluded());
        assert_eq!(out.triples.len(), 1);
    }

    #[test]
    fn test_is_excluded_predicate_namespace_insensitive() {
        let list = vec!["biolink:transcribed_from".to_string()];
        assert!(is_excluded_predicate("transcribed_from", &list));
        assert!(!is_excluded_predicate("biolink:treats", &list));
    }
}
