//! Entity classification tables.
//!
//! Two independent tables: a CURIE-prefix heuristic used while building the
//! graph, and a Biolink category table applied once the normalizer has
//! returned ontology types. The latter wins whenever it matches.

use super::EntityType;

const PREFIX_TABLE: &[(&str, EntityType)] = &[
    ("NCBIGene", EntityType::Gene),
    ("HGNC", EntityType::Gene),
    ("ENSEMBL", EntityType::Gene),
    ("OMIM", EntityType::Gene),
    ("UniProtKB", EntityType::Protein),
    ("PR", EntityType::Protein),
    ("MONDO", EntityType::Disease),
    ("DOID", EntityType::Disease),
    ("ORPHANET", EntityType::Disease),
    ("MESH", EntityType::Disease),
    ("UMLS", EntityType::Disease),
    ("HP", EntityType::Phenotype),
    ("DRUGBANK", EntityType::Drug),
    ("CHEMBL.COMPOUND", EntityType::Drug),
    ("RXCUI", EntityType::Drug),
    ("CHEBI", EntityType::Chemical),
    ("PUBCHEM.COMPOUND", EntityType::Chemical),
    ("UNII", EntityType::Chemical),
    ("GO", EntityType::BiologicalProcess),
    ("REACT", EntityType::Pathway),
    ("KEGG", EntityType::Pathway),
    ("WIKIPATHWAYS", EntityType::Pathway),
    ("UBERON", EntityType::Anatomy),
    ("CL", EntityType::Cell),
];

// Normalizer type lists are most specific first; the first listed type found here wins.
const ONTOLOGY_TABLE: &[(&str, EntityType)] = &[
    ("biolink:Gene", EntityType::Gene),
    ("biolink:Protein", EntityType::Protein),
    ("biolink:Polypeptide", EntityType::Protein),
    ("biolink:Disease", EntityType::Disease),
    ("biolink:PhenotypicFeature", EntityType::Phenotype),
    ("biolink:DiseaseOrPhenotypicFeature", EntityType::Disease),
    ("biolink:Drug", EntityType::Drug),
    ("biolink:SmallMolecule", EntityType::Chemical),
    ("biolink:MolecularMixture", EntityType::Chemical),
    ("biolink:ChemicalEntity", EntityType::Chemical),
    ("biolink:BiologicalProcess", EntityType::BiologicalProcess),
    ("biolink:MolecularActivity", EntityType::BiologicalProcess),
    ("biolink:Pathway", EntityType::Pathway),
    ("biolink:Cell", EntityType::Cell),
    ("biolink:AnatomicalEntity", EntityType::Anatomy),
];

/// Classify by CURIE prefix (`NCBIGene:7157` -> Gene). Unknown -> `Other`.
pub fn classify_by_prefix(id: &str) -> EntityType {
    let prefix = id.split_once(':').map(|(p, _)| p).unwrap_or(id);
    PREFIX_TABLE
        .iter()
        .find(|(p, _)| p.eq_ignore_ascii_case(prefix))
        .map(|(_, t)| *t)
        .unwrap_or(EntityType::Other)
}

/// Classify by normalizer ontology types; `None` if nothing in the list is known.
pub fn classify_by_ontology_types(types: &[String]) -> Option<EntityType> {
    types.iter().find_map(|ty| {
        ONTOLOGY_TABLE
            .iter()
            .find(|(name, _)| name == ty)
            .map(|(_, t)| *t)
    })
}
