pub mod cache;
pub mod config;
pub mod error;
pub mod graph;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod triples;

pub use config::Config;
pub use error::{BiokgError, Result};
pub use graph::{Graph, Link, Node};
pub use normalize::{NodeNormalizer, NormalizationMap, NormalizationRecord};
pub use pipeline::{Pipeline, PreparedGraph};
pub use report::{PipelineArtifact, ReportCounters};
pub use triples::{parse_triples, QueryContext, QueryKind, Triple};
