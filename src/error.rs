use thiserror::Error;

/// Main error type for biokg
#[derive(Error, Debug)]
pub enum BiokgError {
    /// Input that cannot be interpreted at all (e.g. triple list is not an array)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A single triple that is missing required fields or is not positional
    #[error("Malformed triple at index {index}: {reason}")]
    MalformedTriple { index: usize, reason: String },

    /// One normalizer batch failed (status or transport); its ids stay unmapped
    #[error("Normalization batch {batch} failed: {reason}")]
    NormalizationBatch { batch: usize, reason: String },

    /// Normalizer record carries no `id.identifier`
    #[error("No merge target for {0}")]
    NoMergeTarget(String),

    /// Graph value lacks `nodes` or `links` arrays
    #[error("Invalid graph structure: {0}")]
    InvalidGraphStructure(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client construction / transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient Result type using BiokgError
pub type Result<T> = std::result::Result<T, BiokgError>;
