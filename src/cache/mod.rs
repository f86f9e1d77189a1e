pub mod normalization_cache;

pub use normalization_cache::NormalizationCache;
