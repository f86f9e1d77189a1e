use crate::cache::NormalizationCache;
use crate::config::{NormalizerConfig, MAX_BATCH_SIZE};
use crate::error::{BiokgError, Result};
use crate::normalize::{parse_response, NormalizationMap};
use reqwest::{Client, StatusCode};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Longest error body echoed into logs
const MAX_ERROR_BODY: usize = 200;

/// Client for the node normalization service
///
/// Sends ids in sequential batches with a fixed pause between them. A batch
/// that fails (transport error, timeout, non-success status) is logged and
/// skipped: its ids are simply left out of the result map.
pub struct NodeNormalizer {
    client: Client,
    base_url: String,
    batch_size: usize,
    batch_delay: Duration,
    max_retries: usize,
    cache: Option<Arc<NormalizationCache>>,
}

impl NodeNormalizer {
    /// Create a new normalizer client without a cache
    ///
    /// # Arguments
    ///
    /// * `config` - Normalizer section of the configuration; `timeout_secs`
    ///   becomes the per-request timeout
    pub fn new(config: &NormalizerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            batch_size: config.batch_size.clamp(1, MAX_BATCH_SIZE),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            max_retries: config.max_retries,
            cache: None,
        })
    }

    /// Create a normalizer client, with an LRU cache when `cache_capacity > 0`
    pub fn from_config(config: &NormalizerConfig) -> Result<Self> {
        let cache = (config.cache_capacity > 0)
            .then(|| Arc::new(NormalizationCache::new(config.cache_capacity)));
        Ok(Self::new(config)?.with_cache(cache))
    }

    /// Attach (or detach) a shared record cache
    pub fn with_cache(mut self, cache: Option<Arc<NormalizationCache>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Normalize a list of ids
    ///
    /// Duplicates are sent once. Never fails: ids whose batch failed, or for
    /// which the service has no answer, are absent from the returned map.
    pub async fn normalize(&self, ids: &[String]) -> NormalizationMap {
        let mut records = NormalizationMap::new();
        let mut seen = HashSet::new();
        let mut pending = Vec::new();

        for id in ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            match self.cache.as_ref().and_then(|c| c.get(id)) {
                Some(record) => {
                    records.insert(id.clone(), record);
                }
                None => pending.push(id.clone()),
            }
        }

        if !records.is_empty() {
            log::debug!("Normalization cache hits: {}", records.len());
        }

        let total_batches = (pending.len() + self.batch_size - 1) / self.batch_size;
        let mut failed_batches = 0usize;

        for (batch, chunk) in pending.chunks(self.batch_size).enumerate() {
            if batch > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let start = std::time::Instant::now();
            match self.fetch_batch(batch, chunk).await {
                Ok(batch_records) => {
                    log::debug!(
                        "Normalizer batch {}/{}: {} of {} ids mapped in {:?}",
                        batch + 1,
                        total_batches,
                        batch_records.len(),
                        chunk.len(),
                        start.elapsed()
                    );
                    if let Some(cache) = &self.cache {
                        for (id, record) in &batch_records {
                            cache.put(id.clone(), record.clone());
                        }
                    }
                    records.extend(batch_records);
                }
                Err(e) => {
                    failed_batches += 1;
                    log::warn!("{}; {} ids left unmapped", e, chunk.len());
                }
            }
        }

        log::info!(
            "Normalized {} of {} ids ({} batches, {} failed)",
            records.len(),
            seen.len(),
            total_batches,
            failed_batches
        );

        records
    }

    /// Single batch request, retrying 429/5xx with exponential backoff
    async fn fetch_batch(&self, batch: usize, ids: &[String]) -> Result<NormalizationMap> {
        let mut query: Vec<(&str, &str)> = ids.iter().map(|id| ("curie", id.as_str())).collect();
        query.extend([
            ("conflate", "true"),
            ("drug_chemical_conflate", "false"),
            ("description", "true"),
            ("individual_types", "true"),
        ]);

        let mut attempt = 0;
        let mut delay = self.batch_delay.max(Duration::from_millis(100));

        loop {
            let response = self
                .client
                .get(&self.base_url)
                .query(&query)
                .send()
                .await
                .map_err(|e| batch_error(batch, format!("transport error: {}", e)))?;

            let status = response.status();

            if status.is_success() {
                let body: serde_json::Value = response
                    .json()
                    .await
                    .map_err(|e| batch_error(batch, format!("failed to parse response: {}", e)))?;
                return Ok(parse_response(&body));
            }

            if is_retryable(status) && attempt < self.max_retries {
                attempt += 1;
                log::warn!(
                    "Normalizer batch {} returned {}; retry {}/{}",
                    batch,
                    status,
                    attempt,
                    self.max_retries
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                continue;
            }

            let mut body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|&i| body.is_char_boundary(i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(batch_error(batch, format!("HTTP {}: {}", status, body)));
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn batch_error(batch: usize, reason: String) -> BiokgError {
    BiokgError::NormalizationBatch { batch, reason }
}
