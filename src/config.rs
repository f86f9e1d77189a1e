use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub biokg: BiokgConfig,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// General settings
#[derive(Debug, Clone, Deserialize)]
pub struct BiokgConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BiokgConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// External node normalization service settings
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizerConfig {
    #[serde(default = "default_normalizer_url")]
    pub base_url: String,
    /// Maximum ids per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between consecutive batches
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries for 429/5xx responses before the batch is skipped
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// LRU capacity for normalization records; 0 disables caching
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            base_url: default_normalizer_url(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Identifier preprocessing and noise filtering rules
#[derive(Debug, Clone, Deserialize)]
pub struct PreprocessConfig {
    /// Prefixes whose ids may carry a `-<n>` version suffix (e.g. UniProtKB isoforms)
    #[serde(default = "default_versioned_prefixes")]
    pub versioned_prefixes: Vec<String>,
    /// Id prefixes considered unreliable; triples touching them are dropped
    #[serde(default = "default_unreliable_prefixes")]
    pub unreliable_prefixes: Vec<String>,
    /// Predicates too granular to be graph-worthy (namespace optional)
    #[serde(default = "default_excluded_predicates")]
    pub excluded_predicates: Vec<String>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            versioned_prefixes: default_versioned_prefixes(),
            unreliable_prefixes: default_unreliable_prefixes(),
            excluded_predicates: default_excluded_predicates(),
        }
    }
}

/// Connectivity filter settings
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Non-anchor nodes need strictly more connections than this to survive
    #[serde(default = "default_min_connections")]
    pub min_connections: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_connections: default_min_connections(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_normalizer_url() -> String {
    "https://nodenorm.transltr.io/1.5/get_normalized_nodes".to_string()
}

fn default_batch_size() -> usize {
    100
}

fn default_batch_delay_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    2
}

fn default_cache_capacity() -> usize {
    5000
}

fn default_versioned_prefixes() -> Vec<String> {
    vec![
        "UniProtKB".to_string(),
        "PR".to_string(),
        "ENSEMBL".to_string(),
    ]
}

fn default_unreliable_prefixes() -> Vec<String> {
    vec!["CAID:".to_string()]
}

fn default_excluded_predicates() -> Vec<String> {
    vec!["transcribed_from".to_string()]
}

fn default_min_connections() -> usize {
    1
}

/// Hard cap on ids per normalizer request (keeps GET URLs bounded)
pub const MAX_BATCH_SIZE: usize = 1000;

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in BIOKG_CONFIG environment variable
    /// 2. ./config.toml in current directory
    ///
    /// `BIOKG_NORMALIZER_URL` overrides `normalizer.base_url` when set.
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var("BIOKG_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config = Self::from_toml_str(&config_str)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `BIOKG_NORMALIZER_URL` and revalidate
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("BIOKG_NORMALIZER_URL") {
            self.normalizer.base_url = url;
            self.validate().context("Invalid BIOKG_NORMALIZER_URL override")?;
        }
        Ok(())
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.normalizer.base_url).with_context(|| {
            format!(
                "normalizer.base_url is not a valid URL: {}",
                self.normalizer.base_url
            )
        })?;

        if self.normalizer.batch_size == 0 {
            anyhow::bail!("normalizer.batch_size must be greater than 0");
        }

        if self.normalizer.batch_size > MAX_BATCH_SIZE {
            anyhow::bail!(
                "normalizer.batch_size must be at most {} (got {})",
                MAX_BATCH_SIZE,
                self.normalizer.batch_size
            );
        }

        if self.normalizer.timeout_secs == 0 {
            anyhow::bail!("normalizer.timeout_secs must be greater than 0");
        }

        if self.preprocess.versioned_prefixes.iter().any(|p| p.trim().is_empty()) {
            anyhow::bail!("preprocess.versioned_prefixes must not contain empty entries");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    const TEST_CONFIG: &str = r#"
[biokg]
log_level = "debug"

[normalizer]
base_url = "http://127.0.0.1:9999/get_normalized_nodes"
batch_size = 50
batch_delay_ms = 0
max_retries = 0

[preprocess]
unreliable_prefixes = ["CAID:", "BAD:"]

[filter]
min_connections = 2
"#;

    fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        let originals: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(k, _)| (k.to_string(), std::env::var(k).ok()))
            .collect();
        for (k, v) in vars {
            match v {
                Some(v) => std::env::set_var(k, v),
                None => std::env::remove_var(k),
            }
        }
        f();
        for (k, v) in originals {
            match v {
                Some(v) => std::env::set_var(&k, v),
                None => std::env::remove_var(&k),
            }
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.normalizer.batch_size, 100);
        assert_eq!(config.filter.min_connections, 1);
        assert_eq!(config.preprocess.excluded_predicates, vec!["transcribed_from"]);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = Config::from_toml_str(TEST_CONFIG).unwrap();
        assert_eq!(config.biokg.log_level, "debug");
        assert_eq!(config.normalizer.batch_size, 50);
        assert_eq!(config.normalizer.timeout_secs, 30);
        assert_eq!(config.preprocess.unreliable_prefixes, vec!["CAID:", "BAD:"]);
        assert_eq!(config.preprocess.versioned_prefixes.len(), 3);
        assert_eq!(config.filter.min_connections, 2);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.normalizer.base_url, default_normalizer_url());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let err = Config::from_toml_str("[normalizer]\nbatch_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_oversized_batch_rejected() {
        let err = Config::from_toml_str("[normalizer]\nbatch_size = 5000\n").unwrap_err();
        assert!(err.to_string().contains("at most"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = Config::from_toml_str("[normalizer]\nbase_url = \"not a url\"\n").unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_load_from_env_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("biokg.toml");
        fs::write(&config_path, TEST_CONFIG).unwrap();
        let path = config_path.to_str().unwrap().to_string();
        with_env(
            &[("BIOKG_CONFIG", Some(&path)), ("BIOKG_NORMALIZER_URL", None)],
            || {
                let config = Config::load();
                assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
                assert_eq!(config.unwrap().normalizer.batch_size, 50);
            },
        );
    }

    #[test]
    fn test_load_applies_url_override() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("biokg.toml");
        fs::write(&config_path, TEST_CONFIG).unwrap();
        let path = config_path.to_str().unwrap().to_string();
        with_env(
            &[
                ("BIOKG_CONFIG", Some(&path)),
                ("BIOKG_NORMALIZER_URL", Some("http://localhost:1234/norm")),
            ],
            || {
                let config = Config::load().unwrap();
                assert_eq!(config.normalizer.base_url, "http://localhost:1234/norm");
            },
        );
    }

    #[test]
    fn test_env_override_on_defaults_is_validated() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        with_env(&[("BIOKG_NORMALIZER_URL", Some("not a url"))], || {
            let mut config = Config::default();
            let err = config.apply_env_overrides().unwrap_err();
            assert!(err.to_string().contains("BIOKG_NORMALIZER_URL"));
        });
        with_env(&[("BIOKG_NORMALIZER_URL", Some("http://localhost:1234/norm"))], || {
            let mut config = Config::default();
            config.apply_env_overrides().unwrap();
            assert_eq!(config.normalizer.base_url, "http://localhost:1234/norm");
        });
    }

    #[test]
    fn test_load_missing_file() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        with_env(&[("BIOKG_CONFIG", Some("nonexistent-biokg.toml"))], || {
            let config = Config::load();
            assert!(config.is_err());
            assert!(config.unwrap_err().to_string().contains("nonexistent-biokg.toml"));
        });
    }
}
