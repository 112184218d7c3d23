use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub web: WebConfig,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL clients reach this service at, used to rewrite
    /// referer-gated streams through the proxy relay. Empty disables
    /// rewriting and streams carry proxyHeaders hints instead.
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub max_retries: u32,
    pub timeout_seconds: u64,
    pub proxy_timeout_seconds: u64,
    /// Hostname substrings for which TLS certificate verification is
    /// skipped. Scoped compatibility exception, never applied globally.
    pub insecure_hosts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub catalog_ttl_seconds: u64,
    pub meta_ttl_seconds: u64,
    pub stream_ttl_seconds: u64,
    pub max_entries_per_namespace: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig {
                host: "0.0.0.0".to_string(),
                port: 7700,
                base_url: String::new(),
            },
            fetch: FetchConfig {
                max_retries: 3,
                timeout_seconds: 15,
                proxy_timeout_seconds: 30,
                insecure_hosts: vec!["gxtube".to_string()],
            },
            cache: CacheConfig {
                catalog_ttl_seconds: 300,
                meta_ttl_seconds: 600,
                stream_ttl_seconds: 120,
                max_entries_per_namespace: 10_000,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(&config_file)
    }

    pub fn load_from(config_file: &str) -> Result<Self> {
        if std::path::Path::new(config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            Ok(default_config)
        }
    }
}
