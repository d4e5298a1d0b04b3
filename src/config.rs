//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! field has a default, so a partial file (or none at all) still yields a
//! runnable configuration. Secrets (the explorer API key) are referenced by
//! env-var name in the config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::explorer::token::TokenTarget;
use crate::explorer::Endpoints;
use crate::http::HttpSettings;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub run: RunConfig,
    pub http: HttpConfig,
    pub explorers: ExplorersConfig,
    pub token: TokenConfig,
    pub files: FilesConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunConfig {
    /// Maximum number of addresses resolved at the same time.
    pub max_concurrency: usize,
    /// Resolver attempts per address before giving up.
    pub max_attempts: u32,
    /// Fixed pause between attempts for one address.
    pub retry_backoff_ms: u64,
    /// Report addresses that failed every attempt as `unresolved` instead
    /// of folding them into zero balances.
    pub strict_unresolved: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 100,
            max_attempts: 3,
            retry_backoff_ms: 1000,
            strict_unresolved: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Extra tries for a single request answered with 429 or 5xx.
    pub status_retries: u32,
    pub status_backoff_ms: u64,
    pub user_agent: String,
    /// Name of the env var holding the TronGrid API key.
    pub api_key_env: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            status_retries: 3,
            status_backoff_ms: 1000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                .to_string(),
            api_key_env: "TRON_PRO_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExplorersConfig {
    pub trongrid_url: String,
    pub tronscan_url: String,
}

impl Default for ExplorersConfig {
    fn default() -> Self {
        Self {
            trongrid_url: "https://api.trongrid.io".to_string(),
            tronscan_url: "https://apilist.tronscanapi.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TokenConfig {
    pub contract: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            contract: "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".to_string(),
            symbol: "USDT".to_string(),
            name: "Tether USD".to_string(),
            decimals: crate::types::DEFAULT_TOKEN_DECIMALS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilesConfig {
    pub addresses: String,
    pub proxies: String,
    pub output: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            addresses: "trx_address.txt".to_string(),
            proxies: "proxy.txt".to_string(),
            output: "trx_balance.txt".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// The explorer API key, if its env var is set and non-empty.
    pub fn api_key(&self) -> Option<SecretString> {
        Self::resolve_env(&self.http.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::new)
    }

    pub fn token_target(&self) -> TokenTarget {
        TokenTarget {
            contract: self.token.contract.clone(),
            symbol: self.token.symbol.clone(),
            name: self.token.name.clone(),
            decimals: self.token.decimals,
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.explorers.trongrid_url, &self.explorers.tronscan_url)
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.http.timeout_secs),
            status_retries: self.http.status_retries,
            status_backoff: Duration::from_millis(self.http.status_backoff_ms),
            user_agent: self.http.user_agent.clone(),
            api_key: self.api_key(),
        }
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.run.retry_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.run.max_concurrency, 100);
        assert_eq!(cfg.run.max_attempts, 3);
        assert_eq!(cfg.http.timeout_secs, 15);
        assert_eq!(cfg.token.symbol, "USDT");
        assert_eq!(cfg.token.decimals, 6);
        assert_eq!(cfg.files.output, "trx_balance.txt");
        assert!(!cfg.run.strict_unresolved);
    }

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let cfg = AppConfig::parse(
            r#"
            [run]
            max_concurrency = 8

            [token]
            contract = "TXYZ"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.run.max_concurrency, 8);
        assert_eq!(cfg.run.max_attempts, 3);
        assert_eq!(cfg.token.contract, "TXYZ");
        assert_eq!(cfg.token.name, "Tether USD");
        assert_eq!(cfg.explorers.trongrid_url, "https://api.trongrid.io");
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(AppConfig::parse("[run]\nmax_concurrency = \"lots\"").is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let cfg = AppConfig::load_or_default("/tmp/tron_balances_missing_config.toml").unwrap();
        assert_eq!(cfg.run.max_concurrency, 100);
    }

    #[test]
    fn test_load_config() {
        // Only meaningful when run from the crate root.
        if let Ok(cfg) = AppConfig::load("config.toml") {
            assert!(cfg.run.max_concurrency > 0);
            assert!(cfg.run.max_attempts > 0);
            assert!(!cfg.token.contract.is_empty());
        }
    }

    #[test]
    fn test_token_target_from_config() {
        let target = AppConfig::default().token_target();
        assert_eq!(target.contract, "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t");
        assert_eq!(target.decimals, 6);
    }

    #[test]
    fn test_api_key_unset_env_var() {
        let mut cfg = AppConfig::default();
        cfg.http.api_key_env = "TRON_BALANCES_TEST_UNSET_KEY_VAR".to_string();
        assert!(cfg.api_key().is_none());
    }
}
