//! Process configuration loaded from the environment.
//!
//! Values come from real environment variables, optionally seeded from a
//! `.env` file. Missing API keys are allowed (the provider will reject the
//! call) but are warned about at startup.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::providers::{
    BSCSCAN_BASE_URL, BscScan, COVALENT_BASE_URL, Covalent, LIVECOINWATCH_BASE_URL, LiveCoinWatch,
    Providers,
};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("{var} must be an absolute http(s) URL, got {value:?}")]
    UnsupportedUrl { var: &'static str, value: String },

    #[error("{var} must be a whole number of seconds greater than zero, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub upstream_timeout: Duration,
    pub covalent_api_key: String,
    pub bscscan_api_key: String,
    pub livecoinwatch_api_key: String,
    /// Key for the price lookups; `LCW_API_KEY`, else the listing key.
    pub livecoinwatch_price_api_key: String,
    pub covalent_base_url: Url,
    pub bscscan_base_url: Url,
    pub livecoinwatch_base_url: Url,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let key = |name: &'static str| {
            var(name).unwrap_or_else(|| {
                warn!(var = name, "API key not set; calls to this provider will be rejected");
                String::new()
            })
        };

        let base_url = |name: &'static str, default: &str| -> Result<Url, ConfigError> {
            let raw = var(name).unwrap_or_else(|| default.to_owned());
            let url = Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { var: name, source })?;
            if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::UnsupportedUrl {
                    var: name,
                    value: raw,
                });
            }
            Ok(url)
        };

        let upstream_timeout = match var("UPSTREAM_TIMEOUT_SECS") {
            None => DEFAULT_UPSTREAM_TIMEOUT,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        var: "UPSTREAM_TIMEOUT_SECS",
                        value: raw,
                    });
                }
            },
        };

        let livecoinwatch_api_key = key("LIVECOINWATCH_API_KEY");
        let livecoinwatch_price_api_key =
            var("LCW_API_KEY").unwrap_or_else(|| livecoinwatch_api_key.clone());

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned()),
            upstream_timeout,
            covalent_api_key: key("COVALENT_API_KEY"),
            bscscan_api_key: key("BSC_API_KEY"),
            livecoinwatch_api_key,
            livecoinwatch_price_api_key,
            covalent_base_url: base_url("COVALENT_BASE_URL", COVALENT_BASE_URL)?,
            bscscan_base_url: base_url("BSCSCAN_BASE_URL", BSCSCAN_BASE_URL)?,
            livecoinwatch_base_url: base_url("LIVECOINWATCH_BASE_URL", LIVECOINWATCH_BASE_URL)?,
        })
    }

    /// Request builders for every provider, keyed from this configuration.
    pub fn providers(&self) -> Providers {
        Providers {
            covalent: Covalent::new(self.covalent_base_url.clone(), &self.covalent_api_key),
            bscscan: BscScan::new(self.bscscan_base_url.clone(), &self.bscscan_api_key),
            livecoinwatch: LiveCoinWatch::new(
                self.livecoinwatch_base_url.clone(),
                &self.livecoinwatch_api_key,
                &self.livecoinwatch_price_api_key,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(30));
        assert_eq!(cfg.covalent_api_key, "");
        assert_eq!(cfg.covalent_base_url.as_str(), "https://api.covalenthq.com/");
        assert_eq!(cfg.livecoinwatch_base_url.as_str(), "https://api.livecoinwatch.com/");
    }

    #[test]
    fn price_key_falls_back_to_listing_key() {
        let cfg = load(&[("LIVECOINWATCH_API_KEY", "listing")]).unwrap();
        assert_eq!(cfg.livecoinwatch_price_api_key, "listing");

        let cfg = load(&[("LIVECOINWATCH_API_KEY", "listing"), ("LCW_API_KEY", "price")]).unwrap();
        assert_eq!(cfg.livecoinwatch_api_key, "listing");
        assert_eq!(cfg.livecoinwatch_price_api_key, "price");
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = load(&[("BIND_ADDR", "  "), ("BSC_API_KEY", " k ")]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(cfg.bscscan_api_key, "k");
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = load(&[
            ("BIND_ADDR", "0.0.0.0:9000"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
            ("COVALENT_BASE_URL", "http://127.0.0.1:4000/cov"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:9000");
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(5));
        assert_eq!(cfg.covalent_base_url.as_str(), "http://127.0.0.1:4000/cov");
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(matches!(
            load(&[("UPSTREAM_TIMEOUT_SECS", "0")]),
            Err(ConfigError::InvalidTimeout { .. })
        ));
        assert!(matches!(
            load(&[("UPSTREAM_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::InvalidTimeout { .. })
        ));
        assert!(matches!(
            load(&[("BSCSCAN_BASE_URL", "not a url")]),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            load(&[("LIVECOINWATCH_BASE_URL", "mailto:ops@example.com")]),
            Err(ConfigError::UnsupportedUrl { .. })
        ));
    }

    #[test]
    fn providers_use_configured_keys() {
        let cfg = load(&[("COVALENT_API_KEY", "ck"), ("LCW_API_KEY", "pk")]).unwrap();
        let providers = cfg.providers();
        assert!(providers.covalent.balances(56, "0x1").url.as_str().ends_with("key=ck"));
        assert_eq!(
            providers.livecoinwatch.price("BTC").headers.get("x-api-key"),
            Some("pk")
        );
    }
}
