//! Runtime configuration
//!
//! Loaded from a JSON file (`herald.json`), with every field optional and
//! defaulted. The file is looked up next to the offer manifest, then in
//! the current directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection settings for the metadata store.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Base URL of the store's management API.
    pub base_url: String,
    /// Basic-auth user for the management API.
    pub user: String,
    /// Basic-auth password. Redacted from Debug output.
    pub password: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Accept the store's self-signed TLS certificate. Default deployments
    /// ship one, so this defaults to true.
    pub accept_invalid_certs: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:8080".into(),
            user: "admin".into(),
            password: "password".into(),
            timeout_secs: 30,
            accept_invalid_certs: true,
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Broker endpoint plus the host alias pair used when the store and the
/// broker see the provider under different names.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrokerConfig {
    /// IDS endpoint of the broker, e.g. `https://broker/infrastructure`.
    pub url: String,
    /// Host name the provider uses for itself locally.
    pub local_host: String,
    /// Host name the broker and other connectors reach the provider under.
    pub public_host: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "https://broker-reverseproxy/infrastructure".into(),
            local_host: "localhost".into(),
            public_host: "service-provider".into(),
        }
    }
}

/// Retry ladder for transient broker failures.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    /// Total attempts, first try included.
    pub attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Multiplier applied to the delay after each failed attempt.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay_ms: 500,
            multiplier: 3.0,
        }
    }
}

impl RetryConfig {
    /// Delay to sleep before retry number `n` (1-based).
    pub fn delay_for(&self, n: u32) -> Duration {
        let factor = self.multiplier.powi(n.saturating_sub(1) as i32);
        Duration::from_millis((self.base_delay_ms as f64 * factor) as u64)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeraldConfig {
    pub store: StoreConfig,
    pub broker: BrokerConfig,
    pub retry: RetryConfig,
}

impl HeraldConfig {
    pub const FILE_NAME: &'static str = "herald.json";

    /// Load configuration from an explicit path.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Look for `herald.json` next to `anchor`, then in the current
    /// directory. Missing file means defaults.
    pub fn discover(anchor: Option<&Path>) -> std::io::Result<Self> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(anchor) = anchor {
            if let Some(dir) = anchor.parent() {
                candidates.push(dir.join(Self::FILE_NAME));
            }
        }
        candidates.push(PathBuf::from(Self::FILE_NAME));

        for candidate in candidates {
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = HeraldConfig::default();
        assert_eq!(cfg.retry.attempts, 3);
        assert_eq!(cfg.broker.local_host, "localhost");
        assert!(cfg.store.base_url.starts_with("https://"));
    }

    #[test]
    fn store_debug_redacts_password() {
        let cfg = StoreConfig {
            password: "hunter2".into(),
            ..StoreConfig::default()
        };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: HeraldConfig =
            serde_json::from_str(r#"{"broker": {"publicHost": "edge"}}"#).unwrap();
        assert_eq!(cfg.broker.public_host, "edge");
        assert_eq!(cfg.broker.local_host, "localhost");
        assert_eq!(cfg.store.timeout_secs, 30);
    }

    #[test]
    fn retry_ladder_grows_geometrically() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay_for(1), Duration::from_millis(500));
        assert_eq!(retry.delay_for(2), Duration::from_millis(1500));
        assert_eq!(retry.delay_for(3), Duration::from_millis(4500));
    }
}
