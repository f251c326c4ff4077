use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bind address (default: "0.0.0.0")
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Port number (default: 3000)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upstream product service
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Credential policy
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Upstream product service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base address; `/products` and `/product` are appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds. Unset means the transport default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:8001/api/web/v1".to_string()
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Reject product requests that carry no bearer credential
    #[serde(default)]
    pub require_credential: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            upstream: UpstreamConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

/// Values given on the command line. Each one overrides file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub upstream_url: Option<String>,
    pub upstream_timeout_secs: Option<u64>,
    pub require_credential: bool,
}

impl Config {
    /// Load configuration from file, environment, and CLI arguments
    pub fn load(config_path: Option<&PathBuf>, cli: &Overrides) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else if let Ok(content) = std::fs::read_to_string("storefront.toml") {
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.apply_overrides(cli);
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = var("STOREFRONT_BIND") {
            self.bind = bind;
        }
        if let Some(port) = var("STOREFRONT_PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Some(url) = var("STOREFRONT_UPSTREAM_URL") {
            self.upstream.base_url = url;
        }
        if let Some(secs) = var("STOREFRONT_UPSTREAM_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.upstream.timeout_secs = Some(secs);
        }
        if let Some(flag) = var("STOREFRONT_REQUIRE_CREDENTIAL") {
            self.auth.require_credential = matches!(flag.as_str(), "1" | "true" | "yes");
        }
    }

    fn apply_overrides(&mut self, cli: &Overrides) {
        if let Some(bind) = &cli.bind {
            self.bind = bind.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(url) = &cli.upstream_url {
            self.upstream.base_url = url.clone();
        }
        if let Some(secs) = cli.upstream_timeout_secs {
            self.upstream.timeout_secs = Some(secs);
        }
        if cli.require_credential {
            self.auth.require_credential = true;
        }
    }
}
