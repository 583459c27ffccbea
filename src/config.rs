//! Gateway configuration
//!
//! Settings come from an optional YAML file (path in `GEMGATE_CONFIG`),
//! followed by environment overrides for the most common knobs.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub render: RenderConfig,
    /// Echo raw protocol lines to the log and lower the log level to DEBUG
    pub debug: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

/// Gemini client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Deadline for TCP connect plus TLS handshake
    pub connect_timeout_secs: u64,

    /// Deadline for the status line and for each body line
    pub read_timeout_secs: u64,

    /// Redirect hops followed before giving up
    pub max_redirects: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Path that gemini links are rewritten to, with the target in `?url=`
    pub gateway_path: String,

    /// Close a preformatted block left open at end of document
    pub close_unterminated_preformat: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            read_timeout_secs: 30,
            max_redirects: 5,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            gateway_path: "/".to_string(),
            close_unterminated_preformat: false,
        }
    }
}

impl GeminiConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl Config {
    /// Load configuration from `GEMGATE_CONFIG` (if set) and the environment.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var("GEMGATE_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(raw)?;
        if cfg.gemini.read_timeout_secs == 0 || cfg.gemini.connect_timeout_secs == 0 {
            anyhow::bail!("timeouts must be at least one second");
        }
        if !cfg.render.gateway_path.starts_with('/') {
            anyhow::bail!("render.gateway_path must start with '/'");
        }
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var("LISTEN") {
            self.server.listen_addr = addr;
        }
        if let Ok(flag) = std::env::var("GEMGATE_DEBUG") {
            self.debug = matches!(flag.as_str(), "1" | "true" | "yes");
        }
    }
}
