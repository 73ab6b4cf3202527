//! HTTP server configuration.
//!
//! Host, port, upload limit and CORS origins for `docrule serve`.

use serde::{Deserialize, Serialize};

pub const PORT_ENV: &str = "PORT";
pub const HOST_ENV: &str = "DOCRULE_HOST";
pub const CORS_ORIGINS_ENV: &str = "DOCRULE_CORS_ORIGINS";

/// Largest accepted upload, in bytes (10 MiB).
pub const DEFAULT_UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 4000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum request body size in bytes
    #[serde(default = "default_upload_limit")]
    pub upload_limit: usize,

    /// CORS allowed origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_upload_limit() -> usize {
    DEFAULT_UPLOAD_LIMIT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            upload_limit: default_upload_limit(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Load from process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(port) = var(PORT_ENV) {
            config.port = port
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid {}={:?}: {}", PORT_ENV, port, e))?;
        }
        if let Some(host) = var(HOST_ENV) {
            config.host = host;
        }
        if let Some(origins) = var(CORS_ORIGINS_ENV) {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
