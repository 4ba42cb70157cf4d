use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

use anyhow::Context;

/// Default location of the configuration file, overridable via `PRORATION_CONFIG_PATH`
pub const DEFAULT_CONFIG_PATH: &str = "proration.toml";

#[derive(Deserialize, Debug, Clone)]
pub struct Environment {
    pub env_type: String,
}

impl Default for Environment {
    fn default() -> Self {
        Self { env_type: "default".to_string() }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { allowed_origins: default_allowed_origins() }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct LimitsConfig {
    #[serde(default = "default_max_body_size_kb")]
    pub max_body_size_kb: usize,
    #[serde(default = "default_max_claims_per_request")]
    pub max_claims_per_request: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size_kb: default_max_body_size_kb(),
            max_claims_per_request: default_max_claims_per_request(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// `EnvFilter` directives used when `RUST_LOG` is not set
    pub filter: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProrationConfig {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProrationConfig {
    /// Load from `PRORATION_CONFIG_PATH`, or `proration.toml` when unset.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("PRORATION_CONFIG_PATH")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_path(Path::new(&config_path))
    }

    /// Load from `path`. A missing file falls back to the built-in defaults; a
    /// file that cannot be read or does not parse is an error.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents)
                .with_context(|| format!("Failed to parse configuration file '{}'", path.display())),
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err)
                .with_context(|| format!("Failed to read configuration file '{}'", path.display())),
            Err(_) => {
                warn!(
                    "Configuration file '{}' not found. Using default configuration.",
                    path.display()
                );
                Ok(Self::default())
            }
        }
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply environment variable overrides.
    pub fn apply_profile(self) -> Self {
        info!(
            "Applying configuration profile for '{}' environment.",
            self.environment.env_type
        );
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(host) = lookup("PRORATION_HOST") {
            self.server.host = host;
        }
        // `PORT` is what hosting platforms inject; the prefixed name wins.
        for key in ["PORT", "PRORATION_PORT"] {
            if let Some(port) = lookup(key) {
                match port.parse::<u16>() {
                    Ok(port) => self.server.port = port,
                    Err(_) => warn!(key, value = %port, "Ignoring invalid port override"),
                }
            }
        }
        if let Some(origin) = lookup("FRONTEND_URL") {
            let origin = origin.trim().trim_end_matches('/').to_string();
            if !origin.is_empty() && !self.cors.allowed_origins.contains(&origin) {
                self.cors.allowed_origins.push(origin);
            }
        }
        if let Some(max_claims) = lookup("PRORATION_MAX_CLAIMS") {
            if let Ok(max_claims) = max_claims.parse::<usize>() {
                self.limits.max_claims_per_request = max_claims;
            }
        }
        if let Some(format) = lookup("PRORATION_LOG_FORMAT") {
            match format.to_ascii_lowercase().as_str() {
                "json" => self.logging.format = LogFormat::Json,
                "pretty" => self.logging.format = LogFormat::Pretty,
                other => warn!(value = other, "Ignoring unknown log format override"),
            }
        }
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn max_body_bytes(&self) -> usize {
        self.limits.max_body_size_kb * 1024
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}
fn default_max_body_size_kb() -> usize {
    256
}
fn default_max_claims_per_request() -> usize {
    10_000
}
