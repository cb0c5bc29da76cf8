// src/config.rs

//! Manages process configuration: loading, defaults and validation.

use crate::core::bridge::DEFAULT_BRIDGE_CAPACITY;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use tracing::warn;

/// Listener settings of the serving process.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path to the PEM certificate. Empty disables TLS.
    #[serde(default)]
    pub cert_path: String,
    /// Path to the PEM private key. Empty disables TLS.
    #[serde(default)]
    pub key_path: String,
    /// How long a graceful stop waits for in-flight work before giving up.
    #[serde(with = "humantime_serde", default = "default_stop_wait_time")]
    pub stop_wait_time: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            cert_path: String::new(),
            key_path: String::new(),
            stop_wait_time: default_stop_wait_time(),
        }
    }
}

impl ServerConfig {
    /// True when both a certificate and a key are configured.
    pub fn tls_enabled(&self) -> bool {
        !self.cert_path.trim().is_empty() && !self.key_path.trim().is_empty()
    }
}

fn default_port() -> u16 {
    8180
}
fn default_stop_wait_time() -> Duration {
    Duration::from_secs(5)
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// If true, an HTTP server will be started to expose Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,
    /// The port for the Prometheus metrics server.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

fn default_metrics_port() -> u16 {
    8878
}

/// A raw representation of the config file before validation.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_bridge_capacity")]
    bridge_capacity: usize,
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    metrics: MetricsConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_bridge_capacity() -> usize {
    DEFAULT_BRIDGE_CAPACITY
}

/// Represents the final, validated configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub log_level: String,
    /// Maximum number of connection events waiting on the bridge.
    pub bridge_capacity: usize,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            bridge_capacity: default_bridge_capacity(),
            server: ServerConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml(&contents).with_context(|| format!("Invalid configuration in '{path}'"))
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let raw_config: RawConfig =
            toml::from_str(contents).context("Failed to parse configuration TOML")?;

        let config = Config {
            log_level: raw_config.log_level,
            bridge_capacity: raw_config.bridge_capacity,
            server: raw_config.server,
            metrics: raw_config.metrics,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.bridge_capacity == 0 {
            return Err(anyhow!("bridge_capacity cannot be 0"));
        }
        if self.log_level.trim().is_empty() {
            return Err(anyhow!("log_level cannot be empty"));
        }
        if self.server.port == 0 {
            return Err(anyhow!("server.port cannot be 0"));
        }

        let has_cert = !self.server.cert_path.trim().is_empty();
        let has_key = !self.server.key_path.trim().is_empty();
        if has_cert != has_key {
            return Err(anyhow!(
                "server.cert_path and server.key_path must be set together"
            ));
        }

        if self.server.stop_wait_time.is_zero() {
            warn!("server.stop_wait_time is 0; pending connection events may be lost on shutdown.");
        }

        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(anyhow!("metrics.port cannot be 0"));
            }
            if self.metrics.port == self.server.port {
                return Err(anyhow!(
                    "metrics.port cannot be the same as the main server port"
                ));
            }
        }
        Ok(())
    }
}
