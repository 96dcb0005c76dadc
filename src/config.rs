//! Configuration module for the lead dashboard
//!
//! This module handles configuration loading from TOML files and environment
//! variables, and provides structured configuration types.

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::DashboardError;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Usage telemetry
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Persisted preferences
    #[serde(default)]
    pub preferences: PreferencesConfig,

    /// CSV export
    #[serde(default)]
    pub export: ExportConfig,

    /// Monitoring and metrics
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the lead API, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the lead query endpoint
    #[serde(default = "default_leads_path")]
    pub leads_path: String,

    /// Path of the telemetry endpoint
    #[serde(default = "default_events_path")]
    pub events_path: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Send usage events
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How long to wait for in-flight events on shutdown
    #[serde(default = "default_flush_timeout_ms")]
    pub flush_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// JSON file holding `darkMode` and `userId`
    #[serde(default = "default_prefs_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// File name offered for the exported CSV
    #[serde(default = "default_export_file_name")]
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Serve Prometheus metrics
    #[serde(default)]
    pub enable_metrics: bool,

    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

// Default value functions
fn default_base_url() -> String { "http://localhost:8000".to_string() }
fn default_leads_path() -> String { "/api/leads".to_string() }
fn default_events_path() -> String { "/api/events".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_true() -> bool { true }
fn default_flush_timeout_ms() -> u64 { 2_000 }
fn default_prefs_path() -> String { ".lead_dashboard_prefs.json".to_string() }
fn default_export_file_name() -> String { "leads.csv".to_string() }
fn default_metrics_port() -> u16 { 9090 }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            leads_path: default_leads_path(),
            events_path: default_events_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            flush_timeout_ms: default_flush_timeout_ms(),
        }
    }
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_prefs_path(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: default_export_file_name(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: false,
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            telemetry: TelemetryConfig::default(),
            preferences: PreferencesConfig::default(),
            export: ExportConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl ApiConfig {
    pub fn leads_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.leads_path)
    }

    pub fn events_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.events_path)
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| anyhow!("Failed to parse TOML config: {}", e))?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;
        Self::from_toml_str(&content)
    }

    /// Load configuration with `.env` and environment variable overrides
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Defaults with `.env` and environment variable overrides
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LEAD_DASHBOARD_API_URL") {
            self.api.base_url = url;
        }
        if let Some(path) = lookup("LEAD_DASHBOARD_PREFS_PATH") {
            self.preferences.path = path;
        }
        if let Some(flag) = lookup("LEAD_DASHBOARD_TELEMETRY") {
            match flag.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "on" => self.telemetry.enabled = true,
                "false" | "0" | "off" => self.telemetry.enabled = false,
                other => tracing::warn!("Ignoring LEAD_DASHBOARD_TELEMETRY={}", other),
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.api.base_url.trim().is_empty() {
            return Err(DashboardError::Configuration(
                "api.base_url must not be empty".to_string(),
            ));
        }
        for (name, path) in [
            ("api.leads_path", &self.api.leads_path),
            ("api.events_path", &self.api.events_path),
        ] {
            if !path.starts_with('/') {
                return Err(DashboardError::Configuration(format!(
                    "{} must start with '/', got '{}'",
                    name, path
                )));
            }
        }
        if self.api.timeout_secs == 0 {
            return Err(DashboardError::Configuration(
                "api.timeout_secs must be > 0".to_string(),
            ));
        }
        if self.export.file_name.trim().is_empty() {
            return Err(DashboardError::Configuration(
                "export.file_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
