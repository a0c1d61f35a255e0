// Firestore Sync - Configuration
//
// Everything the deployed functions hard-coded (store endpoints, project,
// API key, variable list) lives here and is resolved once at startup.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Variables synced when the config file does not list any.
pub const DEFAULT_VARIABLES: [&str; 5] = [
    "oxygen_flow",
    "oxygen_pressure",
    "oxygen_purity",
    "running_hours",
    "temp_1",
];

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ordered list of variables; outcome order follows it
    #[serde(default = "default_variables")]
    pub variables: Vec<String>,

    /// Realtime Database (read side)
    #[serde(default)]
    pub source: SourceConfig,

    /// Firestore (write side)
    #[serde(default)]
    pub destination: DestinationConfig,

    /// HTTP trigger settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Realtime Database endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database root, e.g. "https://<project>-default-rtdb.firebaseio.com"
    #[serde(default)]
    pub database_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Firestore REST endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    #[serde(default)]
    pub project_id: String,

    #[serde(default = "default_database_id")]
    pub database_id: String,

    /// API key (can also be set via the env var named by `api_key_env`)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            database_id: default_database_id(),
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// HTTP trigger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Hosting variant whose response envelope the server reproduces
    #[serde(default)]
    pub platform: Platform,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            platform: Platform::default(),
        }
    }
}

/// Hosting variants the sync function was deployed to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Public cron webhook
    #[default]
    Webhook,
    /// Vercel serverless function
    Vercel,
    /// Netlify function
    Netlify,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Webhook => "webhook",
            Platform::Vercel => "vercel",
            Platform::Netlify => "netlify",
        }
    }
}

fn default_variables() -> Vec<String> {
    DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect()
}

fn default_timeout() -> u64 {
    30
}

fn default_database_id() -> String {
    "(default)".to_string()
}

fn default_api_key_env() -> String {
    "FIRESTORE_API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            variables: default_variables(),
            source: SourceConfig::default(),
            destination: DestinationConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            source: e,
        })
    }

    /// Check the fields the sync pass cannot run without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.variables.is_empty() {
            return Err(ConfigError::Invalid("variables must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for variable in &self.variables {
            if variable.trim().is_empty() {
                return Err(ConfigError::Invalid("variable names must not be blank".into()));
            }
            if !seen.insert(variable.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate variable name: {variable}"
                )));
            }
        }

        if self.source.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid("source.database_url is required".into()));
        }
        if self.destination.project_id.trim().is_empty() {
            return Err(ConfigError::Invalid("destination.project_id is required".into()));
        }

        Ok(())
    }

    /// Resolve the Firestore API key: explicit config value first, then env.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = self.destination.api_key.as_deref() {
            if !key.trim().is_empty() {
                return Ok(key.to_string());
            }
        }

        std::env::var(&self.destination.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey {
                env_var: self.destination.api_key_env.clone(),
            })
    }

    /// Example configuration printed by `firestore-sync example`.
    pub fn example_toml() -> &'static str {
        r#"# firestore-sync configuration file

variables = ["oxygen_flow", "oxygen_pressure", "oxygen_purity", "running_hours", "temp_1"]

[source]
database_url = "https://my-project-default-rtdb.firebaseio.com"
timeout_secs = 30

[destination]
project_id = "my-project"
database_id = "(default)"
# API key (can also use FIRESTORE_API_KEY env var)
# api_key = "AIza..."
api_key_env = "FIRESTORE_API_KEY"
base_url = "https://firestore.googleapis.com/v1"
timeout_secs = 30

[server]
bind = "0.0.0.0:3000"
# webhook | vercel | netlify
platform = "webhook"
"#
    }
}
