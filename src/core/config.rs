//! Configuration management for Switchboard
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/switchboard/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::error::{Result, SwitchboardError};

/// Main configuration for Switchboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Agent discovery configuration
    #[serde(default)]
    pub agents: AgentsConfig,
    /// Tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Response cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    pub level: String,
    /// Output format: text or json
    pub format: String,
}

/// Which agents are discovered at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Agent ids to instantiate; discovery order follows the built-in catalog
    pub enabled: Vec<String>,
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// WP-CLI executable name or path
    pub wp_cli_path: String,
    /// WordPress installation root passed as `--path`
    #[serde(default)]
    pub wp_path: Option<PathBuf>,
    /// Upper bound for a single WP-CLI invocation
    pub command_timeout_secs: u64,
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether agents get a response cache at all
    pub enabled: bool,
    /// Default entry lifetime in seconds
    pub ttl_secs: u64,
    /// Upper bound on cached entries
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

fn default_max_entries() -> u64 {
    1024
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            enabled: vec![
                "memberpress".to_string(),
                "wordpress".to_string(),
                "command_validation".to_string(),
            ],
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            wp_cli_path: "wp".to_string(),
            wp_path: None,
            command_timeout_secs: 30,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
            max_entries: default_max_entries(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("switchboard")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    ///
    /// A missing config file means defaults; an unreadable or malformed one
    /// is an error.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::load_from(&Self::config_file())?;
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from `path`, falling back to defaults if it is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file; using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            SwitchboardError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml(&content).map_err(|e| {
            SwitchboardError::config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Apply `SWITCHBOARD_*` overrides looked up through `var`
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(level) = var("SWITCHBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("SWITCHBOARD_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(agents) = var("SWITCHBOARD_AGENTS") {
            self.agents.enabled = agents
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(path) = var("SWITCHBOARD_WP_CLI") {
            self.tools.wp_cli_path = path;
        }
        if let Some(root) = var("SWITCHBOARD_WP_PATH") {
            self.tools.wp_path = Some(PathBuf::from(root));
        }
        if let Some(enabled) = var("SWITCHBOARD_CACHE") {
            self.cache.enabled = enabled == "true" || enabled == "1";
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|e| {
                SwitchboardError::config(format!("Failed to create config dir: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SwitchboardError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| SwitchboardError::config(format!("Failed to write config: {}", e)))?;

        Ok(config_path)
    }

    /// Check if an agent id is enabled for discovery
    pub fn is_agent_enabled(&self, agent_id: &str) -> bool {
        self.agents.enabled.iter().any(|id| id == agent_id)
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        toml::to_string_pretty(&Config::default())
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}
