//! Custom error types for Switchboard
//!
//! Errors here are reserved for configuration problems and contract
//! violations. Expected-but-unhappy paths (a tool that is not installed, a
//! rejected agent message, an agent declining a request) are reported as
//! structured results instead.

use thiserror::Error;

/// Main error type for Switchboard operations
#[derive(Error, Debug)]
pub enum SwitchboardError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Routing was attempted with an empty agent table
    #[error("No agents registered; cannot determine intent")]
    NoAgentsRegistered,

    /// An agent id was registered twice
    #[error("Agent '{0}' is already registered")]
    DuplicateAgent(String),

    /// An agent failed the structural check at registration
    #[error("Agent '{id}' is invalid: {reason}")]
    InvalidAgent { id: String, reason: String },

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for Switchboard operations
pub type Result<T> = std::result::Result<T, SwitchboardError>;

impl SwitchboardError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create an invalid agent error
    pub fn invalid_agent(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAgent {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error belongs to the configuration class (fatal to the
    /// operation being attempted)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::NoAgentsRegistered
                | Self::DuplicateAgent(_)
                | Self::InvalidAgent { .. }
        )
    }
}
