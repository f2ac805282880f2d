//! Shared types used across Switchboard modules
//!
//! Contains request context, agent results, intent scores, and tool results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request context mapping supplied by the transport layer
pub type Context = serde_json::Map<String, Value>;

/// Upper bound of the intent score range
pub const MAX_SCORE: u32 = 100;

/// Structured result returned by agents and by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Whether the request was handled successfully
    pub success: bool,
    /// Human-readable outcome or error description
    pub message: String,
    /// Optional structured payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Id of the agent that produced the result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
}

impl AgentResult {
    /// Create a successful result
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            agent: None,
        }
    }

    /// Create a failed result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            agent: None,
        }
    }

    /// Attach structured data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Tag the result with the agent that produced it
    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent = Some(agent_id.into());
        self
    }
}

/// An agent's fitness for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentScore {
    /// Agent the score belongs to
    pub agent_id: String,
    /// Fitness in `0..=MAX_SCORE`
    pub score: u32,
}

impl IntentScore {
    /// Create a score, clamping it into range
    pub fn new(agent_id: impl Into<String>, score: u32) -> Self {
        Self {
            agent_id: agent_id.into(),
            score: score.min(MAX_SCORE),
        }
    }
}

/// Metadata snapshot of a registered agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
}

/// Result of executing a tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    /// Id of the tool that was executed
    pub tool_id: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Output from the tool
    pub output: String,
    /// Optional structured data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(tool_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            success: true,
            output: output.into(),
            data: None,
        }
    }

    /// Create a successful result with structured data
    pub fn success_with_data(
        tool_id: impl Into<String>,
        output: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            success: true,
            output: output.into(),
            data: Some(data),
        }
    }

    /// Create a failed result
    pub fn failure(tool_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            success: false,
            output: error.into(),
            data: None,
        }
    }
}
