//! Tool contract
//!
//! Tools are capability providers invoked by agents, never directly by the
//! orchestrator.

use async_trait::async_trait;
use serde_json::Value;

use crate::core::{Result, ToolResult};

/// A capability provider resolved through the [`ToolRegistry`](super::ToolRegistry)
#[async_trait]
pub trait Tool: Send + Sync {
    /// Registry id of the tool
    fn id(&self) -> &str;

    /// What the tool does
    fn description(&self) -> &str;

    /// Run the tool with JSON parameters
    ///
    /// Timeouts, if any, are the tool's own business.
    async fn execute(&self, params: &Value) -> Result<ToolResult>;
}
