//! Agent contract
//!
//! Every domain handler implements [`Agent`]. The orchestrator only talks to
//! agents through this trait, and agents only talk to each other through a
//! [`MessageRelay`].

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::message::AgentMessage;
use crate::core::{AgentResult, Context};

/// A domain-specific request handler
#[async_trait]
pub trait Agent: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// One-line description of the agent's domain
    fn description(&self) -> &str;

    /// Ordered capability tags; must not be empty
    fn capabilities(&self) -> &[String];

    /// Score fitness for a request in `0..=100`
    ///
    /// Must be deterministic for identical input. Agents with nothing
    /// relevant to offer return a low score rather than failing.
    fn evaluate_request(&self, request_text: &str, context: &Context) -> u32;

    /// Perform the agent's domain work
    ///
    /// Internal failures are reported as `AgentResult::failure`, never as a
    /// panic or error crossing the orchestrator boundary.
    async fn process_request(
        &self,
        intent_data: &Value,
        context: &Context,
        relay: &dyn MessageRelay,
    ) -> AgentResult;
}

/// The only path from one agent to another
#[async_trait]
pub trait MessageRelay: Send + Sync {
    /// Validate and deliver a message, returning the receiver's result
    async fn send(&self, message: AgentMessage) -> AgentResult;
}

/// Relay for agents running outside an orchestrator
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRelay;

#[async_trait]
impl MessageRelay for NoopRelay {
    async fn send(&self, message: AgentMessage) -> AgentResult {
        AgentResult::failure(format!(
            "No relay available to deliver message to '{}'",
            message.receiver()
        ))
    }
}

/// Read the request text out of intent data
///
/// Accepts either a bare string or an object with a `request` field.
pub fn request_text(intent_data: &Value) -> &str {
    match intent_data {
        Value::String(text) => text.as_str(),
        other => other
            .get("request")
            .and_then(Value::as_str)
            .unwrap_or_default(),
    }
}

/// Count weighted keyword hits in lowercase text, clamped to 100
pub fn keyword_score(text: &str, keywords: &[(&str, u32)]) -> u32 {
    let lower = text.to_lowercase();
    keywords
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .map(|(_, weight)| *weight)
        .sum::<u32>()
        .min(crate::core::MAX_SCORE)
}
