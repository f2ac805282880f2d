//! WordPress agent
//!
//! Generalist for site questions. Every command it wants to run is first
//! sent to the command validation agent through the relay, then executed
//! through the `wp_cli` tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::agent::agents::command_validation::CommandValidationAgent;
use crate::agent::message::AgentMessage;
use crate::agent::traits::{keyword_score, request_text, Agent, MessageRelay};
use crate::cache::ResponseCache;
use crate::core::{AgentResult, Context, MAX_SCORE};
use crate::tools::{ToolRegistry, WpCliTool};

/// Score every request gets, so the generalist can always take a request
const BASELINE: u32 = 30;

const KEYWORDS: &[(&str, u32)] = &[
    ("wordpress", 40),
    ("wp ", 30),
    ("plugin", 30),
    ("theme", 20),
    ("site", 15),
    ("option", 15),
    ("version", 10),
];

/// Read-only verbs whose output may be cached
const CACHEABLE_VERBS: &[&str] = &["list", "get", "version", "status"];

/// Agent for general WordPress site management
pub struct WordPressAgent {
    capabilities: Vec<String>,
    tools: Arc<ToolRegistry>,
    cache: Option<Arc<ResponseCache>>,
}

impl WordPressAgent {
    pub const ID: &'static str = "wordpress";

    pub fn new(tools: Arc<ToolRegistry>, cache: Option<Arc<ResponseCache>>) -> Self {
        Self {
            capabilities: vec![
                "site_management".to_string(),
                "plugin_management".to_string(),
                "wp_cli".to_string(),
            ],
            tools,
            cache,
        }
    }

    /// Pick the WP-CLI command for a request
    fn command_for(text: &str) -> String {
        if let Some(start) = text.find("wp ") {
            return text[start..].trim().to_string();
        }

        let lower = text.to_lowercase();
        if lower.contains("plugin") {
            "wp plugin list --format=json".to_string()
        } else if lower.contains("theme") {
            "wp theme list --format=json".to_string()
        } else if lower.contains("version") {
            "wp core version".to_string()
        } else {
            "wp option get blogname".to_string()
        }
    }

    fn is_cacheable(command: &str) -> bool {
        command
            .split_whitespace()
            .skip(1)
            .take(2)
            .any(|t| CACHEABLE_VERBS.contains(&t))
    }

    fn cache_key(command: &str) -> String {
        format!("{}:{}", Self::ID, command)
    }
}

#[async_trait]
impl Agent for WordPressAgent {
    fn name(&self) -> &str {
        "WordPress Agent"
    }

    fn description(&self) -> &str {
        "Answers site questions and runs validated WP-CLI commands"
    }

    fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    fn evaluate_request(&self, request_text: &str, _context: &Context) -> u32 {
        (BASELINE + keyword_score(request_text, KEYWORDS)).min(MAX_SCORE)
    }

    async fn process_request(
        &self,
        intent_data: &Value,
        context: &Context,
        relay: &dyn MessageRelay,
    ) -> AgentResult {
        let command = Self::command_for(request_text(intent_data));

        let verdict = relay
            .send(
                AgentMessage::request(Self::ID, CommandValidationAgent::ID, command.clone())
                    .with_metadata("purpose", json!("pre-execution check")),
            )
            .await;
        if !verdict.success {
            return AgentResult::failure(format!("Command rejected: {}", verdict.message))
                .with_data(json!({ "command": command }));
        }

        let needs_confirmation = verdict
            .data
            .as_ref()
            .and_then(|d| d.get("requires_confirmation"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let confirmed = context
            .get("confirmed")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if needs_confirmation && !confirmed {
            return AgentResult::failure(format!("'{}' requires confirmation", command))
                .with_data(json!({ "command": command, "requires_confirmation": true }));
        }

        let cacheable = Self::is_cacheable(&command);
        if cacheable {
            if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&Self::cache_key(&command))) {
                debug!(command = %command, "Serving cached WP-CLI output");
                return AgentResult::success(format!("Ran '{}' (cached)", command)).with_data(cached);
            }
        }

        let result = self
            .tools
            .execute(WpCliTool::ID, &json!({ "command": command }))
            .await;
        if !result.success {
            return AgentResult::failure(result.output);
        }

        let data = json!({
            "command": command,
            "output": result.output,
            "data": result.data,
        });
        if cacheable {
            if let Some(cache) = &self.cache {
                cache.set(Self::cache_key(&command), data.clone());
            }
        }

        AgentResult::success(format!("Ran '{}'", command)).with_data(data)
    }
}
