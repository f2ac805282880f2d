//! Command validation agent
//!
//! Judges whether a proposed WP-CLI command is safe to run. Other agents ask
//! it through the relay before executing anything.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::agent::traits::{keyword_score, request_text, Agent, MessageRelay};
use crate::core::{AgentResult, Context};
use crate::tools::wp_cli::split_command;

const SHELL_METACHARACTERS: &[&str] = &[";", "|", "&", "`", "$(", ">", "<", "\n"];

/// Subcommands that are never allowed
const BLOCKED: &[&[&str]] = &[
    &["db", "drop"],
    &["db", "reset"],
    &["site", "empty"],
    &["eval"],
    &["eval-file"],
    &["shell"],
];

/// Subcommand verbs that need explicit confirmation
const DESTRUCTIVE: &[&str] = &["delete", "deactivate", "uninstall"];

const KEYWORDS: &[(&str, u32)] = &[
    ("validate", 40),
    ("is it safe", 40),
    ("safe to run", 40),
    ("security", 20),
    ("command", 20),
    ("wp ", 10),
];

/// Outcome of validating one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandVerdict {
    pub command: String,
    pub allowed: bool,
    pub requires_confirmation: bool,
    pub reason: String,
}

impl CommandVerdict {
    fn deny(command: &str, reason: impl Into<String>) -> Self {
        Self {
            command: command.to_string(),
            allowed: false,
            requires_confirmation: false,
            reason: reason.into(),
        }
    }
}

/// Check a WP-CLI command against the command policy
pub fn validate_command(command: &str) -> CommandVerdict {
    let command = command.trim();

    if !command.starts_with("wp ") {
        return CommandVerdict::deny(command, "Only WP-CLI commands starting with 'wp' are allowed");
    }

    if let Some(meta) = SHELL_METACHARACTERS.iter().find(|m| command.contains(*m)) {
        return CommandVerdict::deny(
            command,
            format!("Shell metacharacter '{}' is not allowed", meta.escape_default()),
        );
    }

    // Same argv the WP-CLI tool will run, so quoting cannot hide a subcommand.
    let args = match split_command(command) {
        Ok(args) => args,
        Err(e) => return CommandVerdict::deny(command, format!("Malformed command: {}", e)),
    };
    if args.first().map(String::as_str) != Some("wp") {
        return CommandVerdict::deny(command, "Only WP-CLI commands starting with 'wp' are allowed");
    }

    let tokens: Vec<&str> = args
        .iter()
        .skip(1)
        .map(String::as_str)
        .filter(|t| !t.starts_with("--"))
        .collect();

    if let Some(blocked) = BLOCKED
        .iter()
        .find(|blocked| tokens.len() >= blocked.len() && tokens[..blocked.len()] == blocked[..])
    {
        return CommandVerdict::deny(
            command,
            format!("'wp {}' is blocked", blocked.join(" ")),
        );
    }

    let destructive = tokens.iter().take(2).any(|t| DESTRUCTIVE.contains(t));

    CommandVerdict {
        command: command.to_string(),
        allowed: true,
        requires_confirmation: destructive,
        reason: if destructive {
            "Command modifies the site and requires confirmation".to_string()
        } else {
            "Command is allowed".to_string()
        },
    }
}

/// Agent that validates administrative commands
pub struct CommandValidationAgent {
    capabilities: Vec<String>,
}

impl CommandValidationAgent {
    pub const ID: &'static str = "command_validation";

    pub fn new() -> Self {
        Self {
            capabilities: vec![
                "command_validation".to_string(),
                "security_check".to_string(),
                "wp_cli_policy".to_string(),
            ],
        }
    }
}

impl Default for CommandValidationAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for CommandValidationAgent {
    fn name(&self) -> &str {
        "Command Validation Agent"
    }

    fn description(&self) -> &str {
        "Validates WP-CLI commands before they are executed"
    }

    fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    fn evaluate_request(&self, request_text: &str, _context: &Context) -> u32 {
        keyword_score(request_text, KEYWORDS)
    }

    async fn process_request(
        &self,
        intent_data: &Value,
        _context: &Context,
        _relay: &dyn MessageRelay,
    ) -> AgentResult {
        let text = request_text(intent_data);
        let command = match text.find("wp ") {
            Some(start) => &text[start..],
            None => return AgentResult::failure("No WP-CLI command found to validate"),
        };

        let verdict = validate_command(command);
        let data = serde_json::to_value(&verdict).unwrap_or(Value::Null);
        let result = if verdict.allowed {
            AgentResult::success(verdict.reason)
        } else {
            AgentResult::failure(verdict.reason)
        };
        result.with_data(data)
    }
}
