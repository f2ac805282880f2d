//! WP-CLI tool - wraps the `wp` command line
//!
//! Construction fails when the binary cannot be located, which is how the
//! registry learns that a host has no WP-CLI installed.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::core::config::ToolsConfig;
use crate::core::{Result, SwitchboardError, ToolResult};
use crate::tools::traits::Tool;

/// Runs WP-CLI commands
pub struct WpCliTool {
    binary: PathBuf,
    wp_path: Option<PathBuf>,
    timeout: Duration,
}

impl WpCliTool {
    /// Registry id
    pub const ID: &'static str = "wp_cli";
    /// Implementation name used by lazy definitions
    pub const CLASS: &'static str = "WpCliTool";

    /// Locate the configured binary
    pub fn from_config(config: &ToolsConfig) -> Result<Self> {
        let binary = which::which(&config.wp_cli_path).map_err(|e| {
            SwitchboardError::tool(format!(
                "WP-CLI binary '{}' not found: {}",
                config.wp_cli_path, e
            ))
        })?;

        Ok(Self {
            binary,
            wp_path: config.wp_path.clone(),
            timeout: Duration::from_secs(config.command_timeout_secs),
        })
    }

    fn build_args(&self, command: &str) -> Result<Vec<String>> {
        let mut args = split_command(command)?;
        if args.first().map(String::as_str) == Some("wp") {
            args.remove(0);
        }
        if args.is_empty() {
            return Err(SwitchboardError::tool("Empty WP-CLI command"));
        }
        if let Some(ref root) = self.wp_path {
            args.push(format!("--path={}", root.display()));
        }
        Ok(args)
    }
}

#[async_trait]
impl Tool for WpCliTool {
    fn id(&self) -> &str {
        Self::ID
    }

    fn description(&self) -> &str {
        "Run a WP-CLI command against the WordPress installation"
    }

    async fn execute(&self, params: &Value) -> Result<ToolResult> {
        let command = params
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| SwitchboardError::tool("Missing 'command' parameter"))?;
        let args = self.build_args(command)?;

        debug!(binary = %self.binary.display(), ?args, "Running WP-CLI");

        let mut cmd = Command::new(&self.binary);
        cmd.args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                SwitchboardError::tool(format!(
                    "WP-CLI timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            Ok(match serde_json::from_str::<Value>(&stdout) {
                Ok(data) => ToolResult::success_with_data(Self::ID, stdout, data),
                Err(_) => ToolResult::success(Self::ID, stdout),
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Ok(ToolResult::failure(
                Self::ID,
                format!("WP-CLI command failed: {}", stderr.trim()),
            ))
        }
    }
}

/// Split a command line on whitespace, honouring single and double quotes
pub fn split_command(command: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_word = false;

    for c in command.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(SwitchboardError::tool("Unterminated quote in command"));
    }
    if in_word {
        args.push(current);
    }
    Ok(args)
}
