//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::agent::{AgentDeps, Orchestrator};
use crate::core::{Context, Result};
use crate::tools::ToolStatus;

/// Result of parsing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Not a command; route as a request
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
}

/// Parse and handle special commands
pub fn handle_command(
    input: &str,
    orchestrator: &Orchestrator,
    deps: &AgentDeps,
) -> Result<CommandResult> {
    let input = input.trim();
    let forced = input.starts_with('/');
    let line = input.trim_start_matches('/');
    let (cmd, args) = match line.split_once(' ') {
        Some((cmd, args)) => (cmd.to_lowercase(), args.trim()),
        None => (line.to_lowercase(), ""),
    };

    // Without the prefix only a bare command word counts; anything longer is a request.
    if !forced && !args.is_empty() {
        return Ok(CommandResult::Continue(input.to_string()));
    }

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "agents" => Ok(CommandResult::Handled(list_agents(orchestrator))),

        "tools" => Ok(CommandResult::Handled(list_tools(deps))),

        "intent" => {
            if args.is_empty() {
                return Ok(CommandResult::Handled("Usage: /intent <request text>".to_string()));
            }
            Ok(CommandResult::Handled(explain_intent(orchestrator, args)?))
        }

        "status" => Ok(CommandResult::Handled(format!(
            "Switchboard Status:\n\
             ─────────────────────────────\n\
             Agents:  {}\n\
             Tools:   {} registered\n\
             Cache:   {}",
            orchestrator.agent_ids().join(", "),
            deps.tools.get_available_tools().len(),
            match &deps.cache {
                Some(cache) => format!("{} entries", cache.len()),
                None => "disabled".to_string(),
            }
        ))),

        _ => {
            if forced {
                Ok(CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                )))
            } else {
                Ok(CommandResult::Continue(input.to_string()))
            }
        }
    }
}

fn list_agents(orchestrator: &Orchestrator) -> String {
    let agents = orchestrator.get_available_agents();
    let mut output = String::from("Registered agents (discovery order):\n");
    for id in orchestrator.agent_ids() {
        if let Some(info) = agents.get(id) {
            output.push_str(&format!(
                "  {} - {}\n    {}\n    capabilities: {}\n",
                id,
                info.name,
                info.description,
                info.capabilities.join(", ")
            ));
        }
    }
    output
}

fn list_tools(deps: &AgentDeps) -> String {
    let mut output = String::from("Registered tools:\n");
    for (id, status) in deps.tools.get_available_tools() {
        let state = match status {
            ToolStatus::Loaded(tool) => format!("loaded - {}", tool.description()),
            ToolStatus::Unloaded { class } => format!("not loaded ({})", class),
        };
        output.push_str(&format!("  {}: {}\n", id, state));
    }
    output
}

fn explain_intent(orchestrator: &Orchestrator, text: &str) -> Result<String> {
    let context = Context::new();
    let winner = orchestrator.determine_primary_intent(text, &context)?;

    let mut output = String::from("Scores:\n");
    for score in orchestrator.score_agents(text, &context) {
        let marker = if score.agent_id == winner { " <- selected" } else { "" };
        output.push_str(&format!("  {:<20} {:>3}{}\n", score.agent_id, score.score, marker));
    }
    Ok(output)
}

/// Generate help text
fn help_text() -> String {
    r#"Switchboard Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit Switchboard
  agents           List registered agents
  tools            List tools and whether they are loaded
  /intent <text>   Show how each agent scores a request
  status           Show current state

A bare command word runs the command. Anything else is routed to the
best-scoring agent; prefix a line with '/' to force command parsing.
─────────────────────────────────────────────"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentCatalog;
    use crate::tools::ToolRegistry;
    use std::sync::Arc;

    fn setup() -> (Orchestrator, AgentDeps) {
        let deps = AgentDeps::new(Arc::new(ToolRegistry::new()), None);
        let orchestrator = Orchestrator::discover(&AgentCatalog::builtin(), &deps, |_| true).unwrap();
        (orchestrator, deps)
    }

    #[test]
    fn test_exit_and_continue() {
        let (orchestrator, deps) = setup();
        assert_eq!(handle_command("quit", &orchestrator, &deps).unwrap(), CommandResult::Exit);
        assert_eq!(
            handle_command("list memberships", &orchestrator, &deps).unwrap(),
            CommandResult::Continue("list memberships".to_string())
        );
    }

    #[test]
    fn test_intent_marks_winner() {
        let (orchestrator, deps) = setup();
        match handle_command("/intent Tell me about my membership", &orchestrator, &deps).unwrap() {
            CommandResult::Handled(output) => {
                assert!(output.contains("memberpress"));
                assert!(output.contains("<- selected"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_requests_starting_with_command_words_are_routed() {
        let (orchestrator, deps) = setup();
        for request in ["status of my membership", "help me add a plugin", "tools for my site", "intent to cancel"] {
            assert_eq!(
                handle_command(request, &orchestrator, &deps).unwrap(),
                CommandResult::Continue(request.to_string())
            );
        }
        assert!(matches!(
            handle_command("status", &orchestrator, &deps).unwrap(),
            CommandResult::Handled(_)
        ));
    }

    #[test]
    fn test_slash_prefix_forces_command() {
        let (orchestrator, deps) = setup();
        assert_eq!(handle_command("/exit", &orchestrator, &deps).unwrap(), CommandResult::Exit);
    }

    #[test]
    fn test_unknown_slash_command() {
        let (orchestrator, deps) = setup();
        match handle_command("/frobnicate", &orchestrator, &deps).unwrap() {
            CommandResult::Handled(output) => assert!(output.contains("Unknown command")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
