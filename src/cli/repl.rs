//! Interactive REPL for Switchboard
//!
//! Stands in for the transport layer: each line is one inbound request with
//! an empty context.

use std::io::{self, BufRead, Write};

use crate::agent::{bootstrap, AgentDeps, Orchestrator};
use crate::cli::commands::{handle_command, CommandResult};
use crate::core::{Config, Context, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    orchestrator: Orchestrator,
    deps: AgentDeps,
}

impl Repl {
    /// Create a REPL with custom configuration
    pub fn with_config(config: &Config) -> Result<Self> {
        let (orchestrator, deps) = bootstrap(config)?;
        Ok(Self { orchestrator, deps })
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("You: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match handle_command(input, &self.orchestrator, &self.deps) {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Handled(output)) => {
                    println!("{}\n", output);
                }
                Ok(CommandResult::Continue(request)) => {
                    match self
                        .orchestrator
                        .process_request(&request, &Context::new())
                        .await
                    {
                        Ok(result) => {
                            let agent = result.agent.as_deref().unwrap_or("unknown");
                            let status = if result.success { "ok" } else { "failed" };
                            println!("\n[{} - {}]\n{}", agent, status, result.message);
                            if let Some(data) = &result.data {
                                println!(
                                    "{}",
                                    serde_json::to_string_pretty(data).unwrap_or_default()
                                );
                            }
                            println!();
                        }
                        Err(e) => eprintln!("\nError: {}\n", e),
                    }
                }
                Err(e) => eprintln!("Command error: {}\n", e),
            }
        }

        Ok(())
    }

    /// Print the startup banner
    fn print_banner(&self) {
        println!("Switchboard - agent routing console");
        println!("Agents: {}", self.orchestrator.agent_ids().join(", "));
        println!("Commands: help, agents, tools, /intent <text>, status, exit");
        println!("─────────────────────────────────────────────");
    }
}
