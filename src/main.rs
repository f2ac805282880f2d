//! Switchboard - intent-scored agent routing
//!
//! Main entry point for the CLI application.

use clap::Parser;
use switchboard::agent::bootstrap;
use switchboard::core::Context;
use switchboard::{Config, Repl};

/// Switchboard - route requests to domain agents
#[derive(Parser, Debug)]
#[command(name = "switchboard")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,

    /// Log format (text or json)
    #[arg(long)]
    log_format: Option<String>,

    /// Agents to enable, comma separated
    #[arg(long, value_delimiter = ',')]
    agents: Option<Vec<String>>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Single request mode (non-interactive); prints the JSON result
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// JSON object used as the request context in single request mode
    #[arg(long, requires = "prompt")]
    context: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("{}", Config::default_config_toml());
        return Ok(());
    }

    let mut config = Config::load()?;

    if args.debug {
        config.logging.level = "debug".to_string();
    }

    if let Some(format) = args.log_format {
        config.logging.format = format;
    }

    if let Some(agents) = args.agents {
        config.agents.enabled = agents;
    }

    switchboard::logging::init(&config.logging)?;

    if let Some(prompt) = args.prompt {
        let context: Context = match args.context {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Context::new(),
        };

        let (orchestrator, _deps) = bootstrap(&config)?;
        let result = orchestrator.process_request(&prompt, &context).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let mut repl = Repl::with_config(&config)?;
    repl.run().await?;

    Ok(())
}
