//! Switchboard - intent-scored agent routing
//!
//! Routes a natural-language request to the best-suited domain agent and lets
//! agents use a shared set of lazily constructed tools.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **Agent**: The agent contract, agent messages, discovery, and the orchestrator
//! - **Tools**: The tool contract, the lazy tool registry, and built-in tools
//! - **Cache**: Optional TTL response cache for agents
//! - **CLI**: REPL standing in for the transport layer
//!
//! # Usage
//!
//! ```rust,no_run
//! use switchboard::agent::bootstrap;
//! use switchboard::core::{Config, Context};
//!
//! #[tokio::main]
//! async fn main() -> switchboard::Result<()> {
//!     let (orchestrator, _deps) = bootstrap(&Config::load()?)?;
//!
//!     let result = orchestrator
//!         .process_request("List my memberships", &Context::new())
//!         .await?;
//!     println!("{}", result.message);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cache;
pub mod cli;
pub mod core;
pub mod logging;
pub mod tools;

// Re-export commonly used items
pub use agent::{Agent, AgentMessage, Orchestrator};
pub use cli::Repl;
pub use crate::core::{Config, Result, SwitchboardError};
pub use tools::{Tool, ToolRegistry};
