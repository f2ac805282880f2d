//! Agent module - the agent contract, messages, and the orchestrator
//!
//! Contains the routing engine that scores agents for a request and relays
//! messages between them, plus the built-in agents.

pub mod agents;
pub mod discovery;
pub mod message;
pub mod orchestrator;
pub mod traits;

pub use discovery::{bootstrap, AgentCatalog, AgentDeps, AgentFactory};
pub use message::AgentMessage;
pub use orchestrator::{MessageRejection, Orchestrator, MAX_RELAY_DEPTH};
pub use traits::{Agent, MessageRelay, NoopRelay};
