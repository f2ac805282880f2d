//! Tools module - capability providers for agents
//!
//! Contains the tool contract, the lazy tool registry, and the built-in tools.

pub mod membership;
pub mod registry;
pub mod traits;
pub mod wp_cli;

pub use membership::MembershipTool;
pub use registry::{ToolDefinition, ToolFactory, ToolRegistry, ToolStatus};
pub use traits::Tool;
pub use wp_cli::WpCliTool;
