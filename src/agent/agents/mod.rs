//! Built-in domain agents

pub mod command_validation;
pub mod memberpress;
pub mod wordpress;

pub use command_validation::{validate_command, CommandValidationAgent, CommandVerdict};
pub use memberpress::MemberPressAgent;
pub use wordpress::WordPressAgent;
