//! Membership tool - a membership catalog agents can query and extend
//!
//! Holds memberships in memory; actions are `list`, `get`, and `create`.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::{Result, SwitchboardError, ToolResult};
use crate::tools::traits::Tool;

/// Billing period of a membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Month,
    Year,
    Lifetime,
}

/// A membership product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub id: u64,
    pub title: String,
    pub price: f64,
    pub period_type: PeriodType,
}

/// In-memory membership catalog
#[derive(Default)]
pub struct MembershipTool {
    memberships: RwLock<Vec<Membership>>,
}

impl MembershipTool {
    /// Registry id
    pub const ID: &'static str = "memberpress";
    /// Implementation name used by lazy definitions
    pub const CLASS: &'static str = "MembershipTool";

    pub fn new() -> Self {
        Self::default()
    }

    /// Create a membership and return it
    pub fn create(&self, title: &str, price: f64, period_type: PeriodType) -> Result<Membership> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SwitchboardError::tool("Membership title is required"));
        }
        if !price.is_finite() || price < 0.0 {
            return Err(SwitchboardError::tool(format!("Invalid price: {}", price)));
        }

        let mut memberships = self.memberships.write();
        let id = memberships.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        let membership = Membership {
            id,
            title: title.to_string(),
            price,
            period_type,
        };
        memberships.push(membership.clone());
        Ok(membership)
    }

    pub fn get(&self, id: u64) -> Option<Membership> {
        self.memberships.read().iter().find(|m| m.id == id).cloned()
    }

    pub fn list(&self) -> Vec<Membership> {
        self.memberships.read().clone()
    }
}

#[async_trait]
impl Tool for MembershipTool {
    fn id(&self) -> &str {
        Self::ID
    }

    fn description(&self) -> &str {
        "List, look up, and create memberships"
    }

    async fn execute(&self, params: &Value) -> Result<ToolResult> {
        let action = params
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or("list");

        match action {
            "list" => {
                let memberships = self.list();
                Ok(ToolResult::success_with_data(
                    Self::ID,
                    format!("{} membership(s)", memberships.len()),
                    serde_json::to_value(&memberships)?,
                ))
            }
            "get" => {
                let id = params
                    .get("id")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| SwitchboardError::tool("Missing 'id' parameter"))?;
                Ok(match self.get(id) {
                    Some(membership) => ToolResult::success_with_data(
                        Self::ID,
                        membership.title.clone(),
                        serde_json::to_value(&membership)?,
                    ),
                    None => ToolResult::failure(Self::ID, format!("Membership {} not found", id)),
                })
            }
            "create" => {
                let title = params
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let price = params.get("price").and_then(Value::as_f64).unwrap_or(0.0);
                let period_type = match params.get("period_type") {
                    Some(value) => serde_json::from_value(value.clone())?,
                    None => PeriodType::Month,
                };
                let membership = self.create(title, price, period_type)?;
                Ok(ToolResult::success_with_data(
                    Self::ID,
                    format!("Created membership '{}'", membership.title),
                    json!(membership),
                ))
            }
            other => Ok(ToolResult::failure(
                Self::ID,
                format!("Unknown membership action: {}", other),
            )),
        }
    }
}
