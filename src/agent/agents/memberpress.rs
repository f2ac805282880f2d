//! MemberPress agent
//!
//! Handles membership questions: listing, looking up, and creating
//! memberships through the `memberpress` tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::agent::traits::{keyword_score, request_text, Agent, MessageRelay};
use crate::cache::ResponseCache;
use crate::core::{AgentResult, Context, MAX_SCORE};
use crate::tools::{MembershipTool, ToolRegistry};

const KEYWORDS: &[(&str, u32)] = &[
    ("memberpress", 60),
    ("membership", 50),
    ("subscription", 30),
    ("transaction", 30),
    ("member", 20),
    ("coupon", 20),
    ("pricing", 10),
    ("price", 10),
];

const LIST_CACHE_KEY: &str = "memberpress:list";

/// What the user asked the membership catalog to do
#[derive(Debug, Clone, PartialEq)]
enum MembershipAction {
    List,
    Get(u64),
    Create {
        title: String,
        price: f64,
        period_type: &'static str,
    },
}

/// Agent for MemberPress membership management
pub struct MemberPressAgent {
    capabilities: Vec<String>,
    tools: Arc<ToolRegistry>,
    cache: Option<Arc<ResponseCache>>,
}

impl MemberPressAgent {
    pub const ID: &'static str = "memberpress";

    pub fn new(tools: Arc<ToolRegistry>, cache: Option<Arc<ResponseCache>>) -> Self {
        Self {
            capabilities: vec![
                "membership_management".to_string(),
                "subscription_management".to_string(),
                "transaction_reporting".to_string(),
                "pricing".to_string(),
            ],
            tools,
            cache,
        }
    }

    fn parse_action(text: &str) -> Result<MembershipAction, String> {
        let lower = text.to_lowercase();

        if lower.contains("create") || lower.contains("add ") || lower.contains("new membership") {
            let title = quoted(text)
                .ok_or_else(|| "Put the membership title in quotes, e.g. create membership \"Gold\" 29".to_string())?;
            let price = first_number(&without_quoted(text)).unwrap_or(0.0);
            let period_type = if lower.contains("lifetime") {
                "lifetime"
            } else if lower.contains("year") || lower.contains("annual") {
                "year"
            } else {
                "month"
            };
            return Ok(MembershipAction::Create {
                title,
                price,
                period_type,
            });
        }

        if lower.contains("show") || lower.contains("get") || lower.contains('#') {
            if let Some(id) = first_number(text).filter(|n| n.fract() == 0.0 && *n >= 1.0) {
                return Ok(MembershipAction::Get(id as u64));
            }
        }

        Ok(MembershipAction::List)
    }
}

/// First double-quoted substring
fn quoted(text: &str) -> Option<String> {
    let start = text.find('"')? + 1;
    let len = text[start..].find('"')?;
    let inner = text[start..start + len].trim();
    (!inner.is_empty()).then(|| inner.to_string())
}

fn without_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut inside = false;
    for c in text.chars() {
        if c == '"' {
            inside = !inside;
        } else if !inside {
            out.push(c);
        }
    }
    out
}

/// First decimal number in the text, ignoring a leading `$` or `#`
fn first_number(text: &str) -> Option<f64> {
    text.split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter(|s| s.chars().any(|c| c.is_ascii_digit()))
        .find_map(|s| s.trim_matches('.').parse().ok())
}

#[async_trait]
impl Agent for MemberPressAgent {
    fn name(&self) -> &str {
        "MemberPress Agent"
    }

    fn description(&self) -> &str {
        "Manages memberships, subscriptions, and pricing"
    }

    fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    fn evaluate_request(&self, request_text: &str, context: &Context) -> u32 {
        if context.get("agent").and_then(Value::as_str) == Some(Self::ID) {
            return MAX_SCORE;
        }
        keyword_score(request_text, KEYWORDS)
    }

    async fn process_request(
        &self,
        intent_data: &Value,
        _context: &Context,
        _relay: &dyn MessageRelay,
    ) -> AgentResult {
        let action = match Self::parse_action(request_text(intent_data)) {
            Ok(action) => action,
            Err(hint) => return AgentResult::failure(hint),
        };

        if action == MembershipAction::List {
            if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(LIST_CACHE_KEY)) {
                debug!("Serving cached membership list");
                return AgentResult::success("Memberships (cached)").with_data(cached);
            }
        }

        let params = match &action {
            MembershipAction::List => json!({ "action": "list" }),
            MembershipAction::Get(id) => json!({ "action": "get", "id": id }),
            MembershipAction::Create {
                title,
                price,
                period_type,
            } => json!({
                "action": "create",
                "title": title,
                "price": price,
                "period_type": period_type,
            }),
        };

        let result = self.tools.execute(MembershipTool::ID, &params).await;
        if !result.success {
            return AgentResult::failure(result.output);
        }

        if let Some(cache) = &self.cache {
            match action {
                MembershipAction::List => {
                    if let Some(data) = &result.data {
                        cache.set(LIST_CACHE_KEY, data.clone());
                    }
                }
                MembershipAction::Create { .. } => {
                    cache.delete_prefix("memberpress:");
                }
                MembershipAction::Get(_) => {}
            }
        }

        let outcome = AgentResult::success(result.output);
        match result.data {
            Some(data) => outcome.with_data(data),
            None => outcome,
        }
    }
}
