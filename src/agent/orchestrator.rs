//! Agent orchestrator
//!
//! Holds the registered agents in registration order, scores every agent for
//! an incoming request, dispatches to the best one, and is the single choke
//! point for messages passed between agents.
//!
//! Per request: scoring → routed → dispatched → (relaying → validated or
//! rejected → delivered) → result. The agent table is filled during startup
//! and only read afterwards.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::agent::message::AgentMessage;
use crate::agent::traits::{Agent, MessageRelay};
use crate::core::{AgentInfo, AgentResult, Context, IntentScore, Result, SwitchboardError};

/// Most relay hops one chain of agent messages may take, counting the first
/// delivery whether it came from a dispatched agent or from the host
pub const MAX_RELAY_DEPTH: usize = 3;

/// Why a message was refused by the orchestrator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageRejection {
    #[error("unknown sender '{0}'")]
    UnknownSender(String),
    #[error("unknown receiver '{0}'")]
    UnknownReceiver(String),
    #[error("message type is empty")]
    EmptyMessageType,
    #[error("content contains disallowed markup ({0})")]
    DisallowedMarkup(&'static str),
    #[error("agent '{relayed_by}' cannot send as '{sender}'")]
    SenderMismatch { relayed_by: String, sender: String },
}

struct MarkupRule {
    label: &'static str,
    pattern: regex::Regex,
}

fn markup_rules() -> &'static [MarkupRule] {
    static RULES: OnceLock<Vec<MarkupRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            ("script tag", r"(?i)<\s*/?\s*script\b"),
            ("javascript url", r"(?i)javascript\s*:"),
            ("event handler attribute", r#"(?i)<[^>]*[\s/"']on[a-z]+\s*="#),
        ]
        .into_iter()
        .filter_map(|(label, source)| {
            regex::Regex::new(source)
                .ok()
                .map(|pattern| MarkupRule { label, pattern })
        })
        .collect()
    })
}

/// Name of the first disallowed markup pattern found in `content`
pub fn find_disallowed_markup(content: &str) -> Option<&'static str> {
    markup_rules()
        .iter()
        .find(|rule| rule.pattern.is_match(content))
        .map(|rule| rule.label)
}

struct RegisteredAgent {
    id: String,
    agent: Box<dyn Agent>,
}

/// Routes requests to agents and relays messages between them
#[derive(Default)]
pub struct Orchestrator {
    /// Agents in registration order
    agents: Vec<RegisteredAgent>,
    /// Agent id -> position in `agents`
    index: HashMap<String, usize>,
}

impl Orchestrator {
    /// Create an orchestrator with no agents
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent under `agent_id`
    ///
    /// Fails on a duplicate id or an agent that does not pass the
    /// structural check; nothing is stored in either case.
    pub fn register_agent(&mut self, agent_id: impl Into<String>, agent: Box<dyn Agent>) -> Result<()> {
        let agent_id = agent_id.into();

        if self.index.contains_key(&agent_id) {
            warn!(agent_id = %agent_id, "Duplicate agent registration");
            return Err(SwitchboardError::DuplicateAgent(agent_id));
        }

        if let Err(e) = Self::check_structure(&agent_id, agent.as_ref()) {
            warn!(agent_id = %agent_id, error = %e, "Agent failed validation");
            return Err(e);
        }

        debug!(
            agent_id = %agent_id,
            name = agent.name(),
            capabilities = ?agent.capabilities(),
            "Registered agent"
        );
        self.index.insert(agent_id.clone(), self.agents.len());
        self.agents.push(RegisteredAgent { id: agent_id, agent });
        Ok(())
    }

    fn check_structure(agent_id: &str, agent: &dyn Agent) -> Result<()> {
        if agent_id.trim().is_empty() {
            return Err(SwitchboardError::invalid_agent(agent_id, "empty agent id"));
        }
        if agent.name().trim().is_empty() {
            return Err(SwitchboardError::invalid_agent(agent_id, "empty name"));
        }
        if agent.capabilities().is_empty() {
            return Err(SwitchboardError::invalid_agent(agent_id, "no capabilities"));
        }
        Ok(())
    }

    /// Metadata of every registered agent
    pub fn get_available_agents(&self) -> BTreeMap<String, AgentInfo> {
        self.agents
            .iter()
            .map(|entry| {
                let info = AgentInfo {
                    name: entry.agent.name().to_string(),
                    description: entry.agent.description().to_string(),
                    capabilities: entry.agent.capabilities().to_vec(),
                };
                (entry.id.clone(), info)
            })
            .collect()
    }

    /// Registered agent ids in registration order
    pub fn agent_ids(&self) -> Vec<&str> {
        self.agents.iter().map(|entry| entry.id.as_str()).collect()
    }

    pub fn has_agent(&self, agent_id: &str) -> bool {
        self.index.contains_key(agent_id)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Score every agent, in registration order
    pub fn score_agents(&self, request_text: &str, context: &Context) -> Vec<IntentScore> {
        self.agents
            .iter()
            .map(|entry| {
                IntentScore::new(
                    entry.id.clone(),
                    entry.agent.evaluate_request(request_text, context),
                )
            })
            .collect()
    }

    fn select_intent(&self, request_text: &str, context: &Context) -> Result<IntentScore> {
        let mut best: Option<IntentScore> = None;

        for score in self.score_agents(request_text, context) {
            debug!(agent_id = %score.agent_id, score = score.score, "Scored agent");
            // Strictly greater: on a tie the earlier registration keeps the lead.
            if best.as_ref().map_or(true, |b| score.score > b.score) {
                best = Some(score);
            }
        }

        best.ok_or_else(|| {
            error!("No agents registered");
            SwitchboardError::NoAgentsRegistered
        })
    }

    /// Id of the agent best suited to the request
    ///
    /// Ties go to the agent registered first. An empty agent table is a
    /// configuration error.
    pub fn determine_primary_intent(&self, request_text: &str, context: &Context) -> Result<String> {
        self.select_intent(request_text, context)
            .map(|intent| intent.agent_id)
    }

    /// Route a request to the best agent and return its result
    pub async fn process_request(&self, request_text: &str, context: &Context) -> Result<AgentResult> {
        let intent = self.select_intent(request_text, context)?;
        info!(agent_id = %intent.agent_id, score = intent.score, "Routed request");

        let intent_data = json!({
            "request": request_text,
            "intent": intent.agent_id,
            "score": intent.score,
        });

        Ok(self.dispatch(&intent.agent_id, &intent_data, context, 0).await)
    }

    async fn dispatch(
        &self,
        agent_id: &str,
        intent_data: &Value,
        context: &Context,
        depth: usize,
    ) -> AgentResult {
        let entry = match self.index.get(agent_id).map(|&i| &self.agents[i]) {
            Some(entry) => entry,
            None => {
                warn!(agent_id, "Dispatch to unknown agent");
                return AgentResult::failure(format!("Agent '{}' not found", agent_id));
            }
        };

        let relay = Relay {
            orchestrator: self,
            agent_id,
            depth,
        };

        debug!(agent_id, depth, "Dispatching");
        let result = entry
            .agent
            .process_request(intent_data, context, &relay)
            .await;

        if !result.success {
            debug!(agent_id, message = %result.message, "Agent reported failure");
        }
        result.with_agent(agent_id)
    }

    /// Check a message, returning the first reason it cannot be delivered
    pub fn check_agent_message(&self, message: &AgentMessage) -> std::result::Result<(), MessageRejection> {
        if let Some(label) = find_disallowed_markup(message.content()) {
            return Err(MessageRejection::DisallowedMarkup(label));
        }
        if !self.has_agent(message.sender()) {
            return Err(MessageRejection::UnknownSender(message.sender().to_string()));
        }
        if !self.has_agent(message.receiver()) {
            return Err(MessageRejection::UnknownReceiver(message.receiver().to_string()));
        }
        if message.message_type().trim().is_empty() {
            return Err(MessageRejection::EmptyMessageType);
        }
        Ok(())
    }

    /// Whether a message may be delivered
    pub fn validate_agent_message(&self, message: &AgentMessage) -> bool {
        self.screen(message).is_ok()
    }

    fn screen(&self, message: &AgentMessage) -> std::result::Result<(), MessageRejection> {
        self.check_agent_message(message).map_err(|rejection| {
            warn!(
                sender = message.sender(),
                receiver = message.receiver(),
                reason = %rejection,
                "Rejected agent message"
            );
            rejection
        })
    }

    /// Validate a message and, if valid, deliver it to its receiver
    pub async fn send_agent_message(&self, message: AgentMessage) -> AgentResult {
        self.relay_message(message, None, 0).await
    }

    /// Deliver `message` as hop `depth + 1` of its chain
    ///
    /// `relayed_by` is the agent whose relay sent it; the host sends with `None`.
    async fn relay_message(
        &self,
        message: AgentMessage,
        relayed_by: Option<&str>,
        depth: usize,
    ) -> AgentResult {
        let hop = depth + 1;
        if hop > MAX_RELAY_DEPTH {
            warn!(
                sender = message.sender(),
                receiver = message.receiver(),
                hop,
                "Relay depth exceeded"
            );
            return AgentResult::failure(format!(
                "Relay depth limit of {} exceeded",
                MAX_RELAY_DEPTH
            ));
        }

        if let Some(agent_id) = relayed_by.filter(|id| *id != message.sender()) {
            let rejection = MessageRejection::SenderMismatch {
                relayed_by: agent_id.to_string(),
                sender: message.sender().to_string(),
            };
            warn!(reason = %rejection, "Rejected agent message");
            return AgentResult::failure(format!("Message rejected: {}", rejection));
        }

        if let Err(rejection) = self.screen(&message) {
            return AgentResult::failure(format!("Message rejected: {}", rejection));
        }

        info!(
            sender = message.sender(),
            receiver = message.receiver(),
            message_type = message.message_type(),
            "Delivering agent message"
        );

        let intent_data = json!({
            "request": message.content(),
            "message_type": message.message_type(),
            "sender": message.sender(),
            "metadata": message.metadata(),
        });

        self.dispatch(message.receiver(), &intent_data, &Context::new(), hop)
            .await
    }
}

/// Relay handed to an agent while it is being dispatched
struct Relay<'a> {
    orchestrator: &'a Orchestrator,
    /// Id the agent was dispatched under; the only sender it may use
    agent_id: &'a str,
    /// Relay hops already taken to reach this agent
    depth: usize,
}

#[async_trait]
impl<'a> MessageRelay for Relay<'a> {
    async fn send(&self, message: AgentMessage) -> AgentResult {
        self.orchestrator
            .relay_message(message, Some(self.agent_id), self.depth)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::message_type;
    use crate::agent::traits::request_text;
    use serde_json::Map;

    struct FixedAgent {
        name: String,
        capabilities: Vec<String>,
        score: u32,
    }

    impl FixedAgent {
        fn boxed(name: &str, score: u32) -> Box<dyn Agent> {
            Box::new(Self {
                name: name.to_string(),
                capabilities: vec!["general".to_string()],
                score,
            })
        }
    }

    #[async_trait]
    impl Agent for FixedAgent {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "Returns a fixed score"
        }

        fn capabilities(&self) -> &[String] {
            &self.capabilities
        }

        fn evaluate_request(&self, _request_text: &str, _context: &Context) -> u32 {
            self.score
        }

        async fn process_request(
            &self,
            intent_data: &Value,
            _context: &Context,
            _relay: &dyn MessageRelay,
        ) -> AgentResult {
            AgentResult::success(format!("{} handled: {}", self.name, request_text(intent_data)))
        }
    }

    /// Forwards whatever it receives to `target`, signing as `sender`
    struct ForwardingAgent {
        capabilities: Vec<String>,
        sender: String,
        target: String,
    }

    #[async_trait]
    impl Agent for ForwardingAgent {
        fn name(&self) -> &str {
            "Forwarder"
        }

        fn description(&self) -> &str {
            "Forwards requests"
        }

        fn capabilities(&self) -> &[String] {
            &self.capabilities
        }

        fn evaluate_request(&self, _request_text: &str, _context: &Context) -> u32 {
            90
        }

        async fn process_request(
            &self,
            intent_data: &Value,
            _context: &Context,
            relay: &dyn MessageRelay,
        ) -> AgentResult {
            relay
                .send(AgentMessage::handoff(
                    self.sender.clone(),
                    self.target.clone(),
                    request_text(intent_data),
                ))
                .await
        }
    }

    fn forwarder(sender: &str, target: &str) -> Box<dyn Agent> {
        Box::new(ForwardingAgent {
            capabilities: vec!["forward".to_string()],
            sender: sender.to_string(),
            target: target.to_string(),
        })
    }

    #[test]
    fn test_register_duplicate() {
        let mut orchestrator = Orchestrator::new();
        assert!(orchestrator.register_agent("a", FixedAgent::boxed("A", 1)).is_ok());
        let err = orchestrator
            .register_agent("a", FixedAgent::boxed("A2", 1))
            .unwrap_err();
        assert!(matches!(err, SwitchboardError::DuplicateAgent(_)));
        assert_eq!(orchestrator.agent_count(), 1);
        assert_eq!(orchestrator.get_available_agents()["a"].name, "A");
    }

    #[test]
    fn test_register_rejects_malformed() {
        let mut orchestrator = Orchestrator::new();
        let no_caps = Box::new(FixedAgent {
            name: "Empty".to_string(),
            capabilities: Vec::new(),
            score: 0,
        });
        assert!(matches!(
            orchestrator.register_agent("empty", no_caps),
            Err(SwitchboardError::InvalidAgent { .. })
        ));
        assert!(orchestrator.register_agent("", FixedAgent::boxed("A", 1)).is_err());
        assert!(orchestrator.register_agent("a", FixedAgent::boxed(" ", 1)).is_err());
        assert_eq!(orchestrator.agent_count(), 0);
    }

    #[test]
    fn test_highest_score_wins() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.register_agent("low", FixedAgent::boxed("Low", 10)).unwrap();
        orchestrator.register_agent("high", FixedAgent::boxed("High", 70)).unwrap();

        let intent = orchestrator
            .determine_primary_intent("anything", &Context::new())
            .unwrap();
        assert_eq!(intent, "high");
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.register_agent("first", FixedAgent::boxed("First", 50)).unwrap();
        orchestrator.register_agent("second", FixedAgent::boxed("Second", 50)).unwrap();

        for _ in 0..3 {
            assert_eq!(
                orchestrator
                    .determine_primary_intent("same", &Context::new())
                    .unwrap(),
                "first"
            );
        }
    }

    #[test]
    fn test_zero_scores_still_route() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.register_agent("only", FixedAgent::boxed("Only", 0)).unwrap();
        assert_eq!(
            orchestrator
                .determine_primary_intent("x", &Context::new())
                .unwrap(),
            "only"
        );
    }

    #[test]
    fn test_no_agents_is_error() {
        let orchestrator = Orchestrator::new();
        assert!(matches!(
            orchestrator.determine_primary_intent("x", &Context::new()),
            Err(SwitchboardError::NoAgentsRegistered)
        ));
    }

    #[tokio::test]
    async fn test_process_request_tags_agent() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.register_agent("a", FixedAgent::boxed("A", 5)).unwrap();

        let result = orchestrator
            .process_request("do it", &Context::new())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.agent.as_deref(), Some("a"));
        assert_eq!(result.message, "A handled: do it");
    }

    #[tokio::test]
    async fn test_dispatch_unknown_agent() {
        let orchestrator = Orchestrator::new();
        let result = orchestrator
            .dispatch("ghost", &Value::Null, &Context::new(), 0)
            .await;
        assert!(!result.success);
    }

    #[test]
    fn test_validate_message() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.register_agent("agent1", FixedAgent::boxed("One", 1)).unwrap();
        orchestrator.register_agent("agent2", FixedAgent::boxed("Two", 1)).unwrap();

        let mut metadata = Map::new();
        metadata.insert("priority".into(), json!("high"));
        let ok = AgentMessage::new("agent1", "agent2", message_type::REQUEST, "hello", metadata);
        assert!(orchestrator.validate_agent_message(&ok));

        let unknown = AgentMessage::request("agent1", "agent9", "hello");
        assert_eq!(
            orchestrator.check_agent_message(&unknown),
            Err(MessageRejection::UnknownReceiver("agent9".into()))
        );

        let spoofed = AgentMessage::request("intruder", "agent2", "hello");
        assert!(!orchestrator.validate_agent_message(&spoofed));

        let untyped = AgentMessage::new("agent1", "agent2", "", "hello", Map::new());
        assert!(!orchestrator.validate_agent_message(&untyped));
    }

    #[test]
    fn test_script_content_rejected_regardless_of_parties() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.register_agent("agent1", FixedAgent::boxed("One", 1)).unwrap();
        orchestrator.register_agent("agent2", FixedAgent::boxed("Two", 1)).unwrap();

        for (sender, receiver) in [("agent1", "agent2"), ("x", "y")] {
            let message = AgentMessage::request(sender, receiver, "hi <script>alert(1)</script>");
            assert!(matches!(
                orchestrator.check_agent_message(&message),
                Err(MessageRejection::DisallowedMarkup(_))
            ));
        }
    }

    #[test]
    fn test_markup_patterns() {
        assert_eq!(find_disallowed_markup("<SCRIPT src=x>"), Some("script tag"));
        assert_eq!(find_disallowed_markup("click javascript:alert(1)"), Some("javascript url"));
        assert_eq!(
            find_disallowed_markup(r#"<img src="x" onerror="alert(1)">"#),
            Some("event handler attribute")
        );
        assert_eq!(
            find_disallowed_markup("<svg/onload=alert(1)>"),
            Some("event handler attribute")
        );
        assert_eq!(
            find_disallowed_markup(r#"<img src=x"onerror=alert(1)>"#),
            Some("event handler attribute")
        );
        assert_eq!(
            find_disallowed_markup("<img src='x'onerror=alert(1)>"),
            Some("event handler attribute")
        );
        assert_eq!(find_disallowed_markup("list memberships online = yes"), None);
        assert_eq!(find_disallowed_markup("<b>bonus</b> = 5"), None);
        assert_eq!(find_disallowed_markup("a < b and c > d"), None);
    }

    #[tokio::test]
    async fn test_send_message_delivers_content() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.register_agent("agent1", FixedAgent::boxed("One", 1)).unwrap();
        orchestrator.register_agent("agent2", FixedAgent::boxed("Two", 1)).unwrap();

        let result = orchestrator
            .send_agent_message(AgentMessage::request("agent1", "agent2", "hello"))
            .await;
        assert!(result.success);
        assert_eq!(result.message, "Two handled: hello");
        assert_eq!(result.agent.as_deref(), Some("agent2"));

        let rejected = orchestrator
            .send_agent_message(AgentMessage::request("agent1", "nobody", "hello"))
            .await;
        assert!(!rejected.success);
        assert!(rejected.message.contains("unknown receiver"));
    }

    #[tokio::test]
    async fn test_agent_relay_goes_through_validation() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.register_agent("forwarder", forwarder("forwarder", "helper")).unwrap();
        orchestrator.register_agent("helper", FixedAgent::boxed("Helper", 1)).unwrap();

        let result = orchestrator
            .process_request("please help", &Context::new())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.message, "Helper handled: please help");

        let blocked = orchestrator
            .process_request("<script>x</script>", &Context::new())
            .await
            .unwrap();
        assert!(!blocked.success);
        assert_eq!(blocked.agent.as_deref(), Some("forwarder"));
    }

    #[tokio::test]
    async fn test_relay_depth_bounded() {
        let mut orchestrator = Orchestrator::new();
        // Forwards to itself until the depth limit stops it.
        orchestrator.register_agent("forwarder", forwarder("forwarder", "forwarder")).unwrap();

        let result = orchestrator
            .process_request("loop", &Context::new())
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.message.contains("depth"));
    }

    #[tokio::test]
    async fn test_relay_rejects_spoofed_sender() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.register_agent("spoofer", forwarder("victim", "receiver")).unwrap();
        orchestrator.register_agent("victim", FixedAgent::boxed("Victim", 1)).unwrap();
        orchestrator.register_agent("receiver", FixedAgent::boxed("Receiver", 1)).unwrap();

        let result = orchestrator
            .process_request("hi", &Context::new())
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.agent.as_deref(), Some("spoofer"));
        assert!(result.message.contains("cannot send as 'victim'"), "{}", result.message);

        // The host is not bound to an agent id.
        let hosted = orchestrator
            .send_agent_message(AgentMessage::request("victim", "receiver", "hi"))
            .await;
        assert!(hosted.success);
    }

    /// `l0 -> l1 -> ... -> l{links-1} -> end`, with `l0` winning routing
    fn chain(links: usize) -> Orchestrator {
        let mut orchestrator = Orchestrator::new();
        for i in 0..links {
            let id = format!("l{}", i);
            let next = if i + 1 == links { "end".to_string() } else { format!("l{}", i + 1) };
            orchestrator.register_agent(id.clone(), forwarder(&id, &next)).unwrap();
        }
        orchestrator.register_agent("end", FixedAgent::boxed("End", 0)).unwrap();
        orchestrator
    }

    #[tokio::test]
    async fn test_relay_depth_counts_hops_from_dispatch() {
        let within = chain(MAX_RELAY_DEPTH)
            .process_request("pass it on", &Context::new())
            .await
            .unwrap();
        assert!(within.success, "{}", within.message);
        assert_eq!(within.message, "End handled: pass it on");

        let beyond = chain(MAX_RELAY_DEPTH + 1)
            .process_request("pass it on", &Context::new())
            .await
            .unwrap();
        assert!(!beyond.success);
        assert!(beyond.message.contains("depth"));
    }

    #[tokio::test]
    async fn test_relay_depth_counts_hops_from_host() {
        // The host's send is the first hop, just like a dispatched agent's.
        let within = chain(MAX_RELAY_DEPTH)
            .send_agent_message(AgentMessage::handoff("l0", "l1", "pass it on"))
            .await;
        assert!(within.success, "{}", within.message);

        let beyond = chain(MAX_RELAY_DEPTH + 1)
            .send_agent_message(AgentMessage::handoff("l0", "l1", "pass it on"))
            .await;
        assert!(!beyond.success);
        assert!(beyond.message.contains("depth"));
    }
}
