//! Agent discovery
//!
//! Agents are discovered from an explicit, ordered catalog of
//! `(agent_id, factory)` pairs. Catalog order is registration order, which
//! is what breaks scoring ties.

use std::sync::Arc;

use tracing::{debug, info};

use crate::agent::agents::{CommandValidationAgent, MemberPressAgent, WordPressAgent};
use crate::agent::orchestrator::Orchestrator;
use crate::agent::traits::Agent;
use crate::cache::ResponseCache;
use crate::core::{Config, Result};
use crate::tools::ToolRegistry;

/// Shared collaborators handed to agent factories
#[derive(Clone)]
pub struct AgentDeps {
    pub tools: Arc<ToolRegistry>,
    pub cache: Option<Arc<ResponseCache>>,
}

impl AgentDeps {
    pub fn new(tools: Arc<ToolRegistry>, cache: Option<Arc<ResponseCache>>) -> Self {
        Self { tools, cache }
    }

    /// Build the tool registry and cache described by `config`
    pub fn from_config(config: &Config) -> Self {
        Self {
            tools: Arc::new(ToolRegistry::with_builtin(&config.tools)),
            cache: ResponseCache::from_config(&config.cache).map(Arc::new),
        }
    }
}

/// Builds one agent instance
pub type AgentFactory = Box<dyn Fn(&AgentDeps) -> Box<dyn Agent> + Send + Sync>;

/// Ordered list of discoverable agents
#[derive(Default)]
pub struct AgentCatalog {
    entries: Vec<(String, AgentFactory)>,
}

impl AgentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in agents in discovery order
    pub fn builtin() -> Self {
        Self::new()
            .with(MemberPressAgent::ID, |deps| {
                Box::new(MemberPressAgent::new(
                    Arc::clone(&deps.tools),
                    deps.cache.clone(),
                ))
            })
            .with(WordPressAgent::ID, |deps| {
                Box::new(WordPressAgent::new(
                    Arc::clone(&deps.tools),
                    deps.cache.clone(),
                ))
            })
            .with(CommandValidationAgent::ID, |_| {
                Box::new(CommandValidationAgent::new())
            })
    }

    /// Append an entry
    pub fn with<F>(mut self, agent_id: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&AgentDeps) -> Box<dyn Agent> + Send + Sync + 'static,
    {
        self.entries.push((agent_id.into(), Box::new(factory)));
        self
    }

    /// Catalog ids in discovery order
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.as_str()).collect()
    }
}

impl Orchestrator {
    /// Instantiate and register every catalog entry accepted by `enabled`
    ///
    /// Stops at the first registration error.
    pub fn discover(
        catalog: &AgentCatalog,
        deps: &AgentDeps,
        enabled: impl Fn(&str) -> bool,
    ) -> Result<Self> {
        let mut orchestrator = Orchestrator::new();

        for (agent_id, factory) in &catalog.entries {
            if !enabled(agent_id) {
                debug!(agent_id = %agent_id, "Agent disabled; skipping");
                continue;
            }
            orchestrator.register_agent(agent_id.clone(), factory(deps))?;
        }

        info!(agents = ?orchestrator.agent_ids(), "Agent discovery complete");
        Ok(orchestrator)
    }
}

/// Build the orchestrator and its collaborators from configuration
pub fn bootstrap(config: &Config) -> Result<(Orchestrator, AgentDeps)> {
    let deps = AgentDeps::from_config(config);
    let orchestrator = Orchestrator::discover(&AgentCatalog::builtin(), &deps, |id| {
        config.is_agent_enabled(id)
    })?;
    Ok((orchestrator, deps))
}
