//! Tool registry - names tools up front, builds them on first use
//!
//! Tools are registered either eagerly, as a ready instance, or lazily, as a
//! definition naming an implementation and an optional source file. A lazy
//! definition is constructed the first time [`ToolRegistry::get_tool`] asks
//! for it and cached from then on. Absence and load failures are normal
//! conditions: they are logged and reported as `None`/`false`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::core::config::ToolsConfig;
use crate::core::{Result, SwitchboardError, ToolResult};
use crate::tools::membership::MembershipTool;
use crate::tools::traits::Tool;
use crate::tools::wp_cli::WpCliTool;

/// Constructor for a named tool implementation
pub type ToolFactory = Arc<dyn Fn() -> Result<Arc<dyn Tool>> + Send + Sync>;

/// A lazily constructed tool
///
/// `instance` is `Some` exactly when the definition is loaded.
pub struct ToolDefinition {
    id: String,
    implementation_class: String,
    source_path: Option<PathBuf>,
    instance: Mutex<Option<Arc<dyn Tool>>>,
}

impl ToolDefinition {
    fn new(id: String, implementation_class: String, source_path: Option<PathBuf>) -> Self {
        Self {
            id,
            implementation_class,
            source_path,
            instance: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn implementation_class(&self) -> &str {
        &self.implementation_class
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Whether the instance has been constructed
    pub fn is_loaded(&self) -> bool {
        self.instance.lock().is_some()
    }
}

enum ToolEntry {
    Instance(Arc<dyn Tool>),
    Definition(ToolDefinition),
}

/// Introspection view of one registered tool
#[derive(Clone)]
pub enum ToolStatus {
    /// Constructed (eager, or lazy and already resolved)
    Loaded(Arc<dyn Tool>),
    /// Lazy definition not yet resolved
    Unloaded { class: String },
}

impl ToolStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ToolStatus::Loaded(_))
    }
}

impl fmt::Debug for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolStatus::Loaded(tool) => f.debug_tuple("Loaded").field(&tool.id()).finish(),
            ToolStatus::Unloaded { class } => f
                .debug_struct("Unloaded")
                .field("class", class)
                .field("loaded", &false)
                .finish(),
        }
    }
}

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    /// Registered tools indexed by id
    entries: HashMap<String, ToolEntry>,
    /// Known implementations indexed by class name
    implementations: HashMap<String, ToolFactory>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in tools defined lazily
    pub fn with_builtin(config: &ToolsConfig) -> Self {
        let mut registry = Self::new();

        let wp_config = config.clone();
        registry.provide_implementation(WpCliTool::CLASS, move || {
            Ok(Arc::new(WpCliTool::from_config(&wp_config)?) as Arc<dyn Tool>)
        });
        registry.provide_implementation(MembershipTool::CLASS, || {
            Ok(Arc::new(MembershipTool::new()) as Arc<dyn Tool>)
        });

        registry.register_tool_definition(WpCliTool::ID, WpCliTool::CLASS, None::<PathBuf>);
        registry.register_tool_definition(MembershipTool::ID, MembershipTool::CLASS, None::<PathBuf>);

        registry
    }

    /// Make an implementation constructible by class name
    ///
    /// A later call with the same class name replaces the factory.
    pub fn provide_implementation<F>(&mut self, class_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Arc<dyn Tool>> + Send + Sync + 'static,
    {
        self.implementations
            .insert(class_name.into(), Arc::new(factory));
    }

    /// Register a ready instance; `false` if the id is taken
    pub fn register_tool(&mut self, tool_id: impl Into<String>, instance: Arc<dyn Tool>) -> bool {
        let tool_id = tool_id.into();
        if self.entries.contains_key(&tool_id) {
            warn!(tool_id = %tool_id, "Tool id already registered");
            return false;
        }

        debug!(tool_id = %tool_id, "Registered tool instance");
        self.entries.insert(tool_id, ToolEntry::Instance(instance));
        true
    }

    /// Register a lazy definition; `false` if the id is taken
    ///
    /// Neither the class nor the source file is checked here.
    pub fn register_tool_definition(
        &mut self,
        tool_id: impl Into<String>,
        class_name: impl Into<String>,
        source_path: Option<impl Into<PathBuf>>,
    ) -> bool {
        let tool_id = tool_id.into();
        if self.entries.contains_key(&tool_id) {
            warn!(tool_id = %tool_id, "Tool id already registered");
            return false;
        }

        let definition =
            ToolDefinition::new(tool_id.clone(), class_name.into(), source_path.map(Into::into));
        debug!(
            tool_id = %tool_id,
            class = definition.implementation_class(),
            "Registered tool definition"
        );
        self.entries
            .insert(tool_id, ToolEntry::Definition(definition));
        true
    }

    /// Resolve a tool by id, constructing it on first use
    pub fn get_tool(&self, tool_id: &str) -> Option<Arc<dyn Tool>> {
        let entry = match self.entries.get(tool_id) {
            Some(entry) => entry,
            None => {
                debug!(tool_id, "Tool not registered");
                return None;
            }
        };

        let definition = match entry {
            ToolEntry::Instance(tool) => return Some(Arc::clone(tool)),
            ToolEntry::Definition(definition) => definition,
        };

        // Held across construction so concurrent callers build at most once.
        let mut slot = definition.instance.lock();
        if let Some(tool) = slot.as_ref() {
            return Some(Arc::clone(tool));
        }

        match self.load(definition) {
            Ok(tool) => {
                info!(
                    tool_id,
                    class = definition.implementation_class(),
                    "Loaded tool"
                );
                *slot = Some(Arc::clone(&tool));
                Some(tool)
            }
            Err(e) => {
                warn!(tool_id, error = %e, "Tool unavailable");
                None
            }
        }
    }

    fn load(&self, definition: &ToolDefinition) -> Result<Arc<dyn Tool>> {
        if let Some(path) = definition.source_path() {
            let unreadable = |e: std::io::Error| {
                SwitchboardError::tool(format!(
                    "cannot read source {}: {}",
                    path.display(),
                    e
                ))
            };
            let file = File::open(path).map_err(unreadable)?;
            if !file.metadata().map_err(unreadable)?.is_file() {
                return Err(SwitchboardError::tool(format!(
                    "source {} is not a file",
                    path.display()
                )));
            }
        }

        let factory = self
            .implementations
            .get(definition.implementation_class())
            .ok_or_else(|| {
                SwitchboardError::tool(format!(
                    "implementation '{}' not found",
                    definition.implementation_class()
                ))
            })?;

        factory().map_err(|e| {
            error!(
                class = definition.implementation_class(),
                error = %e,
                "Tool constructor failed"
            );
            e
        })
    }

    /// Snapshot of every registered tool and its load state
    pub fn get_available_tools(&self) -> BTreeMap<String, ToolStatus> {
        self.entries
            .iter()
            .map(|(id, entry)| {
                let status = match entry {
                    ToolEntry::Instance(tool) => ToolStatus::Loaded(Arc::clone(tool)),
                    ToolEntry::Definition(definition) => match definition.instance.lock().as_ref() {
                        Some(tool) => ToolStatus::Loaded(Arc::clone(tool)),
                        None => ToolStatus::Unloaded {
                            class: definition.implementation_class().to_string(),
                        },
                    },
                };
                (id.clone(), status)
            })
            .collect()
    }

    /// Whether a tool id is registered (loaded or not)
    pub fn has_tool(&self, tool_id: &str) -> bool {
        self.entries.contains_key(tool_id)
    }

    /// Load state of a tool id; `None` if unregistered
    pub fn is_loaded(&self, tool_id: &str) -> Option<bool> {
        self.entries.get(tool_id).map(|entry| match entry {
            ToolEntry::Instance(_) => true,
            ToolEntry::Definition(definition) => definition.is_loaded(),
        })
    }

    /// Resolve and run a tool, folding unavailability and errors into the result
    pub async fn execute(&self, tool_id: &str, params: &Value) -> ToolResult {
        let tool = match self.get_tool(tool_id) {
            Some(tool) => tool,
            None => {
                return ToolResult::failure(tool_id, format!("Tool '{}' is unavailable", tool_id))
            }
        };

        match tool.execute(params).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool_id, error = %e, "Tool execution failed");
                ToolResult::failure(tool_id, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn id(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its parameters"
        }

        async fn execute(&self, params: &Value) -> Result<ToolResult> {
            Ok(ToolResult::success("echo", params.to_string()))
        }
    }

    fn counting_registry(counter: Arc<AtomicUsize>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.provide_implementation("EchoTool", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(EchoTool) as Arc<dyn Tool>)
        });
        registry
    }

    #[test]
    fn test_register_twice() {
        let mut registry = ToolRegistry::new();
        assert!(registry.register_tool("echo", Arc::new(EchoTool)));
        assert!(!registry.register_tool("echo", Arc::new(EchoTool)));
        assert!(registry.register_tool_definition("lazy", "EchoTool", None::<PathBuf>));
        assert!(!registry.register_tool_definition("lazy", "EchoTool", None::<PathBuf>));
        assert!(!registry.register_tool_definition("echo", "EchoTool", None::<PathBuf>));
    }

    #[test]
    fn test_lazy_constructs_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = counting_registry(Arc::clone(&counter));
        registry.register_tool_definition("echo", "EchoTool", None::<PathBuf>);

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(registry.is_loaded("echo"), Some(false));

        let first = registry.get_tool("echo").unwrap();
        let second = registry.get_tool("echo").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry.is_loaded("echo"), Some(true));
    }

    #[test]
    fn test_missing_class_stays_unloaded() {
        let mut registry = ToolRegistry::new();
        registry.register_tool_definition("ghost", "NoSuchTool", None::<PathBuf>);

        assert!(registry.get_tool("ghost").is_none());
        assert_eq!(registry.is_loaded("ghost"), Some(false));
        assert!(!registry.get_available_tools()["ghost"].is_loaded());
    }

    #[test]
    fn test_missing_source_stays_unloaded() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = counting_registry(Arc::clone(&counter));
        registry.register_tool_definition(
            "echo",
            "EchoTool",
            Some("/nonexistent/switchboard/echo_tool.rs"),
        );

        assert!(registry.get_tool("echo").is_none());
        assert_eq!(registry.is_loaded("echo"), Some(false));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_directory_source_stays_unloaded() {
        let dir = tempfile::tempdir().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = counting_registry(Arc::clone(&counter));
        registry.register_tool_definition("echo", "EchoTool", Some(dir.path()));

        assert!(registry.get_tool("echo").is_none());
        assert_eq!(registry.is_loaded("echo"), Some(false));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_existing_source_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "echo tool").unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = counting_registry(Arc::clone(&counter));
        registry.register_tool_definition("echo", "EchoTool", Some(file.path()));

        assert!(registry.get_tool("echo").is_some());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_constructor_retries_later() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&attempts);
        let mut registry = ToolRegistry::new();
        registry.provide_implementation("Flaky", move || {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(SwitchboardError::tool("not yet"))
            } else {
                Ok(Arc::new(EchoTool) as Arc<dyn Tool>)
            }
        });
        registry.register_tool_definition("flaky", "Flaky", None::<PathBuf>);

        assert!(registry.get_tool("flaky").is_none());
        assert_eq!(registry.is_loaded("flaky"), Some(false));
        assert!(registry.get_tool("flaky").is_some());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_available_tools_snapshot() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = counting_registry(counter);
        registry.register_tool("eager", Arc::new(EchoTool));
        registry.register_tool_definition("lazy", "EchoTool", None::<PathBuf>);

        let tools = registry.get_available_tools();
        assert!(tools["eager"].is_loaded());
        match &tools["lazy"] {
            ToolStatus::Unloaded { class } => assert_eq!(class, "EchoTool"),
            other => panic!("unexpected status: {:?}", other),
        }

        registry.get_tool("lazy");
        assert!(registry.get_available_tools()["lazy"].is_loaded());
    }

    #[test]
    fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        assert!(registry.get_tool("nope").is_none());
        assert_eq!(registry.is_loaded("nope"), None);
        assert!(!registry.has_tool("nope"));
    }

    #[tokio::test]
    async fn test_execute_unavailable_tool() {
        let registry = ToolRegistry::new();
        let result = registry.execute("nope", &Value::Null).await;
        assert!(!result.success);
        assert!(result.output.contains("unavailable"));
    }

    #[tokio::test]
    async fn test_execute_resolves_lazily() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = counting_registry(Arc::clone(&counter));
        registry.register_tool_definition("echo", "EchoTool", None::<PathBuf>);

        let result = registry
            .execute("echo", &serde_json::json!({"x": 1}))
            .await;
        assert!(result.success);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
