//! Plugin registry, keyed by hook name.
//!
//! The registry is assembled once through [`PluginRegistryBuilder`] while
//! plugins load, then frozen. A frozen [`PluginRegistry`] is never mutated,
//! so any number of pipeline threads can look candidates up at the same time
//! without locking.

use std::collections::HashMap;

use crate::callback::{CallbackShape, HookCallback};

/// Read side of a hook registry, as seen by the dispatcher.
pub trait HookRegistry: Send + Sync {
    /// All candidates registered under `name` whose shape is `shape`,
    /// in registration order.
    fn lookup(&self, name: &str, shape: CallbackShape) -> Vec<&Candidate>;
}

/// One registered callback together with the plugin that supplied it.
#[derive(Debug, Clone)]
pub struct Candidate {
    plugin: String,
    callback: HookCallback,
}

impl Candidate {
    pub fn new(plugin: impl Into<String>, callback: HookCallback) -> Self {
        Self {
            plugin: plugin.into(),
            callback,
        }
    }

    /// Name of the plugin that registered this callback.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn callback(&self) -> &HookCallback {
        &self.callback
    }

    pub fn shape(&self) -> CallbackShape {
        self.callback.shape()
    }
}

/// A unit of callbacks loaded together.
///
/// Hook names are plain strings: a plugin may export callbacks under names
/// no dispatcher entry point queries, and those are simply never invoked.
pub trait Plugin {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Callbacks this plugin exports, as `(hook name, callback)` pairs.
    fn hooks(&self) -> Vec<(String, HookCallback)>;
}

/// Immutable registry of plugin callbacks.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    hooks: HashMap<String, Vec<Candidate>>,
    plugins: Vec<String>,
}

impl PluginRegistry {
    pub fn builder() -> PluginRegistryBuilder {
        PluginRegistryBuilder::new()
    }

    /// Total number of registered callbacks across all hook names.
    pub fn len(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Hook names with at least one registration, sorted.
    pub fn hook_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Plugins in load order.
    pub fn plugin_names(&self) -> &[String] {
        &self.plugins
    }

    /// Every candidate under `name`, regardless of shape.
    pub fn candidates(&self, name: &str) -> &[Candidate] {
        self.hooks.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl HookRegistry for PluginRegistry {
    fn lookup(&self, name: &str, shape: CallbackShape) -> Vec<&Candidate> {
        self.candidates(name)
            .iter()
            .filter(|c| c.shape() == shape)
            .collect()
    }
}

/// Collects registrations in order, then freezes them into a [`PluginRegistry`].
#[derive(Debug, Default)]
pub struct PluginRegistryBuilder {
    hooks: HashMap<String, Vec<Candidate>>,
    plugins: Vec<String>,
}

impl PluginRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single callback on behalf of `plugin`.
    pub fn register(
        mut self,
        plugin: impl Into<String>,
        hook: impl Into<String>,
        callback: HookCallback,
    ) -> Self {
        self.push(plugin.into(), hook.into(), callback);
        self
    }

    /// Register every callback a plugin exports, in the plugin's order.
    pub fn load(mut self, plugin: &dyn Plugin) -> Self {
        let name = plugin.name().to_string();
        let hooks = plugin.hooks();
        tracing::debug!(plugin = %name, callbacks = hooks.len(), "loading plugin");
        for (hook, callback) in hooks {
            self.push(name.clone(), hook, callback);
        }
        self
    }

    fn push(&mut self, plugin: String, hook: String, callback: HookCallback) {
        tracing::trace!(plugin = %plugin, hook = %hook, shape = ?callback.shape(), "registering callback");
        if !self.plugins.contains(&plugin) {
            self.plugins.push(plugin.clone());
        }
        self.hooks
            .entry(hook)
            .or_default()
            .push(Candidate::new(plugin, callback));
    }

    /// Freeze the registry.
    pub fn build(self) -> PluginRegistry {
        let registry = PluginRegistry {
            hooks: self.hooks,
            plugins: self.plugins,
        };
        tracing::info!(
            plugins = registry.plugins.len(),
            callbacks = registry.len(),
            "plugin registry ready"
        );
        registry
    }
}
