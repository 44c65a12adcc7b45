//! Plugin registry: stores plugin descriptors in registration order.
//!
//! The registry is a plain owned value. Registration is expected to happen
//! during setup, before any pipeline built from it runs; callers that need
//! to mutate it while dispatching must provide their own synchronization.

use indexmap::IndexMap;
use tracing::{debug, info};

use hookweave_core::{HookError, HookResult};

use crate::descriptor::{PluginDescriptor, PluginMeta};
use crate::resolver;

/// Registry of plugin descriptors keyed by unique name.
pub struct PluginRegistry<T> {
    /// Plugin name → descriptor, in registration order.
    plugins: IndexMap<String, PluginDescriptor<T>>,
}

impl<T> PluginRegistry<T> {
    /// Creates a new empty plugin registry.
    pub fn new() -> Self {
        Self {
            plugins: IndexMap::new(),
        }
    }

    /// Registers a plugin.
    ///
    /// Fails with [`HookError::DuplicateName`] if the name is taken; the
    /// existing entry is left untouched.
    pub fn add(&mut self, descriptor: PluginDescriptor<T>) -> HookResult<()> {
        let name = descriptor.name().to_string();
        if self.plugins.contains_key(&name) {
            return Err(HookError::DuplicateName(name));
        }

        info!(
            plugin = %name,
            hooks = descriptor.hooks.len(),
            pre = descriptor.meta.pre.len(),
            post = descriptor.meta.post.len(),
            "Registering plugin"
        );

        self.plugins.insert(name, descriptor);
        Ok(())
    }

    /// Unregisters a plugin by name.
    ///
    /// Removing an absent name is a no-op.
    pub fn remove(&mut self, name: &str) -> Option<PluginDescriptor<T>> {
        let removed = self.plugins.shift_remove(name);
        match &removed {
            Some(_) => info!(plugin = %name, "Plugin unregistered"),
            None => debug!(plugin = %name, "Plugin not registered, nothing to remove"),
        }
        removed
    }

    /// Gets a plugin by name.
    pub fn get(&self, name: &str) -> Option<&PluginDescriptor<T>> {
        self.plugins.get(name)
    }

    /// Checks whether a plugin is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Lists plugin metadata in registration order.
    pub fn list(&self) -> Vec<&PluginMeta> {
        self.plugins.values().map(|d| &d.meta).collect()
    }

    /// Returns plugin names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    /// Iterates over descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &PluginDescriptor<T>> {
        self.plugins.values()
    }

    /// Returns plugin count.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns whether no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Removes every plugin.
    pub fn reset(&mut self) {
        let count = self.plugins.len();
        self.plugins.clear();
        info!(removed = count, "Plugin registry reset");
    }

    /// Computes the activation order of the registered plugins.
    ///
    /// Never mutates the registry.
    pub fn resolve(&self) -> HookResult<Vec<String>> {
        Ok(resolver::resolve(self.plugins.values().map(|d| &d.meta))?)
    }
}

impl<T> Default for PluginRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for PluginRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}
