//! Plugin metadata and hook contributions.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use hookweave_core::config::plugin::PluginManifest;
use hookweave_pipeline::PipelineInput;

/// A plugin's identity and ordering constraints.
///
/// Ordering follows the resolver's edge rules: every name in `pre` is
/// activated after this plugin, every name in `post` before it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginMeta {
    /// Unique plugin name.
    pub name: String,
    /// Plugins this one is activated ahead of.
    pub pre: BTreeSet<String>,
    /// Plugins activated ahead of this one.
    pub post: BTreeSet<String>,
    /// Plugins that must not be registered alongside this one.
    pub rivals: BTreeSet<String>,
    /// Plugins that must also be registered.
    pub required: BTreeSet<String>,
}

impl PluginMeta {
    /// Creates metadata with no constraints.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Activates this plugin ahead of `names`.
    pub fn before<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.pre.extend(names.into_iter().map(Into::into));
        self
    }

    /// Activates this plugin after `names`.
    pub fn after<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.post.extend(names.into_iter().map(Into::into));
        self
    }

    /// Requires `names` to be registered too.
    pub fn requires<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    /// Forbids `names` from being registered alongside this plugin.
    pub fn rivals<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.rivals.extend(names.into_iter().map(Into::into));
        self
    }
}

impl From<PluginManifest> for PluginMeta {
    fn from(manifest: PluginManifest) -> Self {
        Self {
            name: manifest.name,
            pre: manifest.pre.into_iter().collect(),
            post: manifest.post.into_iter().collect(),
            rivals: manifest.rivals.into_iter().collect(),
            required: manifest.required.into_iter().collect(),
        }
    }
}

/// A plugin as stored in the registry: metadata plus hook contributions.
///
/// Contributions are kept as registered. They are normalized only when
/// the composer binds them to a pipeline.
pub struct PluginDescriptor<T> {
    /// Identity and ordering constraints.
    pub meta: PluginMeta,
    /// Hook name → contributed middlewares.
    pub hooks: HashMap<String, PipelineInput<T>>,
}

impl<T> PluginDescriptor<T> {
    /// Creates a descriptor with no contributions.
    pub fn new(meta: PluginMeta) -> Self {
        Self {
            meta,
            hooks: HashMap::new(),
        }
    }

    /// Creates an unconstrained descriptor named `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(PluginMeta::new(name))
    }

    /// Adds a contribution to `hook`, replacing any earlier one.
    pub fn with_hook(mut self, hook: impl Into<String>, input: impl Into<PipelineInput<T>>) -> Self {
        self.hooks.insert(hook.into(), input.into());
        self
    }

    /// Returns the plugin name.
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Returns the contribution to `hook`, if any.
    pub fn hook(&self, hook: &str) -> Option<&PipelineInput<T>> {
        self.hooks.get(hook)
    }
}

impl<T> Clone for PluginDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            meta: self.meta.clone(),
            hooks: self.hooks.clone(),
        }
    }
}

impl<T> fmt::Debug for PluginDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut hooks: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
        hooks.sort_unstable();
        f.debug_struct("PluginDescriptor")
            .field("meta", &self.meta)
            .field("hooks", &hooks)
            .finish()
    }
}
