//! Declarative plugin manifests.

use serde::{Deserialize, Serialize};

/// A plugin's ordering constraints as written in a config file.
///
/// Manifests carry no middlewares. They let a deployment check that its
/// plugin set resolves before any code is wired up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginManifest {
    /// Unique plugin name.
    pub name: String,
    /// Plugins that must run after this one.
    pub pre: Vec<String>,
    /// Plugins that must run before this one.
    pub post: Vec<String>,
    /// Plugins that must not be registered alongside this one.
    pub rivals: Vec<String>,
    /// Plugins that must also be registered.
    pub required: Vec<String>,
    /// Hooks this plugin contributes to.
    pub hooks: Vec<String>,
}
