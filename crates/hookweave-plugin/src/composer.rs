//! Hook composer: binds resolved plugin contributions to named pipelines.
//!
//! The composer is the caller-owned context object tying a
//! [`PluginRegistry`] to a set of named hook pipelines. Nothing here is
//! global: create one per independent run and drop or [`reset`] it between
//! runs.
//!
//! [`reset`]: HookComposer::reset

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use hookweave_core::{HookError, HookResult};
use hookweave_pipeline::{Completion, DispatchLimits, Pipeline, Strategy};

use crate::descriptor::PluginDescriptor;
use crate::registry::PluginRegistry;

/// Named hook pipelines fed by registered plugins.
pub struct HookComposer<T> {
    /// Registered plugins.
    registry: PluginRegistry<T>,
    /// Hook name → pipeline, in definition order.
    hooks: IndexMap<String, Pipeline<T>>,
    /// Limits given to every hook pipeline.
    limits: DispatchLimits,
}

impl<T> HookComposer<T> {
    /// Creates a composer with no hooks and no plugins.
    pub fn new() -> Self {
        Self {
            registry: PluginRegistry::new(),
            hooks: IndexMap::new(),
            limits: DispatchLimits::default(),
        }
    }

    /// Applies `limits` to every current and future hook pipeline.
    pub fn with_limits(mut self, limits: DispatchLimits) -> Self {
        for pipeline in self.hooks.values_mut() {
            pipeline.set_limits(limits.clone());
        }
        self.limits = limits;
        self
    }

    /// Defines a hook backed by an empty pipeline with `strategy`.
    ///
    /// Redefining an existing hook keeps the original pipeline.
    pub fn define_hook(&mut self, name: impl Into<String>, strategy: Strategy) -> &mut Pipeline<T> {
        let name = name.into();
        let limits = &self.limits;
        self.hooks.entry(name).or_insert_with_key(|name| {
            debug!(hook = %name, strategy = %strategy, "Hook defined");
            Pipeline::new(strategy).with_limits(limits.clone())
        })
    }

    /// Returns the pipeline behind `name`.
    pub fn hook(&self, name: &str) -> Option<&Pipeline<T>> {
        self.hooks.get(name)
    }

    /// Returns all hook names in definition order.
    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.keys().map(String::as_str).collect()
    }

    /// Registers a plugin. Its contributions are bound on the next [`apply`](Self::apply).
    pub fn add_plugin(&mut self, descriptor: PluginDescriptor<T>) -> HookResult<()> {
        self.registry.add(descriptor)
    }

    /// Unregisters a plugin. Absent names are ignored.
    pub fn remove_plugin(&mut self, name: &str) -> Option<PluginDescriptor<T>> {
        self.registry.remove(name)
    }

    /// Returns the plugin registry.
    pub fn registry(&self) -> &PluginRegistry<T> {
        &self.registry
    }

    /// Computes the plugin activation order.
    pub fn resolve(&self) -> HookResult<Vec<String>> {
        self.registry.resolve()
    }

    /// Rebuilds every hook pipeline from the registered plugins.
    ///
    /// Each pipeline is cleared, then every plugin's contribution is
    /// appended in activation order. If resolution fails, or a plugin
    /// contributes to an undefined hook, no pipeline is touched.
    pub fn apply(&mut self) -> HookResult<Vec<String>> {
        let order = self.registry.resolve()?;

        let mut bindings = Vec::new();
        for name in &order {
            let Some(descriptor) = self.registry.get(name) else {
                continue;
            };
            let mut hooks: Vec<&String> = descriptor.hooks.keys().collect();
            hooks.sort_unstable();
            for hook in hooks {
                if !self.hooks.contains_key(hook) {
                    warn!(plugin = %name, hook = %hook, "Plugin contributes to an undefined hook");
                    return Err(HookError::unknown_hook(hook.as_str(), Some(name.as_str())));
                }
                bindings.push((hook.clone(), descriptor.hooks[hook].clone()));
            }
        }

        for pipeline in self.hooks.values_mut() {
            pipeline.reset();
        }
        for (hook, input) in bindings {
            if let Some(pipeline) = self.hooks.get_mut(&hook) {
                pipeline.use_(input);
            }
        }

        info!(
            plugins = order.len(),
            hooks = self.hooks.len(),
            "Plugin contributions bound to hooks"
        );
        Ok(order)
    }

    /// Unregisters every plugin and empties every hook pipeline.
    ///
    /// Hook definitions survive.
    pub fn reset(&mut self) {
        self.registry.reset();
        for pipeline in self.hooks.values_mut() {
            pipeline.reset();
        }
    }
}

impl<T: Clone + Send + Sync + 'static> HookComposer<T> {
    /// Runs the pipeline behind hook `name`.
    pub async fn call(&self, name: &str, input: T) -> HookResult<Completion<T>> {
        let pipeline = self
            .hooks
            .get(name)
            .ok_or_else(|| HookError::unknown_hook(name, None))?;
        pipeline.run(input).await
    }

    /// Runs the pipeline behind hook `name` with an argument tuple.
    pub async fn call_args(&self, name: &str, args: Vec<T>) -> HookResult<Completion<T>> {
        let pipeline = self
            .hooks
            .get(name)
            .ok_or_else(|| HookError::unknown_hook(name, None))?;
        pipeline.run_args(args).await
    }
}

impl<T> Default for HookComposer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for HookComposer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookComposer")
            .field("registry", &self.registry)
            .field("hooks", &self.hooks)
            .finish()
    }
}
