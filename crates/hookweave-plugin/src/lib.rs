//! # hookweave-plugin
//!
//! Plugin layer for hookweave. Provides:
//!
//! - Plugin descriptors with `pre`/`post`/`required`/`rivals` constraints
//! - An insertion-ordered plugin registry
//! - A deterministic dependency resolver producing the activation order
//! - A hook composer binding resolved plugin contributions to named pipelines

pub mod composer;
pub mod descriptor;
pub mod registry;
pub mod resolver;

pub use composer::HookComposer;
pub use descriptor::{PluginDescriptor, PluginMeta};
pub use registry::PluginRegistry;
pub use resolver::resolve;
