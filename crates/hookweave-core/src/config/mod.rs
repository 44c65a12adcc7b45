//! Engine configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! an optional TOML file merged with `HOOKWEAVE__*` environment variables.
//! Every section has defaults, so an empty source yields a usable config.

pub mod dispatch;
pub mod logging;
pub mod plugin;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use self::dispatch::DispatchConfig;
use self::logging::LoggingConfig;
use self::plugin::PluginManifest;

use crate::error::HookError;

/// Root engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Dispatch safety limits.
    pub dispatch: DispatchConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Declarative plugin set.
    pub plugins: Vec<PluginManifest>,
}

impl EngineConfig {
    /// Load configuration from `path` (if it exists) and the environment.
    ///
    /// Environment variables use the `HOOKWEAVE` prefix and `__` as the
    /// section separator, e.g. `HOOKWEAVE__DISPATCH__MAX_LOOP_PASSES=64`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HookError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading engine configuration");

        let config = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("HOOKWEAVE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
