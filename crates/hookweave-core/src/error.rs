//! Unified error types for hookweave.
//!
//! Every failure surfaced by the engine carries a machine-distinguishable
//! [`ErrorKind`]. Resolution failures keep enough structure to name the
//! offending plugins.

use std::fmt;

use thiserror::Error;

/// Top-level error kind categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A registration input matched none of the accepted shapes.
    TypeMismatch,
    /// A plugin was registered under a name that is already taken.
    DuplicateName,
    /// A plugin requires another plugin that is not registered.
    MissingDependency,
    /// Two mutually exclusive plugins are registered together.
    RivalConflict,
    /// The ordering constraints between plugins form a cycle.
    CyclicDependency,
    /// A loop pipeline restarted more often than its configured cap.
    LoopLimitExceeded,
    /// Dispatch ran past its deadline.
    DeadlineExceeded,
    /// Dispatch was cancelled by the caller.
    Cancelled,
    /// A plugin contributed to a hook that has no pipeline.
    UnknownHook,
    /// Configuration could not be loaded.
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch => write!(f, "TYPE_MISMATCH"),
            Self::DuplicateName => write!(f, "DUPLICATE_NAME"),
            Self::MissingDependency => write!(f, "MISSING_DEPENDENCY"),
            Self::RivalConflict => write!(f, "RIVAL_CONFLICT"),
            Self::CyclicDependency => write!(f, "CYCLIC_DEPENDENCY"),
            Self::LoopLimitExceeded => write!(f, "LOOP_LIMIT_EXCEEDED"),
            Self::DeadlineExceeded => write!(f, "DEADLINE_EXCEEDED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::UnknownHook => write!(f, "UNKNOWN_HOOK"),
            Self::Configuration => write!(f, "CONFIGURATION"),
        }
    }
}

/// Failure to compute a plugin activation order.
///
/// Resolution never mutates the registry, so any of these can be fixed by
/// adjusting the registered set and resolving again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// `plugin` lists `missing` in its `required` set, but it is not registered.
    #[error("plugin '{plugin}' requires '{missing}', which is not registered")]
    MissingDependency {
        /// Plugin declaring the requirement.
        plugin: String,
        /// Name that could not be found.
        missing: String,
    },
    /// `plugin` lists `rival` in its `rivals` set, and both are registered.
    #[error("plugin '{plugin}' cannot be registered together with its rival '{rival}'")]
    RivalConflict {
        /// Plugin declaring the rivalry.
        plugin: String,
        /// Rival that is also registered.
        rival: String,
    },
    /// Ordering constraints form at least one cycle.
    #[error("cyclic ordering between plugins: {}", .members.join(", "))]
    CyclicDependency {
        /// Plugins that lie on an ordering cycle, in registration order.
        ///
        /// Plugins only ordered after a cycle are not listed.
        members: Vec<String>,
    },
}

impl ResolutionError {
    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingDependency { .. } => ErrorKind::MissingDependency,
            Self::RivalConflict { .. } => ErrorKind::RivalConflict,
            Self::CyclicDependency { .. } => ErrorKind::CyclicDependency,
        }
    }
}

/// The unified error used throughout hookweave.
#[derive(Debug, Error)]
pub enum HookError {
    /// A registration input matched none of the accepted shapes.
    #[error(
        "expected a middleware, a middleware sequence, or a pipeline-like value, got `{found}`"
    )]
    TypeMismatch {
        /// Type name of the rejected value.
        found: String,
    },

    /// A plugin with this name is already registered.
    #[error("plugin '{0}' is already registered")]
    DuplicateName(String),

    /// Plugin resolution failed.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// A loop pipeline restarted more times than allowed.
    #[error("loop pipeline did not settle after {passes} passes")]
    LoopLimitExceeded {
        /// Number of passes that were started.
        passes: u32,
    },

    /// The dispatch deadline elapsed between two steps.
    #[error("dispatch deadline exceeded")]
    DeadlineExceeded,

    /// The dispatch was cancelled between two steps.
    #[error("dispatch cancelled")]
    Cancelled,

    /// A hook was called or contributed to, but no pipeline is defined for it.
    #[error(
        "no pipeline is defined for hook '{hook}'{}",
        .contributor.as_deref().map(|p| format!(" (contributed by plugin '{p}')")).unwrap_or_default()
    )]
    UnknownHook {
        /// Hook name that has no pipeline.
        hook: String,
        /// Plugin that contributed to the hook, if any.
        contributor: Option<String>,
    },

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl HookError {
    /// Create an unknown-hook error.
    pub fn unknown_hook(hook: impl Into<String>, contributor: Option<&str>) -> Self {
        Self::UnknownHook {
            hook: hook.into(),
            contributor: contributor.map(str::to_string),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::DuplicateName(_) => ErrorKind::DuplicateName,
            Self::Resolution(e) => e.kind(),
            Self::LoopLimitExceeded { .. } => ErrorKind::LoopLimitExceeded,
            Self::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::UnknownHook { .. } => ErrorKind::UnknownHook,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }
}

impl From<config::ConfigError> for HookError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display_codes() {
        assert_eq!(ErrorKind::TypeMismatch.to_string(), "TYPE_MISMATCH");
        assert_eq!(ErrorKind::CyclicDependency.to_string(), "CYCLIC_DEPENDENCY");
        assert_eq!(ErrorKind::LoopLimitExceeded.to_string(), "LOOP_LIMIT_EXCEEDED");
    }

    #[test]
    fn test_resolution_kind_passes_through() {
        let err: HookError = ResolutionError::RivalConflict {
            plugin: "c".into(),
            rival: "a".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::RivalConflict);
        assert_eq!(
            err.to_string(),
            "plugin 'c' cannot be registered together with its rival 'a'"
        );
    }

    #[test]
    fn test_unknown_hook_names_contributor() {
        let err = HookError::unknown_hook("on_save", Some("audit"));
        assert_eq!(
            err.to_string(),
            "no pipeline is defined for hook 'on_save' (contributed by plugin 'audit')"
        );
        let err = HookError::unknown_hook("on_save", None);
        assert_eq!(err.to_string(), "no pipeline is defined for hook 'on_save'");
    }

    #[test]
    fn test_cycle_lists_members() {
        let err = ResolutionError::CyclicDependency {
            members: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "cyclic ordering between plugins: a, b");
    }
}
