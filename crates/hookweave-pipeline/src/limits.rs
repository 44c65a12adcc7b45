//! Optional safety limits checked between dispatch steps.
//!
//! With the default (unbounded) limits a loop pipeline whose middlewares
//! keep answering never terminates. Production callers should set at least
//! one of the limits below.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use hookweave_core::config::dispatch::DispatchConfig;
use hookweave_core::{HookError, HookResult};

/// Limits applied to every run of a pipeline or chain.
#[derive(Debug, Clone, Default)]
pub struct DispatchLimits {
    /// Maximum number of passes a loop pipeline may start.
    ///
    /// The first pass always runs, so a cap of `0` behaves like `1`.
    pub max_loop_passes: Option<u32>,
    /// Wall-clock budget for one run.
    pub deadline: Option<Duration>,
    /// Token checked before every step.
    pub cancel: Option<CancellationToken>,
}

impl DispatchLimits {
    /// No limits at all.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Builds limits from the engine configuration.
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            max_loop_passes: config.max_loop_passes,
            deadline: config.deadline(),
            cancel: None,
        }
    }

    /// Caps the number of loop passes. `0` is treated as `1`.
    pub fn with_max_loop_passes(mut self, passes: u32) -> Self {
        self.max_loop_passes = Some(passes);
        self
    }

    /// Sets a per-run deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attaches a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Starts the budget for one run.
    pub(crate) fn begin(&self) -> Budget {
        Budget {
            expires_at: self.deadline.map(|d| Instant::now() + d),
            cancel: self.cancel.clone(),
            max_passes: self.max_loop_passes,
            passes: 1,
        }
    }
}

/// Per-run bookkeeping derived from [`DispatchLimits`].
#[derive(Debug, Clone)]
pub(crate) struct Budget {
    expires_at: Option<Instant>,
    cancel: Option<CancellationToken>,
    max_passes: Option<u32>,
    passes: u32,
}

impl Budget {
    /// Fails if the run was cancelled or its deadline has passed.
    pub(crate) fn check(&self) -> HookResult<()> {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Err(HookError::Cancelled);
        }
        if self.expires_at.is_some_and(|at| Instant::now() >= at) {
            return Err(HookError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Records the start of another loop pass.
    pub(crate) fn restart(&mut self) -> HookResult<()> {
        if let Some(max) = self.max_passes {
            if self.passes >= max {
                warn!(passes = self.passes, "Loop pipeline hit its pass limit");
                return Err(HookError::LoopLimitExceeded {
                    passes: self.passes,
                });
            }
        }
        self.passes += 1;
        Ok(())
    }

    /// Number of passes started so far.
    pub(crate) fn passes(&self) -> u32 {
        self.passes
    }
}
