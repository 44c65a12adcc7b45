//! Convenience result type alias for hookweave.

use crate::error::HookError;

/// A specialized `Result` type for hookweave operations.
pub type HookResult<T> = Result<T, HookError>;
