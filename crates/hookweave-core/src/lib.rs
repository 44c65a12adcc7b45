//! # hookweave-core
//!
//! Core crate for hookweave. Contains the unified error system,
//! configuration schemas, and the [`Context`] value accessor shared by
//! the pipeline engine and the plugin layer.
//!
//! This crate has **no** internal dependencies on other hookweave crates.

pub mod config;
pub mod context;
pub mod error;
pub mod result;

pub use context::Context;
pub use error::{ErrorKind, HookError, ResolutionError};
pub use result::HookResult;
