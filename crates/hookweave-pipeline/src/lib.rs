//! # hookweave-pipeline
//!
//! Ordered middleware pipelines. Provides:
//!
//! - [`Middleware`] trait with closure adapters
//! - [`MiddlewareInput`] normalization into flat middleware sequences
//! - [`Pipeline`] with sequential, bail, waterfall, and loop dispatch
//! - [`Chain`] for middlewares that wrap the rest of the chain via [`Next`]
//! - [`DispatchLimits`] for optional loop caps, deadlines, and cancellation

pub mod chain;
pub mod input;
pub mod limits;
pub mod middleware;
pub mod pipeline;

pub use chain::{Chain, ChainInput, Next, NextMiddleware, SharedNextMiddleware, from_next_fn};
pub use input::{
    AnyInput, MiddlewareInput, PipelineLike, is_middleware, is_middleware_sequence, is_pipeline_like,
    normalize,
};
pub use limits::DispatchLimits;
pub use middleware::{Middleware, PipelineInput, SharedMiddleware, from_async, from_fn};
pub use pipeline::{Completion, Pipeline, Strategy};
