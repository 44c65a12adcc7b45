//! Middleware registration inputs and their normalization.
//!
//! Registration accepts three shapes: a single middleware, an ordered
//! sequence of further inputs, or a pipeline-like value exposing its own
//! middlewares. [`normalize`] flattens any of them into one ordered list,
//! depth-first and left to right.
//!
//! The input type is generic over the middleware kind `M` so the same
//! normalizer serves both [`Pipeline`](crate::pipeline::Pipeline)
//! (`M = dyn Middleware<T>`) and [`Chain`](crate::chain::Chain)
//! (`M = dyn NextMiddleware<I, O>`).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use hookweave_core::{HookError, HookResult};

/// Anything that owns an ordered list of middlewares.
pub trait PipelineLike<M: ?Sized>: Send + Sync {
    /// Returns the current middlewares in dispatch order.
    fn middlewares(&self) -> Vec<Arc<M>>;
}

/// One registration input.
pub enum MiddlewareInput<M: ?Sized> {
    /// A single middleware.
    Single(Arc<M>),
    /// An ordered sequence of inputs, possibly nested.
    Sequence(Vec<MiddlewareInput<M>>),
    /// A value exposing its own middlewares.
    PipelineLike(Arc<dyn PipelineLike<M>>),
}

impl<M: ?Sized> MiddlewareInput<M> {
    /// Wraps a pipeline-like value.
    pub fn pipeline(value: impl PipelineLike<M> + 'static) -> Self {
        Self::PipelineLike(Arc::new(value))
    }

    /// Returns an empty sequence.
    pub fn empty() -> Self {
        Self::Sequence(Vec::new())
    }

    /// Flattens this input into an ordered middleware list.
    pub fn normalize(&self) -> Vec<Arc<M>> {
        normalize(self)
    }
}

/// A type-erased registration value that still knows its concrete type.
///
/// Implemented for every `'static` type, so any value can be boxed as
/// `Box<dyn AnyInput>` at a dynamic registration boundary.
pub trait AnyInput: Any {
    /// Name of the concrete type.
    fn type_name(&self) -> &'static str;

    /// Converts into a plain `Box<dyn Any>` for downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<V: Any> AnyInput for V {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<V>()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl<M: ?Sized + 'static> MiddlewareInput<M> {
    /// Classifies a type-erased value at a dynamic registration boundary.
    ///
    /// Accepted shapes are `MiddlewareInput<M>`, `Arc<M>`, `Vec<Arc<M>>`,
    /// `Vec<MiddlewareInput<M>>`, `Arc<dyn PipelineLike<M>>`, and
    /// `Vec<Box<dyn AnyInput>>` whose elements are themselves accepted
    /// shapes. Anything else fails with [`HookError::TypeMismatch`] naming
    /// the rejected type and, for nested values, its position.
    pub fn from_any(value: Box<dyn AnyInput>) -> HookResult<Self> {
        Self::classify(value, "")
    }

    /// Classifies a value of a statically known type.
    pub fn try_from_value<V: Any>(value: V) -> HookResult<Self> {
        Self::from_any(Box::new(value))
    }

    /// Classifies `value` found at `path`, e.g. `[2][0]` inside nested sequences.
    pub(crate) fn classify(value: Box<dyn AnyInput>, path: &str) -> HookResult<Self> {
        let type_name = AnyInput::type_name(&*value);
        let value = AnyInput::into_any(value);

        let value = match value.downcast::<Self>() {
            Ok(input) => return Ok(*input),
            Err(value) => value,
        };
        let value = match value.downcast::<Arc<M>>() {
            Ok(middleware) => return Ok(Self::Single(*middleware)),
            Err(value) => value,
        };
        let value = match value.downcast::<Vec<Arc<M>>>() {
            Ok(middlewares) => return Ok((*middlewares).into()),
            Err(value) => value,
        };
        let value = match value.downcast::<Vec<Self>>() {
            Ok(inputs) => return Ok(Self::Sequence(*inputs)),
            Err(value) => value,
        };
        let value = match value.downcast::<Arc<dyn PipelineLike<M>>>() {
            Ok(pipeline) => return Ok(Self::PipelineLike(*pipeline)),
            Err(value) => value,
        };
        match value.downcast::<Vec<Box<dyn AnyInput>>>() {
            Ok(values) => values
                .into_iter()
                .enumerate()
                .map(|(i, value)| Self::classify(value, &format!("{path}[{i}]")))
                .collect::<HookResult<Vec<_>>>()
                .map(Self::Sequence),
            Err(_) if path.is_empty() => Err(HookError::TypeMismatch {
                found: type_name.to_string(),
            }),
            Err(_) => Err(HookError::TypeMismatch {
                found: format!("{type_name} (element {path})"),
            }),
        }
    }
}

impl<M: ?Sized> Clone for MiddlewareInput<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Single(m) => Self::Single(Arc::clone(m)),
            Self::Sequence(items) => Self::Sequence(items.clone()),
            Self::PipelineLike(p) => Self::PipelineLike(Arc::clone(p)),
        }
    }
}

impl<M: ?Sized> fmt::Debug for MiddlewareInput<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(_) => f.write_str("Single"),
            Self::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Self::PipelineLike(_) => f.write_str("PipelineLike"),
        }
    }
}

impl<M: ?Sized> From<Arc<M>> for MiddlewareInput<M> {
    fn from(middleware: Arc<M>) -> Self {
        Self::Single(middleware)
    }
}

impl<M: ?Sized> From<Vec<Arc<M>>> for MiddlewareInput<M> {
    fn from(middlewares: Vec<Arc<M>>) -> Self {
        Self::Sequence(middlewares.into_iter().map(Self::Single).collect())
    }
}

impl<M: ?Sized> From<Vec<MiddlewareInput<M>>> for MiddlewareInput<M> {
    fn from(inputs: Vec<MiddlewareInput<M>>) -> Self {
        Self::Sequence(inputs)
    }
}

/// Flattens `input` into an ordered middleware list.
pub fn normalize<M: ?Sized>(input: &MiddlewareInput<M>) -> Vec<Arc<M>> {
    match input {
        MiddlewareInput::Single(middleware) => vec![Arc::clone(middleware)],
        MiddlewareInput::Sequence(items) => items.iter().flat_map(normalize).collect(),
        MiddlewareInput::PipelineLike(pipeline) => pipeline.middlewares(),
    }
}

/// Returns whether `value` is a single middleware of kind `M`.
pub fn is_middleware<M: ?Sized + 'static>(value: &dyn Any) -> bool {
    value.is::<Arc<M>>()
        || matches!(
            value.downcast_ref::<MiddlewareInput<M>>(),
            Some(MiddlewareInput::Single(_))
        )
}

/// Returns whether `value` is an ordered sequence of middleware inputs.
pub fn is_middleware_sequence<M: ?Sized + 'static>(value: &dyn Any) -> bool {
    value.is::<Vec<Arc<M>>>()
        || value.is::<Vec<MiddlewareInput<M>>>()
        || value.is::<Vec<Box<dyn AnyInput>>>()
        || matches!(
            value.downcast_ref::<MiddlewareInput<M>>(),
            Some(MiddlewareInput::Sequence(_))
        )
}

/// Returns whether `value` exposes its own middlewares.
pub fn is_pipeline_like<M: ?Sized + 'static>(value: &dyn Any) -> bool {
    value.is::<Arc<dyn PipelineLike<M>>>()
        || matches!(
            value.downcast_ref::<MiddlewareInput<M>>(),
            Some(MiddlewareInput::PipelineLike(_))
        )
}
