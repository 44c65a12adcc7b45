//! Core middleware trait and closure adapters.
//!
//! A middleware receives the current argument tuple and either answers with
//! a value (`Some`) or stays silent (`None`). What an answer means depends on
//! the pipeline's [`Strategy`](crate::pipeline::Strategy).

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::input::MiddlewareInput;

/// A single unit of work composed into a [`Pipeline`](crate::pipeline::Pipeline).
///
/// Middlewares have no name or ordering key. Two registrations are the same
/// middleware only if they share the same allocation (`Arc::ptr_eq`).
#[async_trait]
pub trait Middleware<T>: Send + Sync {
    /// Handles one dispatch step.
    ///
    /// Returning `None` is the "no result" answer.
    async fn call(&self, args: &[T]) -> Option<T>;
}

/// A type-erased middleware that can be stored in a pipeline.
pub type SharedMiddleware<T> = Arc<dyn Middleware<T>>;

/// Registration input accepted by [`Pipeline::use_`](crate::pipeline::Pipeline::use_).
pub type PipelineInput<T> = MiddlewareInput<dyn Middleware<T>>;

/// Middleware backed by a synchronous closure.
struct FnMiddleware<F> {
    func: F,
}

#[async_trait]
impl<T, F> Middleware<T> for FnMiddleware<F>
where
    T: Send + Sync,
    F: Fn(&[T]) -> Option<T> + Send + Sync,
{
    async fn call(&self, args: &[T]) -> Option<T> {
        (self.func)(args)
    }
}

/// Middleware backed by a closure returning a future.
struct AsyncFnMiddleware<F> {
    func: F,
}

#[async_trait]
impl<T, F, Fut> Middleware<T> for AsyncFnMiddleware<F>
where
    T: Clone + Send + Sync,
    F: Fn(Vec<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Option<T>> + Send,
{
    async fn call(&self, args: &[T]) -> Option<T> {
        (self.func)(args.to_vec()).await
    }
}

/// Wraps a synchronous closure as a shared middleware.
///
/// ```ignore
/// let double = from_fn(|args: &[i64]| Some(args[0] * 2));
/// ```
pub fn from_fn<T, F>(func: F) -> SharedMiddleware<T>
where
    T: Send + Sync + 'static,
    F: Fn(&[T]) -> Option<T> + Send + Sync + 'static,
{
    Arc::new(FnMiddleware { func })
}

/// Wraps an async closure as a shared middleware.
///
/// The closure receives an owned copy of the argument tuple so the returned
/// future does not borrow from the dispatcher.
pub fn from_async<T, F, Fut>(func: F) -> SharedMiddleware<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(Vec<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<T>> + Send + 'static,
{
    Arc::new(AsyncFnMiddleware { func })
}
