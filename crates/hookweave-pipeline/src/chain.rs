//! Wrapping middleware chains driven by an explicit continuation.
//!
//! Unlike [`Pipeline`](crate::pipeline::Pipeline), a [`Chain`] does not step
//! through its middlewares on its own. Each middleware receives a [`Next`]
//! and decides whether and how often to resume the rest of the chain.
//! Not calling `next` short-circuits everything downstream.
//!
//! ```ignore
//! let timing = from_next_fn(|input: Request, next: Next<'_, Request, Response>| {
//!     Box::pin(async move {
//!         let start = Instant::now();
//!         let response = next.run(None).await?;
//!         debug!(elapsed = ?start.elapsed(), "Downstream finished");
//!         Ok(response)
//!     })
//! });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use hookweave_core::HookResult;

use crate::input::{MiddlewareInput, PipelineLike, normalize};
use crate::limits::{Budget, DispatchLimits};

/// A middleware that wraps the remainder of a [`Chain`].
pub trait NextMiddleware<I, O>: Send + Sync {
    /// Handles `input`, optionally resuming downstream through `next`.
    fn handle<'a>(
        &'a self,
        input: I,
        next: Next<'a, I, O>,
    ) -> BoxFuture<'a, HookResult<Option<O>>>;
}

/// A type-erased wrapping middleware.
pub type SharedNextMiddleware<I, O> = Arc<dyn NextMiddleware<I, O>>;

/// Registration input accepted by [`Chain::use_`].
pub type ChainInput<I, O> = MiddlewareInput<dyn NextMiddleware<I, O>>;

type Terminal<I, O> = Arc<dyn Fn(I) -> BoxFuture<'static, Option<O>> + Send + Sync>;

/// Continuation handed to each [`NextMiddleware`].
///
/// `Next` may be run any number of times. Each run dispatches the rest of
/// the chain from scratch.
pub struct Next<'a, I, O> {
    chain: &'a Chain<I, O>,
    index: usize,
    input: I,
    budget: Budget,
}

impl<'a, I, O> Next<'a, I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    /// Resumes the chain after the current middleware.
    ///
    /// Downstream receives `input` if given, otherwise the value the current
    /// middleware was called with.
    pub fn run(&self, input: Option<I>) -> BoxFuture<'a, HookResult<Option<O>>> {
        let input = input.unwrap_or_else(|| self.input.clone());
        self.chain.step(self.index, input, self.budget.clone())
    }

    /// Position of the middleware this continuation resumes.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The value the current middleware was called with.
    pub fn input(&self) -> &I {
        &self.input
    }
}

impl<I: Clone, O> Clone for Next<'_, I, O> {
    fn clone(&self) -> Self {
        Self {
            chain: self.chain,
            index: self.index,
            input: self.input.clone(),
            budget: self.budget.clone(),
        }
    }
}

/// An ordered list of wrapping middlewares with an optional terminal handler.
pub struct Chain<I, O> {
    middlewares: Vec<SharedNextMiddleware<I, O>>,
    terminal: Option<Terminal<I, O>>,
    limits: DispatchLimits,
}

impl<I, O> Chain<I, O> {
    /// Creates an empty chain without a terminal handler.
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
            terminal: None,
            limits: DispatchLimits::default(),
        }
    }

    /// Sets the handler that runs when `next` is called past the last middleware.
    ///
    /// Without one, running off the end yields `None`.
    pub fn with_terminal<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<O>> + Send + 'static,
    {
        self.terminal = Some(Arc::new(move |input: I| -> BoxFuture<'static, Option<O>> {
            Box::pin(handler(input))
        }));
        self
    }

    /// Replaces the dispatch limits. Loop caps do not apply to chains.
    pub fn with_limits(mut self, limits: DispatchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the middlewares in dispatch order.
    pub fn middlewares(&self) -> &[SharedNextMiddleware<I, O>] {
        &self.middlewares
    }

    /// Number of middlewares.
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Returns whether no middleware is registered.
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Normalizes `input` and appends it.
    pub fn use_(&mut self, input: impl Into<ChainInput<I, O>>) -> &mut Self {
        let input = input.into();
        self.middlewares.extend(normalize(&input));
        self
    }

    /// Removes every middleware. The terminal handler is kept.
    pub fn reset(&mut self) {
        self.middlewares.clear();
    }
}

impl<I, O> Chain<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    /// Runs the chain from the first middleware.
    pub async fn run(&self, input: I) -> HookResult<Option<O>> {
        self.dispatch(0, input).await
    }

    /// Runs the chain from `index`.
    pub async fn dispatch(&self, index: usize, input: I) -> HookResult<Option<O>> {
        self.step(index, input, self.limits.begin()).await
    }

    fn step(
        &self,
        index: usize,
        input: I,
        budget: Budget,
    ) -> BoxFuture<'_, HookResult<Option<O>>> {
        Box::pin(async move {
            budget.check()?;
            match self.middlewares.get(index) {
                Some(middleware) => {
                    let next = Next {
                        chain: self,
                        index: index + 1,
                        input: input.clone(),
                        budget,
                    };
                    middleware.handle(input, next).await
                }
                None => {
                    debug!(index, "Chain reached its end");
                    match &self.terminal {
                        Some(terminal) => Ok(terminal(input).await),
                        None => Ok(None),
                    }
                }
            }
        })
    }
}

impl<I, O> Default for Chain<I, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, O> Clone for Chain<I, O> {
    fn clone(&self) -> Self {
        Self {
            middlewares: self.middlewares.clone(),
            terminal: self.terminal.clone(),
            limits: self.limits.clone(),
        }
    }
}

impl<I, O> fmt::Debug for Chain<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("middlewares", &self.middlewares.len())
            .field("terminal", &self.terminal.is_some())
            .field("limits", &self.limits)
            .finish()
    }
}

impl<I, O> PipelineLike<dyn NextMiddleware<I, O>> for Chain<I, O>
where
    I: 'static,
    O: 'static,
{
    fn middlewares(&self) -> Vec<SharedNextMiddleware<I, O>> {
        self.middlewares.clone()
    }
}

/// Middleware backed by a closure that returns a boxed future.
struct NextFn<F> {
    func: F,
}

impl<I, O, F> NextMiddleware<I, O> for NextFn<F>
where
    F: for<'a> Fn(I, Next<'a, I, O>) -> BoxFuture<'a, HookResult<Option<O>>> + Send + Sync,
{
    fn handle<'a>(
        &'a self,
        input: I,
        next: Next<'a, I, O>,
    ) -> BoxFuture<'a, HookResult<Option<O>>> {
        (self.func)(input, next)
    }
}

/// Wraps a closure as a shared wrapping middleware.
pub fn from_next_fn<I, O, F>(func: F) -> SharedNextMiddleware<I, O>
where
    I: 'static,
    O: 'static,
    F: for<'a> Fn(I, Next<'a, I, O>) -> BoxFuture<'a, HookResult<Option<O>>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(NextFn { func })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use hookweave_core::ErrorKind;
    use tokio_util::sync::CancellationToken;

    fn wrap<F>(func: F) -> SharedNextMiddleware<i32, i32>
    where
        F: for<'a> Fn(i32, Next<'a, i32, i32>) -> BoxFuture<'a, HookResult<Option<i32>>>
            + Send
            + Sync
            + 'static,
    {
        from_next_fn(func)
    }

    fn doubling_terminal() -> Chain<i32, i32> {
        Chain::new().with_terminal(|input: i32| async move { Some(input * 2) })
    }

    #[tokio::test]
    async fn test_override_flows_downstream() {
        let mut chain = doubling_terminal();
        chain.use_(wrap(|input, next| {
            Box::pin(async move { next.run(Some(input + 1)).await })
        }));

        assert_eq!(chain.run(4).await.expect("run"), Some(10));
    }

    #[tokio::test]
    async fn test_next_without_override_uses_current_input() {
        let mut chain = doubling_terminal();
        chain
            .use_(wrap(|input, next| Box::pin(async move { next.run(Some(input * 10)).await })))
            .use_(wrap(|_, next| Box::pin(async move { next.run(None).await })));

        assert_eq!(chain.run(1).await.expect("run"), Some(20));
    }

    #[tokio::test]
    async fn test_next_reports_position_and_input() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut chain = doubling_terminal();
        for _ in 0..2 {
            let seen = Arc::clone(&seen);
            chain.use_(wrap(move |input, next| {
                seen.lock().expect("lock").push((next.index(), *next.input()));
                Box::pin(async move { next.run(Some(input + 1)).await })
            }));
        }

        assert_eq!(chain.run(5).await.expect("run"), Some(14));
        assert_eq!(*seen.lock().expect("lock"), vec![(1, 5), (2, 6)]);
    }

    #[tokio::test]
    async fn test_skipping_next_short_circuits() {
        let downstream = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&downstream);

        let mut chain = doubling_terminal();
        chain
            .use_(wrap(|_, _next| Box::pin(async { Ok(Some(-1)) })))
            .use_(wrap(move |input, next| {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move { next.run(Some(input)).await })
            }));

        assert_eq!(chain.run(3).await.expect("run"), Some(-1));
        assert_eq!(downstream.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_middleware_wraps_downstream() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let outer_log = Arc::clone(&log);
        let inner_log = Arc::clone(&log);
        let mut chain = Chain::new();
        chain
            .use_(wrap(move |input, next| {
                let log = Arc::clone(&outer_log);
                Box::pin(async move {
                    log.lock().expect("lock").push("outer:before");
                    let result = next.run(Some(input)).await;
                    log.lock().expect("lock").push("outer:after");
                    result
                })
            }))
            .use_(wrap(move |input, _next| {
                inner_log.lock().expect("lock").push("inner");
                Box::pin(async move { Ok(Some(input)) })
            }));

        assert_eq!(chain.run(5).await.expect("run"), Some(5));
        assert_eq!(
            *log.lock().expect("lock"),
            vec!["outer:before", "inner", "outer:after"]
        );
    }

    #[tokio::test]
    async fn test_next_can_run_more_than_once() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let mut chain = Chain::new();
        chain
            .use_(wrap(|input, next| {
                Box::pin(async move {
                    for _ in 0..3 {
                        if let Some(value) = next.run(Some(input)).await? {
                            return Ok(Some(value));
                        }
                    }
                    Ok(None)
                })
            }))
            .use_(wrap(move |input, _next| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move { Ok((n == 2).then_some(input)) })
            }));

        assert_eq!(chain.run(8).await.expect("run"), Some(8));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_end_without_terminal_is_none() {
        let mut chain: Chain<i32, i32> = Chain::new();
        chain.use_(wrap(|_, next| Box::pin(async move { next.run(None).await })));

        assert_eq!(chain.run(1).await.expect("run"), None);
        assert_eq!(chain.dispatch(1, 1).await.expect("dispatch"), None);
    }

    #[tokio::test]
    async fn test_cancellation_stops_downstream() {
        let token = CancellationToken::new();
        let trigger = token.clone();

        let mut chain = doubling_terminal()
            .with_limits(DispatchLimits::unbounded().with_cancellation(token));
        chain.use_(wrap(move |input, next| {
            trigger.cancel();
            Box::pin(async move { next.run(Some(input)).await })
        }));

        let err = chain.run(1).await.expect_err("cancelled");
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_nested_chain_is_pipeline_like() {
        let mut inner: Chain<i32, i32> = Chain::new();
        inner.use_(wrap(|input, next| Box::pin(async move { next.run(Some(input + 1)).await })));

        let mut outer = doubling_terminal();
        outer
            .use_(ChainInput::<i32, i32>::pipeline(inner.clone()))
            .use_(wrap(|input, next| Box::pin(async move { next.run(Some(input + 1)).await })));

        assert_eq!(outer.len(), 2);
        assert_eq!(outer.run(0).await.expect("run"), Some(4));
        outer.reset();
        assert!(outer.is_empty());
        assert_eq!(outer.run(3).await.expect("run"), Some(6));
    }
}
