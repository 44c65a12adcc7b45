//! Ordered middleware pipelines with pluggable dispatch strategies.
//!
//! A [`Pipeline`] owns one ordered middleware list and a [`Strategy`]
//! chosen at construction. Registration (`use_`, `reset`) needs `&mut self`;
//! runs only need `&self`, so a pipeline shared behind an `Arc` can serve
//! concurrent runs while its middleware list stays fixed.
//!
//! | Strategy | A `Some` answer | End of chain |
//! |---|---|---|
//! | Sequential | replaces the current value | final current value |
//! | Bail | stops dispatch and is returned | no result |
//! | Waterfall | is prepended to the argument tuple | final tuple |
//! | Loop | restarts dispatch at index 0 | original input |

use std::fmt;

use tracing::debug;

use hookweave_core::HookResult;

use crate::input::{AnyInput, MiddlewareInput, PipelineLike, normalize};
use crate::limits::{Budget, DispatchLimits};
use crate::middleware::{Middleware, PipelineInput, SharedMiddleware};

/// Dispatch strategy of a [`Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Thread one value through every middleware.
    Sequential,
    /// First middleware to answer wins.
    Bail,
    /// Fold answers into a growing argument tuple.
    Waterfall,
    /// Restart from the top until every middleware stays silent.
    Loop,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Bail => write!(f, "bail"),
            Self::Waterfall => write!(f, "waterfall"),
            Self::Loop => write!(f, "loop"),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<T> {
    /// A bail middleware answered and dispatch stopped there.
    Bailed(T),
    /// Dispatch reached the end of the chain.
    ///
    /// Carries the final argument tuple: the threaded value for
    /// sequential, the untouched input for bail and loop, the folded tuple
    /// for waterfall.
    Exhausted(Vec<T>),
}

impl<T> Completion<T> {
    /// Returns the bailed value, or the head of the final tuple.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Bailed(value) => Some(value),
            Self::Exhausted(args) => args.into_iter().next(),
        }
    }

    /// Returns the bailed value, if any.
    pub fn bailed(self) -> Option<T> {
        match self {
            Self::Bailed(value) => Some(value),
            Self::Exhausted(_) => None,
        }
    }

    /// Returns whether a bail middleware answered.
    pub fn is_bailed(&self) -> bool {
        matches!(self, Self::Bailed(_))
    }

    /// Returns the final argument tuple, or the bailed value alone.
    pub fn into_args(self) -> Vec<T> {
        match self {
            Self::Bailed(value) => vec![value],
            Self::Exhausted(args) => args,
        }
    }
}

/// An ordered middleware list plus its dispatch strategy.
pub struct Pipeline<T> {
    strategy: Strategy,
    middlewares: Vec<SharedMiddleware<T>>,
    limits: DispatchLimits,
}

impl<T> Pipeline<T> {
    /// Creates an empty pipeline.
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            middlewares: Vec::new(),
            limits: DispatchLimits::default(),
        }
    }

    /// Creates an empty sequential pipeline.
    pub fn sequential() -> Self {
        Self::new(Strategy::Sequential)
    }

    /// Creates an empty bail pipeline.
    pub fn bail() -> Self {
        Self::new(Strategy::Bail)
    }

    /// Creates an empty waterfall pipeline.
    pub fn waterfall() -> Self {
        Self::new(Strategy::Waterfall)
    }

    /// Creates an empty loop pipeline.
    pub fn looping() -> Self {
        Self::new(Strategy::Loop)
    }

    /// Replaces the dispatch limits.
    pub fn with_limits(mut self, limits: DispatchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replaces the dispatch limits in place.
    pub fn set_limits(&mut self, limits: DispatchLimits) {
        self.limits = limits;
    }

    /// Returns the dispatch limits.
    pub fn limits(&self) -> &DispatchLimits {
        &self.limits
    }

    /// Returns the strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Returns the middlewares in dispatch order.
    pub fn middlewares(&self) -> &[SharedMiddleware<T>] {
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
    pub fn use_(&mut self, input: impl Into<PipelineInput<T>>) -> &mut Self {
        let input = input.into();
        self.middlewares.extend(normalize(&input));
        self
    }

    /// Normalizes and appends every input, in order.
    pub fn use_all(&mut self, inputs: impl IntoIterator<Item = PipelineInput<T>>) -> &mut Self {
        for input in inputs {
            self.middlewares.extend(normalize(&input));
        }
        self
    }

    /// Removes every middleware.
    pub fn reset(&mut self) {
        self.middlewares.clear();
    }
}

impl<T: Send + Sync + 'static> Pipeline<T> {
    /// Classifies and appends type-erased inputs.
    ///
    /// Every value is classified before anything is appended, so a
    /// [`TypeMismatch`](hookweave_core::HookError::TypeMismatch) leaves the
    /// pipeline unchanged. The error names the rejected type and its
    /// position among `values`.
    pub fn use_any(&mut self, values: Vec<Box<dyn AnyInput>>) -> HookResult<&mut Self> {
        let inputs = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| MiddlewareInput::classify(value, &format!("[{i}]")))
            .collect::<HookResult<Vec<_>>>()?;
        Ok(self.use_all(inputs))
    }
}

impl<T: Clone + Send + Sync + 'static> Pipeline<T> {
    /// Runs the pipeline with a single input value.
    pub async fn run(&self, input: T) -> HookResult<Completion<T>> {
        self.dispatch(0, vec![input]).await
    }

    /// Runs the pipeline with an explicit argument tuple.
    pub async fn run_args(&self, args: Vec<T>) -> HookResult<Completion<T>> {
        self.dispatch(0, args).await
    }

    /// Dispatches from `index` with the given argument tuple.
    ///
    /// `run` is `dispatch(0, ..)`. Starting elsewhere is useful in tests.
    pub async fn dispatch(&self, index: usize, args: Vec<T>) -> HookResult<Completion<T>> {
        let mut budget = self.limits.begin();
        match self.strategy {
            Strategy::Sequential => self.dispatch_sequential(index, args, &budget).await,
            Strategy::Bail => self.dispatch_bail(index, args, &budget).await,
            Strategy::Waterfall => self.dispatch_waterfall(index, args, &budget).await,
            Strategy::Loop => self.dispatch_loop(index, args, &mut budget).await,
        }
    }

    async fn dispatch_sequential(
        &self,
        index: usize,
        mut args: Vec<T>,
        budget: &Budget,
    ) -> HookResult<Completion<T>> {
        for (offset, middleware) in self.middlewares.iter().skip(index).enumerate() {
            budget.check()?;
            if let Some(value) = middleware.call(&args).await {
                debug!(
                    strategy = %self.strategy,
                    index = index + offset,
                    "Middleware replaced value"
                );
                match args.first_mut() {
                    Some(head) => *head = value,
                    None => args.push(value),
                }
            }
        }
        Ok(Completion::Exhausted(args))
    }

    async fn dispatch_bail(
        &self,
        index: usize,
        args: Vec<T>,
        budget: &Budget,
    ) -> HookResult<Completion<T>> {
        for (offset, middleware) in self.middlewares.iter().skip(index).enumerate() {
            budget.check()?;
            if let Some(value) = middleware.call(&args).await {
                debug!(strategy = %self.strategy, index = index + offset, "Middleware bailed");
                return Ok(Completion::Bailed(value));
            }
        }
        Ok(Completion::Exhausted(args))
    }

    async fn dispatch_waterfall(
        &self,
        index: usize,
        mut args: Vec<T>,
        budget: &Budget,
    ) -> HookResult<Completion<T>> {
        for (offset, middleware) in self.middlewares.iter().skip(index).enumerate() {
            budget.check()?;
            if let Some(value) = middleware.call(&args).await {
                debug!(
                    strategy = %self.strategy,
                    index = index + offset,
                    arity = args.len() + 1,
                    "Middleware folded value"
                );
                args.insert(0, value);
            }
        }
        Ok(Completion::Exhausted(args))
    }

    async fn dispatch_loop(
        &self,
        index: usize,
        args: Vec<T>,
        budget: &mut Budget,
    ) -> HookResult<Completion<T>> {
        let mut cursor = index;
        while let Some(middleware) = self.middlewares.get(cursor) {
            budget.check()?;
            if middleware.call(&args).await.is_some() {
                budget.restart()?;
                debug!(
                    strategy = %self.strategy,
                    index = cursor,
                    pass = budget.passes(),
                    "Middleware requested another pass"
                );
                cursor = 0;
            } else {
                cursor += 1;
            }
        }
        Ok(Completion::Exhausted(args))
    }
}

impl<T> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Self {
            strategy: self.strategy,
            middlewares: self.middlewares.clone(),
            limits: self.limits.clone(),
        }
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("strategy", &self.strategy)
            .field("middlewares", &self.middlewares.len())
            .field("limits", &self.limits)
            .finish()
    }
}

impl<T: Send + Sync + 'static> PipelineLike<dyn Middleware<T>> for Pipeline<T> {
    fn middlewares(&self) -> Vec<SharedMiddleware<T>> {
        self.middlewares.clone()
    }
}
