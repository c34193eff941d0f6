//! Middleware trait and onion-model chain dispatch

use crate::{Context, Error, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;

/// Middleware trait for request processing
///
/// Code before `next.run(ctx)` runs on the way in, code after it runs once
/// every inner layer has finished.
#[async_trait]
pub trait Middleware: Send + Sync + fmt::Debug {
    /// Process a request
    ///
    /// # Arguments
    ///
    /// * `ctx` - The request context
    /// * `next` - Continuation into the rest of the chain
    async fn call(&self, ctx: &mut Context, next: Next) -> Result<()>;

    /// Name used in logs and route listings
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Per-invocation dispatch guard
#[derive(Debug)]
struct DispatchState {
    /// Highest chain position dispatched so far
    reached: AtomicIsize,
    /// Position whose continuation was re-entered, if any
    violation: AtomicIsize,
}

impl DispatchState {
    fn new() -> Self {
        Self {
            reached: AtomicIsize::new(-1),
            violation: AtomicIsize::new(-1),
        }
    }

    fn violation(&self) -> Option<usize> {
        usize::try_from(self.violation.load(Ordering::SeqCst)).ok()
    }
}

/// Represents the next middleware in the chain
#[derive(Clone)]
pub struct Next {
    middleware_stack: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    state: Arc<DispatchState>,
}

impl Next {
    /// Run the next middleware, or finish if the chain is exhausted.
    ///
    /// Each continuation may run at most once; re-entering it, or running a
    /// continuation from an outer layer after an inner one, fails with
    /// [`Error::ReentrantContinuation`].
    pub async fn run(&self, ctx: &mut Context) -> Result<()> {
        let position = self.index as isize;
        let previous = self.state.reached.fetch_max(position, Ordering::SeqCst);
        if previous >= position {
            self.state.violation.store(position, Ordering::SeqCst);
            tracing::error!(
                position = self.index,
                reached = previous,
                "Middleware continuation invoked more than once"
            );
            return Err(Error::ReentrantContinuation { index: self.index });
        }

        match self.middleware_stack.get(self.index) {
            Some(middleware) => {
                let next = Self {
                    middleware_stack: Arc::clone(&self.middleware_stack),
                    index: self.index + 1,
                    state: Arc::clone(&self.state),
                };
                middleware.call(ctx, next).await
            }
            None => Ok(()),
        }
    }

    /// Number of middleware left to run after this continuation
    pub fn remaining(&self) -> usize {
        self.middleware_stack.len().saturating_sub(self.index)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// An ordered middleware sequence composed into a single pipeline
#[derive(Clone)]
pub struct Chain {
    middleware_stack: Arc<[Arc<dyn Middleware>]>,
}

impl Chain {
    /// Compose a middleware sequence
    pub fn new(middleware_stack: impl Into<Arc<[Arc<dyn Middleware>]>>) -> Self {
        Self {
            middleware_stack: middleware_stack.into(),
        }
    }

    /// Run the chain against a context.
    ///
    /// Resolves once every layer has returned. A continuation violation is
    /// reported even when a layer swallowed the error it raised.
    pub async fn invoke(&self, ctx: &mut Context) -> Result<()> {
        let state = Arc::new(DispatchState::new());
        let next = Next {
            middleware_stack: Arc::clone(&self.middleware_stack),
            index: 0,
            state: Arc::clone(&state),
        };

        let result = next.run(ctx).await;

        match (result, state.violation()) {
            (Err(err), _) => Err(err),
            (Ok(()), Some(index)) => Err(Error::ReentrantContinuation { index }),
            (Ok(()), None) => Ok(()),
        }
    }

    /// Number of middleware in the chain
    pub fn len(&self) -> usize {
        self.middleware_stack.len()
    }

    /// Whether the chain is empty
    pub fn is_empty(&self) -> bool {
        self.middleware_stack.is_empty()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.middleware_stack.iter().map(|m| m.name()))
            .finish()
    }
}

/// Reference to a middleware attached to a router or route
#[derive(Clone)]
pub enum MiddlewareRef {
    /// A middleware instance
    Inline(Arc<dyn Middleware>),
    /// A registered middleware, as `name` or `name:argument`
    Named(String),
}

impl MiddlewareRef {
    /// Wrap a middleware instance
    pub fn inline<M: Middleware + 'static>(middleware: M) -> Self {
        MiddlewareRef::Inline(Arc::new(middleware))
    }

    /// Display name
    pub fn name(&self) -> &str {
        match self {
            MiddlewareRef::Inline(middleware) => middleware.name(),
            MiddlewareRef::Named(name) => name,
        }
    }
}

impl fmt::Debug for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareRef::Inline(middleware) => f.debug_tuple("Inline").field(middleware).finish(),
            MiddlewareRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

impl From<&str> for MiddlewareRef {
    fn from(name: &str) -> Self {
        MiddlewareRef::Named(name.to_string())
    }
}

impl From<String> for MiddlewareRef {
    fn from(name: String) -> Self {
        MiddlewareRef::Named(name)
    }
}

impl From<Arc<dyn Middleware>> for MiddlewareRef {
    fn from(middleware: Arc<dyn Middleware>) -> Self {
        MiddlewareRef::Inline(middleware)
    }
}

/// Helper macro for creating simple middleware
///
/// ```
/// use trellis_core::{middleware_fn, Middleware};
///
/// middleware_fn!(Powered, |ctx, next| {
///     next.run(ctx).await?;
///     ctx.set_header("x-powered-by", "trellis");
///     Ok(())
/// });
/// ```
#[macro_export]
macro_rules! middleware_fn {
    ($vis:vis $name:ident, |$ctx:ident, $next:ident| $body:block) => {
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        #[$crate::async_trait]
        impl $crate::Middleware for $name {
            async fn call(
                &self,
                $ctx: &mut $crate::Context,
                $next: $crate::Next,
            ) -> $crate::Result<()> {
                $body
            }
        }
    };
}
