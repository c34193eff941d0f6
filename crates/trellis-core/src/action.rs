//! Terminal request handlers

use crate::{Body, Context, Result};
use async_trait::async_trait;
use std::fmt;

/// A terminal handler producing the response body
#[async_trait]
pub trait Action: Send + Sync + fmt::Debug {
    /// Handle the request. `None` leaves the response body untouched.
    async fn call(&self, ctx: &mut Context) -> Result<Option<Body>>;
}

/// [`Action`] backed by a synchronous closure
pub struct ActionFn<F> {
    name: &'static str,
    f: F,
}

impl<F> ActionFn<F>
where
    F: Fn(&mut Context) -> Result<Option<Body>> + Send + Sync,
{
    /// Wrap a closure
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> fmt::Debug for ActionFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionFn").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Action for ActionFn<F>
where
    F: Fn(&mut Context) -> Result<Option<Body>> + Send + Sync,
{
    async fn call(&self, ctx: &mut Context) -> Result<Option<Body>> {
        (self.f)(ctx)
    }
}
