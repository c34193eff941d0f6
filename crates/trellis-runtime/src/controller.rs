//! Controllers: named actions plus around-action filters

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use trellis_core::{Action, ActionFn, Body, Context, Result};
use trellis_middleware::ActionFilter;

/// A set of actions addressed by name from `controller#action` handlers
pub trait Controller: Send + Sync + fmt::Debug {
    /// Look up an action by name
    fn action(&self, name: &str) -> Option<Arc<dyn Action>>;

    /// Middleware wrapped around actions, filtered per action by `only` / `except`
    fn around_actions(&self) -> &[ActionFilter] {
        &[]
    }
}

/// Map-backed [`Controller`]
#[derive(Clone, Default)]
pub struct ActionTable {
    actions: BTreeMap<String, Arc<dyn Action>>,
    filters: Vec<ActionFilter>,
}

impl ActionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action, replacing any previous action of the same name
    #[must_use]
    pub fn action<A: Action + 'static>(mut self, name: impl Into<String>, action: A) -> Self {
        self.actions.insert(name.into(), Arc::new(action));
        self
    }

    /// Add an action from a synchronous closure
    #[must_use]
    pub fn action_fn<F>(self, name: &'static str, f: F) -> Self
    where
        F: Fn(&mut Context) -> Result<Option<Body>> + Send + Sync + 'static,
    {
        self.action(name, ActionFn::new(name, f))
    }

    /// Wrap actions with a filtered middleware
    #[must_use]
    pub fn around_action(mut self, filter: ActionFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Action names, sorted
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}

impl Controller for ActionTable {
    fn action(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    fn around_actions(&self) -> &[ActionFilter] {
        &self.filters
    }
}

impl fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTable")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("around_actions", &self.filters.len())
            .finish()
    }
}
