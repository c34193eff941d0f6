//! Conditional per-action middleware

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trellis_core::{Middleware, MiddlewareRef};

/// `only`/`except` restriction on action names.
///
/// With neither list the condition always passes; with both, the action
/// must be in `only` and absent from `except`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionCondition {
    /// Run only for these actions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only: Option<Vec<String>>,
    /// Never run for these actions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub except: Option<Vec<String>>,
}

impl ActionCondition {
    /// Condition that always passes
    pub fn always() -> Self {
        Self::default()
    }

    /// Pass only for the listed actions
    pub fn only<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: Some(actions.into_iter().map(Into::into).collect()),
            except: None,
        }
    }

    /// Pass for every action except the listed ones
    pub fn except<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: None,
            except: Some(actions.into_iter().map(Into::into).collect()),
        }
    }

    /// Whether the condition passes for `action`
    pub fn applies_to(&self, action: &str) -> bool {
        let included = self
            .only
            .as_ref()
            .map_or(true, |only| only.iter().any(|a| a == action));
        let excluded = self
            .except
            .as_ref()
            .is_some_and(|except| except.iter().any(|a| a == action));
        included && !excluded
    }
}

/// A middleware declared by a controller to wrap some of its actions
#[derive(Debug, Clone)]
pub struct ActionFilter {
    middleware: MiddlewareRef,
    condition: ActionCondition,
}

impl ActionFilter {
    /// Wrap every action
    pub fn new(middleware: impl Into<MiddlewareRef>) -> Self {
        Self {
            middleware: middleware.into(),
            condition: ActionCondition::always(),
        }
    }

    /// Wrap every action with a middleware instance
    pub fn inline<M: Middleware + 'static>(middleware: M) -> Self {
        Self::new(MiddlewareRef::Inline(Arc::new(middleware)))
    }

    /// Restrict to the listed actions
    #[must_use]
    pub fn only<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.condition.only = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    /// Skip the listed actions
    #[must_use]
    pub fn except<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.condition.except = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the condition
    #[must_use]
    pub fn with_condition(mut self, condition: ActionCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Whether this filter wraps `action`
    pub fn applies_to(&self, action: &str) -> bool {
        self.condition.applies_to(action)
    }

    /// The wrapped middleware
    pub fn middleware(&self) -> &MiddlewareRef {
        &self.middleware
    }

    /// The action condition
    pub fn condition(&self) -> &ActionCondition {
        &self.condition
    }
}

/// Middleware of the filters that apply to `action`, in declaration order
pub fn filter_for_action(filters: &[ActionFilter], action: &str) -> Vec<MiddlewareRef> {
    filters
        .iter()
        .filter(|filter| filter.applies_to(action))
        .map(|filter| filter.middleware.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconditional() {
        let condition = ActionCondition::always();
        assert!(condition.applies_to("index"));
        assert!(condition.applies_to("destroy"));
    }

    #[test]
    fn test_only() {
        let condition = ActionCondition::only(["show", "update"]);
        assert!(condition.applies_to("show"));
        assert!(!condition.applies_to("index"));
    }

    #[test]
    fn test_except() {
        let condition = ActionCondition::except(["index"]);
        assert!(!condition.applies_to("index"));
        assert!(condition.applies_to("show"));
    }

    #[test]
    fn test_only_and_except_both_apply() {
        let condition = ActionCondition {
            only: Some(vec!["show".into(), "update".into()]),
            except: Some(vec!["update".into()]),
        };
        assert!(condition.applies_to("show"));
        assert!(!condition.applies_to("update"));
        assert!(!condition.applies_to("index"));
    }

    #[test]
    fn test_filter_for_action_keeps_order() {
        let filters = vec![
            ActionFilter::new("load_post").except(["index", "create"]),
            ActionFilter::new("audit"),
            ActionFilter::new("admin").only(["destroy"]),
        ];

        let names = |action| {
            filter_for_action(&filters, action)
                .iter()
                .map(|m| m.name().to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(names("index"), vec!["audit"]);
        assert_eq!(names("show"), vec!["load_post", "audit"]);
        assert_eq!(names("destroy"), vec!["load_post", "audit", "admin"]);
    }

    #[test]
    fn test_condition_deserialize() {
        let condition: ActionCondition =
            serde_json::from_str(r#"{"only": ["show"]}"#).unwrap();
        assert_eq!(condition, ActionCondition::only(["show"]));

        let empty: ActionCondition = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ActionCondition::always());
    }
}
