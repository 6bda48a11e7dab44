use std::collections::HashMap;

use serde_json::Value;

use crate::action::Action;
use crate::error::{ActionError, Result, RuleflowError};

/// Builds one action instance from a rule's optional config blob.
pub type ActionFactory<S> =
    Box<dyn Fn(Option<&Value>) -> std::result::Result<Box<dyn Action<S>>, ActionError> + Send + Sync>;

// ---------------------------------------------------------------------------
// ActionRegistry
// ---------------------------------------------------------------------------

/// Keyed store mapping an action id to the factory that builds it.
///
/// Populated once at startup, either by explicit `register` calls or by
/// [`discovery::load_dir`](crate::discovery::load_dir). Ids are unique:
/// registering the same id twice is an error rather than an overwrite.
pub struct ActionRegistry<S: Send + Sync> {
    factories: HashMap<String, ActionFactory<S>>,
}

impl<S: Send + Sync> ActionRegistry<S> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Bind `id` to `factory`. Fails if `id` is already bound.
    pub fn register(&mut self, id: impl Into<String>, factory: ActionFactory<S>) -> Result<()> {
        let id = id.into();
        if self.factories.contains_key(&id) {
            return Err(RuleflowError::DuplicateAction(id));
        }
        tracing::trace!(action = %id, "registered action");
        self.factories.insert(id, factory);
        Ok(())
    }

    /// Register a plain closure as a factory.
    pub fn register_fn<F>(&mut self, id: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(Option<&Value>) -> std::result::Result<Box<dyn Action<S>>, ActionError>
            + Send
            + Sync
            + 'static,
    {
        self.register(id, Box::new(factory))
    }

    /// Resolve `id` to its factory. Fails if `id` is unbound.
    pub fn lookup(&self, id: &str) -> Result<&ActionFactory<S>> {
        self.factories
            .get(id)
            .ok_or_else(|| RuleflowError::UnknownAction(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// All registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<S: Send + Sync> Default for ActionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Send + Sync> std::fmt::Debug for ActionRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("count", &self.factories.len())
            .field("ids", &self.ids())
            .finish()
    }
}
