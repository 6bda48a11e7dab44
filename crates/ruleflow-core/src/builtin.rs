//! Declarative actions over a JSON object state.
//!
//! Definitions are usually discovered from files (see
//! [`discovery`](crate::discovery)); one file describes one action:
//!
//! ```yaml
//! kind: append
//! field: msg
//! text: A
//! when:
//!   ready: true
//! ```
//!
//! Every instance gets its own [`FireBudget`] from the rule's
//! `numExecutions` config, defaulting to one firing.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::action::{Action, FireBudget};
use crate::error::{ActionError, Result, RuleflowError};
use crate::registry::ActionFactory;

// ---------------------------------------------------------------------------
// ActionDefinition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// Append `text` to the string at `field`, creating it when absent.
    Append { field: String, text: String },
    /// Overwrite `field` with `value`.
    Set { field: String, value: Value },
    /// Add `by` to the integer at `field`; absent counts as zero.
    Increment {
        field: String,
        #[serde(default = "default_step")]
        by: i64,
    },
}

impl Effect {
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::Append { .. } => "append",
            Effect::Set { .. } => "set",
            Effect::Increment { .. } => "increment",
        }
    }
}

fn default_step() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    #[serde(flatten)]
    pub effect: Effect,
    /// Fields that must equal the given values for the action to be eligible.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub when: BTreeMap<String, Value>,
}

impl ActionDefinition {
    pub fn new(effect: Effect) -> Self {
        Self {
            effect,
            when: BTreeMap::new(),
        }
    }

    pub fn when(mut self, field: impl Into<String>, value: Value) -> Self {
        self.when.insert(field.into(), value);
        self
    }

    /// Parse a definition file; `.json` as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&data).map_err(|e| e.to_string()),
            _ => serde_yaml::from_str(&data).map_err(|e| e.to_string()),
        };
        parsed.map_err(|reason| RuleflowError::InvalidDefinition {
            path: path.display().to_string(),
            reason,
        })
    }

    /// A factory building one budgeted instance per rule.
    pub fn into_factory(self) -> ActionFactory<Value> {
        let definition = Arc::new(self);
        Box::new(move |config| {
            Ok(Box::new(BuiltinAction {
                definition: Arc::clone(&definition),
                budget: FireBudget::from_config(config)?,
            }) as Box<dyn Action<Value>>)
        })
    }

    fn matches(&self, state: &Value) -> bool {
        self.when
            .iter()
            .all(|(field, expected)| state.get(field) == Some(expected))
    }
}

// ---------------------------------------------------------------------------
// BuiltinAction
// ---------------------------------------------------------------------------

pub struct BuiltinAction {
    definition: Arc<ActionDefinition>,
    budget: FireBudget,
}

impl BuiltinAction {
    pub fn remaining(&self) -> u64 {
        self.budget.remaining()
    }
}

#[async_trait]
impl Action<Value> for BuiltinAction {
    async fn can_execute(&self, state: &Value) -> std::result::Result<bool, ActionError> {
        Ok(!self.budget.is_exhausted() && self.definition.matches(state))
    }

    async fn execute(&mut self, mut state: Value) -> std::result::Result<Value, ActionError> {
        let object = state
            .as_object_mut()
            .ok_or_else(|| ActionError::StateShape("state must be a JSON object".into()))?;
        apply(&self.definition.effect, object)?;
        self.budget.consume();
        Ok(state)
    }
}

fn apply(effect: &Effect, object: &mut Map<String, Value>) -> std::result::Result<(), ActionError> {
    match effect {
        Effect::Append { field, text } => match object.get_mut(field) {
            Some(Value::String(current)) => current.push_str(text),
            None | Some(Value::Null) => {
                object.insert(field.clone(), Value::String(text.clone()));
            }
            Some(other) => {
                return Err(ActionError::StateShape(format!(
                    "field '{field}' is not a string: {other}"
                )))
            }
        },
        Effect::Set { field, value } => {
            object.insert(field.clone(), value.clone());
        }
        Effect::Increment { field, by } => {
            let current = match object.get(field) {
                None | Some(Value::Null) => 0,
                Some(v) => v.as_i64().ok_or_else(|| {
                    ActionError::StateShape(format!("field '{field}' is not an integer: {v}"))
                })?,
            };
            let next = current
                .checked_add(*by)
                .ok_or_else(|| ActionError::failed(format!("field '{field}' overflowed")))?;
            object.insert(field.clone(), Value::from(next));
        }
    }
    Ok(())
}
