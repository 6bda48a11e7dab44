//! The capability contract every rule's action implements.
//!
//! One instance is constructed per rule when an [`Orchestrator`] is set up
//! and is reused for every firing of that rule within the run. Per-rule
//! counters (fire budgets and the like) live on the instance, never on the
//! scheduler.
//!
//! [`Orchestrator`]: crate::orchestrator::Orchestrator

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ActionError;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Executable behavior bound to a single rule.
///
/// `can_execute` must not mutate anything observable: the orchestrator
/// probes every rule of a tier concurrently and relies on probes being
/// independent. Refractoriness belongs to `execute`, which may consume an
/// internal budget so that later probes return `false`.
#[async_trait]
pub trait Action<S: Send + Sync>: Send + Sync {
    /// Whether this rule may fire against `state`.
    async fn can_execute(&self, state: &S) -> Result<bool, ActionError>;

    /// Apply the rule's effect, returning the next state.
    async fn execute(&mut self, state: S) -> Result<S, ActionError>;
}

// ---------------------------------------------------------------------------
// FireBudget
// ---------------------------------------------------------------------------

/// Config key holding the number of times an instance may fire.
pub const NUM_EXECUTIONS_KEY: &str = "numExecutions";

/// Remaining-fire counter read from a rule's `numExecutions` config.
///
/// Defaults to a single firing when the key is absent or zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireBudget {
    remaining: u64,
}

impl FireBudget {
    pub fn new(remaining: u64) -> Self {
        Self { remaining }
    }

    /// Read the budget from an optional config blob.
    pub fn from_config(config: Option<&Value>) -> Result<Self, ActionError> {
        let Some(raw) = config.and_then(|c| c.get(NUM_EXECUTIONS_KEY)) else {
            return Ok(Self::new(1));
        };
        match raw.as_u64() {
            Some(0) => Ok(Self::new(1)),
            Some(n) => Ok(Self::new(n)),
            None => Err(ActionError::InvalidConfig(format!(
                "{NUM_EXECUTIONS_KEY} must be a non-negative integer, got {raw}"
            ))),
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Consume one firing. Returns `false` if the budget was already spent.
    pub fn consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

impl Default for FireBudget {
    fn default() -> Self {
        Self::new(1)
    }
}
