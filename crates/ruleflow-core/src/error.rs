use thiserror::Error;

use crate::hooks::HookKind;

// ---------------------------------------------------------------------------
// ActionError: raised by actions and hooks
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("invalid action config: {0}")]
    InvalidConfig(String),

    #[error("state has unexpected shape: {0}")]
    StateShape(String),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ActionError {
    pub fn failed(msg: impl Into<String>) -> Self {
        ActionError::Failed(msg.into())
    }
}

// ---------------------------------------------------------------------------
// RuleflowError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RuleflowError {
    #[error("action already registered: {0}")]
    DuplicateAction(String),

    #[error("no action registered with id: {0}")]
    UnknownAction(String),

    #[error("invalid action id '{0}': must start with a letter and contain only letters, digits, '_', '-' or '.'")]
    InvalidActionId(String),

    #[error("invalid action definition {path}: {reason}")]
    InvalidDefinition { path: String, reason: String },

    #[error("rule #{rule} ('{action}') has a NaN priority")]
    InvalidPriority { rule: usize, action: String },

    #[error("failed to construct action '{action}' for rule #{rule}")]
    ConstructAction {
        rule: usize,
        action: String,
        #[source]
        source: ActionError,
    },

    #[error("eligibility probe failed for rule #{rule} ('{action}')")]
    Probe {
        rule: usize,
        action: String,
        #[source]
        source: ActionError,
    },

    #[error("firing failed for rule #{rule} ('{action}')")]
    Fire {
        rule: usize,
        action: String,
        #[source]
        source: ActionError,
    },

    #[error("{hook} hook failed")]
    Hook {
        hook: HookKind,
        #[source]
        source: ActionError,
    },

    #[error("tiebreaker returned index {index} for {candidates} candidate(s)")]
    TiebreakerOutOfRange { index: usize, candidates: usize },

    #[error("firing limit of {limit} exceeded")]
    FiringLimitExceeded { limit: u64 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuleflowError>;
