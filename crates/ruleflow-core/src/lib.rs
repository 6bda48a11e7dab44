//! Priority-ordered rule selection.
//!
//! A [`KnowledgeBase`] lists `(priority, action, config)` rules. An
//! [`Orchestrator`] binds each rule to an action instance built through an
//! [`ActionRegistry`], then repeatedly fires the single most eligible rule,
//! restarting from the lowest priority value after every firing, until no
//! rule is eligible.
//!
//! ```rust,ignore
//! use ruleflow_core::{discovery, orchestrator, ActionRegistry, DefaultHooks, KnowledgeBase};
//!
//! let mut registry = ActionRegistry::new();
//! discovery::load_dir(&mut registry, "actions".as_ref())?;
//! let kb = KnowledgeBase::load("rules.yaml".as_ref())?;
//! let end = orchestrator::run(serde_json::json!({}), &kb, &registry, &mut DefaultHooks).await?;
//! ```

pub mod action;
pub mod builtin;
pub mod config;
pub mod discovery;
pub mod error;
pub mod hooks;
pub mod io;
pub mod knowledge;
pub mod orchestrator;
pub mod registry;

pub use action::{Action, FireBudget};
pub use error::{ActionError, Result, RuleflowError};
pub use hooks::{Candidate, DefaultHooks, HookKind, HookSet, Hooks, TieBreak, TracingHooks};
pub use knowledge::{KnowledgeBase, Rule};
pub use orchestrator::{Orchestrator, RunOptions, RunReport};
pub use registry::{ActionFactory, ActionRegistry};
