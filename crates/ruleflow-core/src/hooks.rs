//! Extension points invoked by the orchestrator around every firing.
//!
//! A hook set has three callbacks:
//!
//! - `tiebreaker` picks one rule when several rules of the same tier are
//!   eligible. It is never called for a single eligible rule.
//! - `selected` observes the chosen rule and the state *before* it fires.
//! - `executed` observes the chosen rule and the state *after* it fired.
//!
//! The tiebreaker receives the eligible candidates in declaration order and
//! returns an index into that slice. The default picks index `0`, so the
//! earliest-declared rule at a priority wins.
//!
//! Any hook error aborts the run.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::knowledge::Rule;

// ---------------------------------------------------------------------------
// HookKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Tiebreaker,
    Selected,
    Executed,
}

impl HookKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HookKind::Tiebreaker => "tiebreaker",
            HookKind::Selected => "selected",
            HookKind::Executed => "executed",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// An eligible rule offered to the tiebreaker.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Position of the rule in the knowledge base.
    pub index: usize,
    pub rule: &'a Rule,
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Hooks<S: Send + Sync>: Send {
    /// Choose among two or more eligible candidates. Returns an index into
    /// `candidates`.
    async fn tiebreaker(&mut self, candidates: &[Candidate<'_>]) -> Result<usize, ActionError> {
        let _ = candidates;
        Ok(0)
    }

    async fn selected(&mut self, rule: &Rule, state: &S) -> Result<(), ActionError> {
        let _ = (rule, state);
        Ok(())
    }

    async fn executed(&mut self, rule: &Rule, state: &S) -> Result<(), ActionError> {
        let _ = (rule, state);
        Ok(())
    }
}

/// Hooks with every default in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl<S: Send + Sync> Hooks<S> for DefaultHooks {}

// ---------------------------------------------------------------------------
// TieBreak
// ---------------------------------------------------------------------------

/// Built-in tiebreak policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Earliest-declared candidate.
    #[default]
    First,
    /// Latest-declared candidate.
    Last,
}

impl TieBreak {
    pub fn pick(self, candidates: usize) -> usize {
        match self {
            TieBreak::First => 0,
            TieBreak::Last => candidates.saturating_sub(1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TieBreak::First => "first",
            TieBreak::Last => "last",
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(TieBreak::First),
            "last" => Ok(TieBreak::Last),
            other => Err(format!("unknown tiebreak policy '{other}' (expected first or last)")),
        }
    }
}

#[async_trait]
impl<S: Send + Sync> Hooks<S> for TieBreak {
    async fn tiebreaker(&mut self, candidates: &[Candidate<'_>]) -> Result<usize, ActionError> {
        Ok(self.pick(candidates.len()))
    }
}

// ---------------------------------------------------------------------------
// HookSet
// ---------------------------------------------------------------------------

type TiebreakFn = Box<dyn FnMut(&[Candidate<'_>]) -> Result<usize, ActionError> + Send>;
type ObserveFn<S> = Box<dyn FnMut(&Rule, &S) -> Result<(), ActionError> + Send>;

/// Hooks assembled from plain closures. Unset hooks keep their default.
///
/// ```rust,ignore
/// let mut hooks = HookSet::new()
///     .with_tiebreaker(|candidates| Ok(candidates.len() - 1))
///     .with_executed(|rule, state| { println!("{} -> {state:?}", rule.action); Ok(()) });
/// ```
pub struct HookSet<S> {
    tiebreaker: Option<TiebreakFn>,
    selected: Option<ObserveFn<S>>,
    executed: Option<ObserveFn<S>>,
}

impl<S> HookSet<S> {
    pub fn new() -> Self {
        Self {
            tiebreaker: None,
            selected: None,
            executed: None,
        }
    }

    pub fn with_tiebreaker<F>(mut self, f: F) -> Self
    where
        F: FnMut(&[Candidate<'_>]) -> Result<usize, ActionError> + Send + 'static,
    {
        self.tiebreaker = Some(Box::new(f));
        self
    }

    pub fn with_selected<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Rule, &S) -> Result<(), ActionError> + Send + 'static,
    {
        self.selected = Some(Box::new(f));
        self
    }

    pub fn with_executed<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Rule, &S) -> Result<(), ActionError> + Send + 'static,
    {
        self.executed = Some(Box::new(f));
        self
    }
}

impl<S> Default for HookSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S: Send + Sync> Hooks<S> for HookSet<S> {
    async fn tiebreaker(&mut self, candidates: &[Candidate<'_>]) -> Result<usize, ActionError> {
        match self.tiebreaker.as_mut() {
            Some(f) => f(candidates),
            None => Ok(0),
        }
    }

    async fn selected(&mut self, rule: &Rule, state: &S) -> Result<(), ActionError> {
        match self.selected.as_mut() {
            Some(f) => f(rule, state),
            None => Ok(()),
        }
    }

    async fn executed(&mut self, rule: &Rule, state: &S) -> Result<(), ActionError> {
        match self.executed.as_mut() {
            Some(f) => f(rule, state),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// TracingHooks
// ---------------------------------------------------------------------------

/// Logs every selection and firing at `info` level.
#[derive(Debug, Clone, Default)]
pub struct TracingHooks {
    policy: TieBreak,
    firings: u64,
}

impl TracingHooks {
    pub fn new(policy: TieBreak) -> Self {
        Self { policy, firings: 0 }
    }

    pub fn firings(&self) -> u64 {
        self.firings
    }
}

#[async_trait]
impl<S: Send + Sync> Hooks<S> for TracingHooks {
    async fn tiebreaker(&mut self, candidates: &[Candidate<'_>]) -> Result<usize, ActionError> {
        let chosen = self.policy.pick(candidates.len());
        tracing::info!(
            policy = %self.policy,
            candidates = candidates.len(),
            chosen = candidates.get(chosen).map(|c| c.rule.action.as_str()).unwrap_or(""),
            "tie broken"
        );
        Ok(chosen)
    }

    async fn selected(&mut self, rule: &Rule, _state: &S) -> Result<(), ActionError> {
        tracing::info!(
            firing = self.firings + 1,
            priority = rule.priority,
            action = %rule.action,
            "rule selected"
        );
        Ok(())
    }

    async fn executed(&mut self, rule: &Rule, _state: &S) -> Result<(), ActionError> {
        self.firings += 1;
        tracing::info!(
            firing = self.firings,
            priority = rule.priority,
            action = %rule.action,
            "rule executed"
        );
        Ok(())
    }
}
