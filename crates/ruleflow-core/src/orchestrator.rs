//! The selection/execution loop.
//!
//! Setup resolves every rule's action through the registry and builds one
//! instance per rule, then groups rules into priority tiers sorted
//! ascending (the *base order*). Running repeats:
//!
//! 1. probe every rule of the next tier concurrently,
//! 2. pick one eligible rule (tiebreaker only when more than one),
//! 3. `selected` hook, fire, `executed` hook,
//! 4. restart from the first tier.
//!
//! A pass over all tiers with no firing ends the run. There is no bound on
//! the number of firings unless [`RunOptions::max_firings`] is set.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use uuid::Uuid;

use crate::action::Action;
use crate::error::{Result, RuleflowError};
use crate::hooks::{Candidate, HookKind, Hooks};
use crate::knowledge::{group_by_priority, KnowledgeBase, Rule};
use crate::registry::ActionRegistry;

// ---------------------------------------------------------------------------
// RunOptions / RunReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Abort with `FiringLimitExceeded` instead of firing more than this
    /// many times. `None` (the default) never stops a run early.
    pub max_firings: Option<u64>,
}

impl RunOptions {
    pub fn with_max_firings(mut self, limit: u64) -> Self {
        self.max_firings = Some(limit);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RunReport<S> {
    pub run_id: Uuid,
    pub state: S,
    pub firings: u64,
    /// Tier scans started, including the final scan that fired nothing.
    pub passes: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

struct Slot<S: Send + Sync> {
    rule: Rule,
    action: Box<dyn Action<S>>,
}

struct Tier {
    priority: f64,
    /// Rule indices in declaration order.
    members: Vec<usize>,
}

/// A knowledge base bound to freshly constructed action instances.
///
/// Consumed by `run`: instances carry per-run counters, so each run needs
/// its own orchestrator.
pub struct Orchestrator<S: Send + Sync> {
    slots: Vec<Slot<S>>,
    tiers: Vec<Tier>,
}

impl<S: Send + Sync> Orchestrator<S> {
    /// Resolve and construct every rule's action and compute the base order.
    ///
    /// Fails on a NaN priority, or on the first rule whose action is
    /// unregistered or whose config is rejected by its factory.
    pub fn new(knowledge_base: &KnowledgeBase, registry: &ActionRegistry<S>) -> Result<Self> {
        knowledge_base.validate()?;
        let mut slots = Vec::with_capacity(knowledge_base.len());

        for (index, rule) in knowledge_base.rules.iter().enumerate() {
            let factory = registry.lookup(&rule.action)?;
            let action = factory(rule.action_config.as_ref()).map_err(|source| {
                RuleflowError::ConstructAction {
                    rule: index,
                    action: rule.action.clone(),
                    source,
                }
            })?;
            slots.push(Slot {
                rule: rule.clone(),
                action,
            });
        }

        let tiers = group_by_priority(&knowledge_base.rules)
            .into_iter()
            .map(|(priority, members)| Tier { priority, members })
            .collect();

        Ok(Self { slots, tiers })
    }

    /// The base order: each priority with its rules in declaration order.
    pub fn tiers(&self) -> Vec<(f64, Vec<&Rule>)> {
        self.tiers
            .iter()
            .map(|t| {
                let rules = t.members.iter().map(|&i| &self.slots[i].rule).collect();
                (t.priority, rules)
            })
            .collect()
    }

    pub fn rule_count(&self) -> usize {
        self.slots.len()
    }

    /// Run to quiescence and return the final state.
    pub async fn run<H>(self, start: S, hooks: &mut H) -> Result<S>
    where
        H: Hooks<S> + ?Sized,
    {
        let report = self.run_with(start, hooks, RunOptions::default()).await?;
        Ok(report.state)
    }

    /// Run to quiescence and return the final state with run statistics.
    pub async fn run_with<H>(self, start: S, hooks: &mut H, options: RunOptions) -> Result<RunReport<S>>
    where
        H: Hooks<S> + ?Sized,
    {
        let Orchestrator { mut slots, tiers } = self;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut state = start;
        let mut firings = 0u64;
        let mut passes = 0u64;

        tracing::debug!(%run_id, rules = slots.len(), tiers = tiers.len(), "run started");

        'scan: loop {
            passes += 1;
            for tier in &tiers {
                let executable = probe_tier(&slots, tier, &state).await?;
                tracing::trace!(
                    %run_id,
                    priority = tier.priority,
                    probed = tier.members.len(),
                    eligible = executable.len(),
                    "tier probed"
                );

                let chosen = match executable.as_slice() {
                    [] => continue,
                    [only] => *only,
                    _ => break_tie(&slots, &executable, hooks).await?,
                };

                if let Some(limit) = options.max_firings {
                    if firings >= limit {
                        return Err(RuleflowError::FiringLimitExceeded { limit });
                    }
                }

                let slot = &mut slots[chosen];
                hooks
                    .selected(&slot.rule, &state)
                    .await
                    .map_err(|source| RuleflowError::Hook {
                        hook: HookKind::Selected,
                        source,
                    })?;
                state = slot
                    .action
                    .execute(state)
                    .await
                    .map_err(|source| RuleflowError::Fire {
                        rule: chosen,
                        action: slot.rule.action.clone(),
                        source,
                    })?;
                hooks
                    .executed(&slot.rule, &state)
                    .await
                    .map_err(|source| RuleflowError::Hook {
                        hook: HookKind::Executed,
                        source,
                    })?;

                firings += 1;
                tracing::debug!(
                    %run_id,
                    firing = firings,
                    rule = chosen,
                    priority = slot.rule.priority,
                    action = %slot.rule.action,
                    "rule fired"
                );
                continue 'scan;
            }
            break;
        }

        let finished_at = Utc::now();
        tracing::info!(%run_id, firings, passes, "run complete");

        Ok(RunReport {
            run_id,
            state,
            firings,
            passes,
            started_at,
            finished_at,
        })
    }
}

/// Set up an orchestrator for `knowledge_base` and run it from `start`.
pub async fn run<S, H>(
    start: S,
    knowledge_base: &KnowledgeBase,
    registry: &ActionRegistry<S>,
    hooks: &mut H,
) -> Result<S>
where
    S: Send + Sync,
    H: Hooks<S> + ?Sized,
{
    Orchestrator::new(knowledge_base, registry)?
        .run(start, hooks)
        .await
}

// ---------------------------------------------------------------------------
// Loop helpers
// ---------------------------------------------------------------------------

/// Probe every rule of `tier` concurrently; eligible indices in declaration order.
async fn probe_tier<S: Send + Sync>(slots: &[Slot<S>], tier: &Tier, state: &S) -> Result<Vec<usize>> {
    let probes = tier.members.iter().map(|&index| {
        let slot = &slots[index];
        async move {
            slot.action
                .can_execute(state)
                .await
                .map(|eligible| (index, eligible))
                .map_err(|source| RuleflowError::Probe {
                    rule: index,
                    action: slot.rule.action.clone(),
                    source,
                })
        }
    });

    let results = try_join_all(probes).await?;
    Ok(results
        .into_iter()
        .filter_map(|(index, eligible)| eligible.then_some(index))
        .collect())
}

async fn break_tie<S, H>(slots: &[Slot<S>], executable: &[usize], hooks: &mut H) -> Result<usize>
where
    S: Send + Sync,
    H: Hooks<S> + ?Sized,
{
    let candidates: Vec<Candidate<'_>> = executable
        .iter()
        .map(|&index| Candidate {
            index,
            rule: &slots[index].rule,
        })
        .collect();

    let pick = hooks
        .tiebreaker(&candidates)
        .await
        .map_err(|source| RuleflowError::Hook {
            hook: HookKind::Tiebreaker,
            source,
        })?;

    executable
        .get(pick)
        .copied()
        .ok_or(RuleflowError::TiebreakerOutOfRange {
            index: pick,
            candidates: executable.len(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
