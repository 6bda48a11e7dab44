use crate::error::{Result, RuleflowError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A candidate transition: which action to run, at what priority, with
/// which config.
///
/// Lower `priority` values are considered first. Any number except NaN is
/// a valid priority; `0.5` sits between `0` and `1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub priority: f64,
    pub action: String,
    #[serde(
        default,
        rename = "actionConfig",
        alias = "action_config",
        skip_serializing_if = "Option::is_none"
    )]
    pub action_config: Option<Value>,
}

impl Rule {
    pub fn new(priority: impl Into<f64>, action: impl Into<String>) -> Self {
        Self {
            priority: priority.into(),
            action: action.into(),
            action_config: None,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.action_config = Some(config);
        self
    }
}

// ---------------------------------------------------------------------------
// KnowledgeBase
// ---------------------------------------------------------------------------

/// The static, ordered list of rules an orchestrator runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl KnowledgeBase {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Load a knowledge base from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::parse(&data, path)
    }

    fn parse(data: &str, path: &Path) -> Result<Self> {
        let kb: KnowledgeBase = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(data)?,
            _ => serde_yaml::from_str(data)?,
        };
        kb.validate()?;
        Ok(kb)
    }

    /// Reject rules whose priority cannot be ordered.
    pub fn validate(&self) -> Result<()> {
        match self.rules.iter().position(|r| r.priority.is_nan()) {
            Some(index) => Err(RuleflowError::InvalidPriority {
                rule: index,
                action: self.rules[index].action.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Priority → number of rules, ascending.
    pub fn tiers(&self) -> Vec<(f64, usize)> {
        group_by_priority(&self.rules)
            .into_iter()
            .map(|(priority, members)| (priority, members.len()))
            .collect()
    }
}

/// Rule indices grouped by priority, tiers ascending, declaration order
/// kept inside each tier. `-0.0` and `0.0` share a tier.
pub(crate) fn group_by_priority(rules: &[Rule]) -> Vec<(f64, Vec<usize>)> {
    // `+ 0.0` folds -0.0 into 0.0 so total_cmp keeps signed zeros together.
    let key = |index: usize| rules[index].priority + 0.0;
    let mut order: Vec<usize> = (0..rules.len()).collect();
    // Stable, so equal priorities stay in declaration order.
    order.sort_by(|&a, &b| key(a).total_cmp(&key(b)));

    let mut tiers: Vec<(f64, Vec<usize>)> = Vec::new();
    for index in order {
        let priority = key(index);
        match tiers.last_mut() {
            Some((current, members)) if *current == priority => members.push(index),
            _ => tiers.push((priority, vec![index])),
        }
    }
    tiers
}

impl From<Vec<Rule>> for KnowledgeBase {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}
