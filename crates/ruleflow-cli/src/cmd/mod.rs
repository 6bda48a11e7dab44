pub mod actions;
pub mod check;
pub mod run;

use anyhow::Context;
use ruleflow_core::discovery::{self, DiscoveredAction};
use ruleflow_core::ActionRegistry;
use serde_json::Value;
use std::path::Path;

/// Registry populated from every definition file in `dir`, plus what was
/// found there.
pub(crate) fn load_registry(
    dir: &Path,
) -> anyhow::Result<(ActionRegistry<Value>, Vec<DiscoveredAction>)> {
    let mut registry = ActionRegistry::new();
    let discovered = discovery::load_dir(&mut registry, dir)
        .with_context(|| format!("failed to load actions from {}", dir.display()))?;
    Ok((registry, discovered))
}
