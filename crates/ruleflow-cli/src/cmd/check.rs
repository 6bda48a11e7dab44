use crate::output::{print_json, print_table};
use crate::root::Settings;
use anyhow::Context;
use ruleflow_core::{KnowledgeBase, Orchestrator};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct TierRow {
    priority: f64,
    rules: Vec<String>,
}

pub fn run(
    settings: &Settings,
    rules: &Path,
    actions: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let (registry, _) = super::load_registry(&settings.actions_dir(actions)?)?;
    let kb = KnowledgeBase::load(rules)
        .with_context(|| format!("failed to load rules from {}", rules.display()))?;

    // Construction alone resolves every action and validates every config.
    let orchestrator: Orchestrator<Value> =
        Orchestrator::new(&kb, &registry).context("knowledge base rejected")?;

    let tiers: Vec<TierRow> = orchestrator
        .tiers()
        .into_iter()
        .map(|(priority, rules)| TierRow {
            priority,
            rules: rules.into_iter().map(|r| r.action.clone()).collect(),
        })
        .collect();

    if json {
        return print_json(&tiers);
    }

    print_table(
        &["PRIORITY", "RULES"],
        tiers
            .into_iter()
            .map(|t| vec![t.priority.to_string(), t.rules.join(", ")])
            .collect(),
    );
    println!(
        "\n{} rule(s) ok against {} action(s).",
        orchestrator.rule_count(),
        registry.len()
    );
    Ok(())
}
