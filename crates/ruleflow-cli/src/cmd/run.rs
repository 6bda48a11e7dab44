use crate::output::print_json;
use crate::root::Settings;
use anyhow::Context;
use ruleflow_core::{
    io, Hooks, KnowledgeBase, Orchestrator, RunOptions, RunReport, TieBreak, TracingHooks,
};
use serde_json::{json, Value};
use std::path::PathBuf;

pub struct RunArgs {
    pub rules: PathBuf,
    pub state: Option<PathBuf>,
    pub actions: Option<PathBuf>,
    pub tiebreak: Option<TieBreak>,
    pub max_firings: Option<u64>,
    pub out: Option<PathBuf>,
    pub trace: bool,
}

pub fn run(settings: &Settings, args: RunArgs, json: bool) -> anyhow::Result<()> {
    let (registry, _) = super::load_registry(&settings.actions_dir(args.actions)?)?;
    let kb = KnowledgeBase::load(&args.rules)
        .with_context(|| format!("failed to load rules from {}", args.rules.display()))?;
    let start = match &args.state {
        Some(path) => io::read_document(path)
            .with_context(|| format!("failed to read state {}", path.display()))?,
        None => json!({}),
    };

    let policy = args.tiebreak.unwrap_or(settings.engine.tiebreak);
    let mut options = settings.engine.run_options();
    if let Some(limit) = args.max_firings {
        anyhow::ensure!(limit > 0, "--max-firings must be at least 1");
        options = options.with_max_firings(limit);
    }

    let orchestrator = Orchestrator::new(&kb, &registry).context("knowledge base rejected")?;

    let report = if args.trace {
        let mut hooks = TracingHooks::new(policy);
        block_on_run(orchestrator, start, &mut hooks, options)?
    } else {
        let mut hooks = policy;
        block_on_run(orchestrator, start, &mut hooks, options)?
    };

    if let Some(out) = &args.out {
        io::write_json(out, &report.state)
            .with_context(|| format!("failed to write {}", out.display()))?;
    }

    if json {
        return print_json(&serde_json::json!({
            "run_id": report.run_id.to_string(),
            "firings": report.firings,
            "passes": report.passes,
            "started_at": report.started_at,
            "finished_at": report.finished_at,
            "state": report.state,
        }));
    }

    println!("{}", serde_json::to_string_pretty(&report.state)?);
    eprintln!(
        "{} firing(s) over {} pass(es) in {} ms",
        report.firings,
        report.passes,
        (report.finished_at - report.started_at).num_milliseconds()
    );
    Ok(())
}

fn block_on_run<H>(
    orchestrator: Orchestrator<Value>,
    start: Value,
    hooks: &mut H,
    options: RunOptions,
) -> anyhow::Result<RunReport<Value>>
where
    H: Hooks<Value>,
{
    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let report = rt
        .block_on(orchestrator.run_with(start, hooks, options))
        .context("run failed")?;
    Ok(report)
}
