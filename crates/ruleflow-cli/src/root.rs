use anyhow::Context;
use ruleflow_core::config::{find_config, EngineConfig};
use std::path::{Path, PathBuf};

/// Engine settings plus where they came from.
#[derive(Debug, Default)]
pub struct Settings {
    pub source: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl Settings {
    /// Pick the actions directory: flag first, then config.
    pub fn actions_dir(&self, flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
        flag.or_else(|| self.engine.actions_dir.clone()).context(
            "no actions directory: pass --actions or set actions_dir in ruleflow.yaml",
        )
    }
}

/// Resolve the engine config.
///
/// Priority:
/// 1. `--config` flag / `RULEFLOW_CONFIG` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `ruleflow.yaml`
/// 3. Fall back to the defaults
pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<Settings> {
    let source = match explicit {
        Some(p) => {
            anyhow::ensure!(p.is_file(), "config file not found: {}", p.display());
            Some(p.to_path_buf())
        }
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            find_config(&cwd)
        }
    };

    let engine = match &source {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    Ok(Settings { source, engine })
}
