use crate::error::{Result, RuleflowError};
use crate::hooks::TieBreak;
use crate::orchestrator::RunOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "ruleflow.yaml";

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Settings read from `ruleflow.yaml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory of declarative action definitions, relative to the config
    /// file when not absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions_dir: Option<PathBuf>,
    /// Opt-in guard against rule sets that never settle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_firings: Option<u64>,
    #[serde(default)]
    pub tiebreak: TieBreak,
}

impl EngineConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let mut cfg: EngineConfig = serde_yaml::from_str(&data)?;
        if let (Some(dir), Some(base)) = (cfg.actions_dir.as_ref(), path.parent()) {
            if dir.is_relative() {
                cfg.actions_dir = Some(base.join(dir));
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_firings == Some(0) {
            return Err(RuleflowError::InvalidConfig(
                "max_firings must be at least 1 (omit it to disable the limit)".into(),
            ));
        }
        Ok(())
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            max_firings: self.max_firings,
        }
    }
}

/// Walk upward from `start` looking for `ruleflow.yaml`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}
