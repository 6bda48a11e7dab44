//! Bulk registration of declarative actions from a directory.
//!
//! Each `*.yaml`, `*.yml` or `*.json` file directly inside the directory is
//! one [`ActionDefinition`]; its file stem becomes the action id. Files are
//! registered in sorted filename order so duplicate ids (`A.yaml` next to
//! `A.json`) fail deterministically.

use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::builtin::ActionDefinition;
use crate::error::{Result, RuleflowError};
use crate::registry::ActionRegistry;

const DEFINITION_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

static ACTION_ID_RE: OnceLock<Regex> = OnceLock::new();

fn action_id_re() -> &'static Regex {
    ACTION_ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.\-]*$").unwrap())
}

pub fn validate_action_id(id: &str) -> Result<()> {
    if id.len() > 128 || !action_id_re().is_match(id) {
        return Err(RuleflowError::InvalidActionId(id.to_string()));
    }
    Ok(())
}

/// Definition files in `dir`, sorted by filename.
pub fn definition_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if DEFINITION_EXTENSIONS.contains(&ext) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// One definition file registered by [`load_dir`].
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredAction {
    pub id: String,
    pub path: PathBuf,
    pub definition: ActionDefinition,
}

/// Register every definition in `dir`. Returns what was registered, in
/// filename order.
pub fn load_dir(registry: &mut ActionRegistry<Value>, dir: &Path) -> Result<Vec<DiscoveredAction>> {
    let mut discovered = Vec::new();
    for path in definition_files(dir)? {
        let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            return Err(RuleflowError::InvalidActionId(path.display().to_string()));
        };
        validate_action_id(&id)?;
        let definition = ActionDefinition::load(&path)?;
        registry.register(id.clone(), definition.clone().into_factory())?;
        tracing::debug!(action = %id, path = %path.display(), "discovered action");
        discovered.push(DiscoveredAction {
            id,
            path,
            definition,
        });
    }
    Ok(discovered)
}
