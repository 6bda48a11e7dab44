use crate::output::{print_json, print_table};
use crate::root::Settings;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ActionRow {
    id: String,
    kind: &'static str,
    path: String,
}

pub fn run(settings: &Settings, actions: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let dir = settings.actions_dir(actions)?;
    // Registering surfaces duplicate and malformed ids before anything prints.
    let (_, discovered) = super::load_registry(&dir)?;

    let rows: Vec<ActionRow> = discovered
        .into_iter()
        .map(|d| ActionRow {
            kind: d.definition.effect.kind(),
            path: d.path.display().to_string(),
            id: d.id,
        })
        .collect();

    if json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No actions in {}.", dir.display());
        return Ok(());
    }

    print_table(
        &["ACTION", "KIND", "FILE"],
        rows.into_iter()
            .map(|r| vec![r.id, r.kind.to_string(), r.path])
            .collect(),
    );
    Ok(())
}
