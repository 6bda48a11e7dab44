use crate::error::Result;
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// A crash mid-write leaves the previous file intact.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read a JSON or YAML document (chosen by extension) as a JSON value.
pub fn read_document(path: &Path) -> Result<Value> {
    let data = std::fs::read_to_string(path)?;
    let value = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&data)?,
        _ => serde_yaml::from_str(&data)?,
    };
    Ok(value)
}

/// Pretty-print `value` as JSON into `path`, atomically.
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    let mut data = serde_json::to_vec_pretty(value)?;
    data.push(b'\n');
    atomic_write(path, &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/nested/state.json");
        atomic_write(&path, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn atomic_write_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "old").unwrap();
        atomic_write(&path, b"new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn read_document_accepts_yaml_and_json() {
        let dir = TempDir::new().unwrap();
        let yaml = dir.path().join("state.yaml");
        std::fs::write(&yaml, "alpha: 32\nbravo: lorem\n").unwrap();
        assert_eq!(
            read_document(&yaml).unwrap(),
            json!({ "alpha": 32, "bravo": "lorem" })
        );

        let js = dir.path().join("state.json");
        std::fs::write(&js, r#"{ "msg": "A" }"#).unwrap();
        assert_eq!(read_document(&js).unwrap(), json!({ "msg": "A" }));
    }

    #[test]
    fn write_json_is_readable_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("final.json");
        write_json(&path, &json!({ "msg": "ABC" })).unwrap();
        assert_eq!(read_document(&path).unwrap(), json!({ "msg": "ABC" }));
    }
}
