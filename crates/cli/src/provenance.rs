//! Provenance records written next to every table the CLI produces.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Command;

/// What produced a table: command, parameters and row count.
pub struct Sidecar<'a> {
    command: &'static str,
    table: &'a Path,
    rows: usize,
    params: Value,
}

impl<'a> Sidecar<'a> {
    pub fn new(command: &'static str, table: &'a Path, rows: usize, params: Value) -> Self {
        Self {
            command,
            table,
            rows,
            params,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "code_rev": code_rev(),
            "bendtrack": bendtrack::VERSION,
            "command": self.command,
            "table": self.table.to_string_lossy(),
            "rows": self.rows,
            "params": self.params
        })
    }

    /// Write the record to `sidecar_path(table)` and return that path.
    pub fn write(&self) -> Result<PathBuf> {
        let path = sidecar_path(self.table);
        std::fs::write(&path, serde_json::to_vec_pretty(&self.to_json())?)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::debug!(path = %path.display(), "wrote provenance");
        Ok(path)
    }
}

/// `runs/sb.csv` → `runs/sb.provenance.json`.
pub fn sidecar_path(table: &Path) -> PathBuf {
    table.with_extension("provenance.json")
}

/// Commit of the running code: `GIT_COMMIT` if set, else `git rev-parse HEAD`.
pub fn code_rev() -> String {
    std::env::var("GIT_COMMIT")
        .ok()
        .filter(|rev| !rev.is_empty())
        .or_else(git_head)
        .unwrap_or_else(|| "unknown".to_string())
}

fn git_head() -> Option<String> {
    let output = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let rev = String::from_utf8(output.stdout).ok()?;
    Some(rev.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sidecar_sits_next_to_the_table() {
        assert_eq!(
            sidecar_path(Path::new("runs/sb.csv")),
            Path::new("runs/sb.provenance.json")
        );
        assert_eq!(
            sidecar_path(Path::new("runs/track")),
            Path::new("runs/track.provenance.json")
        );
    }

    #[test]
    fn record_carries_command_rows_and_params() {
        let dir = tempdir().unwrap();
        let table = dir.path().join("track.csv");
        std::fs::write(&table, "s,x\n").unwrap();
        let path = Sidecar::new("track", &table, 42, json!({"length": 1.0}))
            .write()
            .unwrap();
        assert_eq!(path, dir.path().join("track.provenance.json"));
        let parsed: Value = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(parsed["command"], "track");
        assert_eq!(parsed["rows"], 42);
        assert_eq!(parsed["params"]["length"], 1.0);
        assert_eq!(parsed["table"], table.to_string_lossy().as_ref());
        assert_eq!(parsed["bendtrack"], bendtrack::VERSION);
    }
}
