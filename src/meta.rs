//! Session metadata descriptor, written as `session.json` into every new
//! session directory: who started the capture, where, on what interface,
//! and the exact tool revision (commit plus working-tree diff) in use.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

pub const META_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    pub author: String,
    pub host: String,
    pub system: String,
    pub interface: String,
    pub started_at: DateTime<Local>,
    /// Source revision of the capture tooling, "unknown" outside a checkout.
    pub revision: String,
    /// Uncommitted working-tree changes at start time, empty when clean.
    pub diff: String,
}

impl SessionMeta {
    /// Gather metadata for a session starting now.
    pub fn collect(system: &str, interface: &str) -> Self {
        Self {
            author: author(),
            host: hostname(),
            system: system.to_string(),
            interface: interface.to_string(),
            started_at: Local::now(),
            revision: git_revision().unwrap_or_else(|| "unknown".to_string()),
            diff: git_diff().unwrap_or_default(),
        }
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        let path = dir.join(META_FILE);
        let json = serde_json::to_string_pretty(self).context("failed to serialize metadata")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

fn author() -> String {
    std::env::var("USER").unwrap_or_else(|_| "unknown".to_string())
}

fn hostname() -> String {
    match Command::new("hostname").output() {
        Ok(output) => String::from_utf8_lossy(&output.stdout).trim().to_string(),
        Err(_) => "unknown-host".to_string(),
    }
}

/// Current commit of the working directory, if it is a git checkout.
fn git_revision() -> Option<String> {
    let output = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
    if !output.status.success() {
        tracing::debug!("git rev-parse failed; recording revision as unknown");
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Working-tree diff against HEAD, if available.
fn git_diff() -> Option<String> {
    let output = Command::new("git").args(["diff", "HEAD"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionMeta {
        SessionMeta {
            author: "op".to_string(),
            host: "bench-7".to_string(),
            system: "lab-a".to_string(),
            interface: "eth0".to_string(),
            started_at: Local::now(),
            revision: "abc123".to_string(),
            diff: String::new(),
        }
    }

    #[test]
    fn test_serde_roundtrip() {
        let meta = sample();
        let json = serde_json::to_string(&meta).unwrap();
        let restored: SessionMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.author, "op");
        assert_eq!(restored.system, "lab-a");
        assert_eq!(restored.started_at, meta.started_at);
    }

    #[test]
    fn test_write_creates_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        sample().write(dir.path()).unwrap();

        let contents = std::fs::read_to_string(dir.path().join(META_FILE)).unwrap();
        let restored: SessionMeta = serde_json::from_str(&contents).unwrap();
        assert_eq!(restored.host, "bench-7");
    }

    #[test]
    fn test_collect_degrades_outside_checkout() {
        // Whatever the environment, collect must produce a descriptor
        let meta = SessionMeta::collect("lab-a", "eth0");
        assert!(!meta.revision.is_empty());
        assert!(!meta.host.is_empty());
    }
}
