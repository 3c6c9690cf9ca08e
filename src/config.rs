//! Host configuration: file discovery, TOML parsing, environment overlay.
//!
//! Config files are loaded in order (system, user, local), later files
//! overriding earlier ones field by field. Environment variables:
//! - `CAPCTL_LOG_ROOT`: base directory for session directories
//! - `CAPCTL_CAPTURE_BIN`: capture tool executable
//! - `CAPCTL_POSTPROCESS_BIN`: post-processing executable
//! - `CAPCTL_ROTATE_SECS`: capture file rotation interval

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Built-in last-resort defaults for the starter's input resolution.
pub const FALLBACK_SYSTEM: &str = "unassigned";
pub const FALLBACK_INTERFACE: &str = "eth0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Host configuration for capture session management.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Base directory holding per-system session trees.
    pub log_root: PathBuf,

    /// Default target system when neither CLI nor environment supplies one.
    pub default_system: Option<String>,

    /// Default capture interface when neither CLI nor environment supplies one.
    pub default_interface: Option<String>,

    /// Recognized system identifiers, used by the system-name validator.
    pub systems: Vec<String>,

    /// Capture tool executable (name on PATH or absolute path).
    pub capture_bin: String,

    /// Post-processing executable, also used as the post-rotation hook.
    pub postprocess_bin: String,

    /// Format descriptor file copied into each new session directory.
    pub format_spec: Option<PathBuf>,

    /// Capture file rotation interval in seconds.
    pub rotate_secs: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_root: default_log_root(),
            default_system: None,
            default_interface: None,
            systems: Vec::new(),
            capture_bin: "tcpdump".to_string(),
            postprocess_bin: "pcap-convert".to_string(),
            format_spec: None,
            rotate_secs: 300,
        }
    }
}

/// Default log root (~/captures).
fn default_log_root() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join("captures"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/capctl"))
}

/// One config file's worth of overrides; every field optional so that
/// later files only replace what they actually set.
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    log_root: Option<PathBuf>,
    default_system: Option<String>,
    default_interface: Option<String>,
    systems: Option<Vec<String>>,
    capture_bin: Option<String>,
    postprocess_bin: Option<String>,
    format_spec: Option<PathBuf>,
    rotate_secs: Option<u64>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local). Only returns files
/// that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/capctl/config.toml");
    if system.exists() {
        files.push(system);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join("capctl/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    let local = PathBuf::from("capctl.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

impl HostConfig {
    /// Load configuration from the discovered files plus environment
    /// overrides. A host with no config files gets the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_files(&discover_config_files())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load and merge the given config files in order.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for path in files {
            let partial = load_partial(path)?;
            config.apply_partial(partial);
            tracing::debug!(path = %path.display(), "applied config file");
        }
        Ok(config)
    }

    fn apply_partial(&mut self, p: PartialConfig) {
        if let Some(v) = p.log_root {
            self.log_root = v;
        }
        if let Some(v) = p.default_system {
            self.default_system = Some(v);
        }
        if let Some(v) = p.default_interface {
            self.default_interface = Some(v);
        }
        if let Some(v) = p.systems {
            self.systems = v;
        }
        if let Some(v) = p.capture_bin {
            self.capture_bin = v;
        }
        if let Some(v) = p.postprocess_bin {
            self.postprocess_bin = v;
        }
        if let Some(v) = p.format_spec {
            self.format_spec = Some(v);
        }
        if let Some(v) = p.rotate_secs {
            self.rotate_secs = v;
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("CAPCTL_LOG_ROOT") {
            self.log_root = PathBuf::from(v);
        }
        if let Ok(v) = env::var("CAPCTL_CAPTURE_BIN") {
            self.capture_bin = v;
        }
        if let Ok(v) = env::var("CAPCTL_POSTPROCESS_BIN") {
            self.postprocess_bin = v;
        }
        if let Ok(v) = env::var("CAPCTL_ROTATE_SECS") {
            if let Ok(secs) = v.parse() {
                self.rotate_secs = secs;
            }
        }
    }
}

fn load_partial(path: &Path) -> Result<PartialConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Resolve the target system for a new session: CLI argument, then
/// environment, then config default, then the built-in fallback.
pub fn resolve_system(cli: Option<String>, config: &HostConfig) -> String {
    resolve(
        cli,
        env::var("CAPCTL_SYSTEM").ok(),
        config.default_system.clone(),
        FALLBACK_SYSTEM,
    )
}

/// Resolve the capture interface with the same priority order.
pub fn resolve_interface(cli: Option<String>, config: &HostConfig) -> String {
    resolve(
        cli,
        env::var("CAPCTL_INTERFACE").ok(),
        config.default_interface.clone(),
        FALLBACK_INTERFACE,
    )
}

fn resolve(
    cli: Option<String>,
    env_val: Option<String>,
    config_val: Option<String>,
    fallback: &str,
) -> String {
    cli.or(env_val)
        .or(config_val)
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.capture_bin, "tcpdump");
        assert_eq!(config.rotate_secs, 300);
        assert!(config.systems.is_empty());
        assert!(config.default_interface.is_none());
    }

    #[test]
    fn test_parse_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capctl.toml");
        std::fs::write(
            &path,
            r#"
log_root = "/data/captures"
default_system = "lab-a"
default_interface = "enp3s0"
systems = ["lab-a", "lab-b", "edge-1"]
capture_bin = "/usr/sbin/tcpdump"
postprocess_bin = "pcap-convert"
format_spec = "/usr/share/capctl/FORMAT.md"
rotate_secs = 120
"#,
        )
        .unwrap();

        let config = HostConfig::load_from_files(&[path]).unwrap();
        assert_eq!(config.log_root, PathBuf::from("/data/captures"));
        assert_eq!(config.default_system.as_deref(), Some("lab-a"));
        assert_eq!(config.default_interface.as_deref(), Some("enp3s0"));
        assert_eq!(config.systems.len(), 3);
        assert_eq!(config.capture_bin, "/usr/sbin/tcpdump");
        assert_eq!(config.rotate_secs, 120);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capctl.toml");
        std::fs::write(&path, "default_interface = \"wlan0\"\n").unwrap();

        let config = HostConfig::load_from_files(&[path]).unwrap();
        assert_eq!(config.default_interface.as_deref(), Some("wlan0"));
        assert_eq!(config.capture_bin, "tcpdump");
        assert_eq!(config.rotate_secs, 300);
    }

    #[test]
    fn test_later_file_overrides_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let system = dir.path().join("system.toml");
        let local = dir.path().join("local.toml");
        std::fs::write(&system, "rotate_secs = 60\ndefault_system = \"lab-a\"\n").unwrap();
        std::fs::write(&local, "rotate_secs = 600\n").unwrap();

        let config = HostConfig::load_from_files(&[system, local]).unwrap();
        assert_eq!(config.rotate_secs, 600);
        // Untouched by the local file
        assert_eq!(config.default_system.as_deref(), Some("lab-a"));
    }

    #[test]
    fn test_parse_error_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "rotate_secs = \"not a number").unwrap();

        let err = HostConfig::load_from_files(&[path.clone()]).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_resolve_priority() {
        assert_eq!(
            resolve(
                Some("cli".into()),
                Some("env".into()),
                Some("cfg".into()),
                "fallback"
            ),
            "cli"
        );
        assert_eq!(
            resolve(None, Some("env".into()), Some("cfg".into()), "fallback"),
            "env"
        );
        assert_eq!(resolve(None, None, Some("cfg".into()), "fallback"), "cfg");
        assert_eq!(resolve(None, None, None, "fallback"), "fallback");
    }
}
