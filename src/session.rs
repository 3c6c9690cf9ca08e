//! On-disk session model: timestamped directories, the current/last
//! symlinks, and the marker files that let save/discard restart capture
//! with the same configuration.
//!
//! Layout under the log root:
//!
//! ```text
//! <log_root>/active-system          marker, exists while a capture runs
//! <log_root>/active-interface       marker, exists while a capture runs
//! <log_root>/<system>/current       symlink to the in-progress session
//! <log_root>/<system>/last          symlink to the last finalized session
//! <log_root>/<system>/<timestamp>[_<tag>]/
//! ```

use chrono::{Local, NaiveDateTime};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const SESSION_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

// Rendered length of SESSION_TIME_FORMAT, e.g. "2026-08-06_10-30-00"
const SESSION_TIME_LEN: usize = 19;
pub const CURRENT_LINK: &str = "current";
pub const LAST_LINK: &str = "last";

const SYSTEM_MARKER: &str = "active-system";
const INTERFACE_MARKER: &str = "active-interface";

/// The session a capture is currently running in, reconstructed from the
/// marker files and the current symlink.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub system: String,
    pub interface: String,
    pub dir: PathBuf,
}

pub fn system_root(log_root: &Path, system: &str) -> PathBuf {
    log_root.join(system)
}

pub fn current_link(sysroot: &Path) -> PathBuf {
    sysroot.join(CURRENT_LINK)
}

pub fn last_link(sysroot: &Path) -> PathBuf {
    sysroot.join(LAST_LINK)
}

/// Directory name for a session starting now.
pub fn new_session_name() -> String {
    Local::now().format(SESSION_TIME_FORMAT).to_string()
}

/// Create a session directory under the system root and point the
/// current symlink at it.
pub fn create_session_dir(log_root: &Path, system: &str, name: &str) -> io::Result<PathBuf> {
    let sysroot = system_root(log_root, system);
    let dir = sysroot.join(name);
    fs::create_dir_all(&dir)?;
    point_link(&current_link(&sysroot), name)?;
    Ok(dir)
}

/// Replace `link` with a symlink to `target` (a name relative to the
/// link's own directory, so the tree stays relocatable).
pub fn point_link(link: &Path, target: &str) -> io::Result<()> {
    if fs::symlink_metadata(link).is_ok() {
        fs::remove_file(link)?;
    }
    std::os::unix::fs::symlink(target, link)
}

pub fn remove_link(link: &Path) -> io::Result<()> {
    if fs::symlink_metadata(link).is_ok() {
        fs::remove_file(link)?;
    }
    Ok(())
}

/// Resolve a symlink to the directory it names, if both exist.
pub fn resolve_link(link: &Path) -> Option<PathBuf> {
    let target = fs::read_link(link).ok()?;
    let resolved = if target.is_absolute() {
        target
    } else {
        link.parent()?.join(target)
    };
    resolved.is_dir().then_some(resolved)
}

pub fn write_markers(log_root: &Path, system: &str, interface: &str) -> io::Result<()> {
    fs::create_dir_all(log_root)?;
    fs::write(log_root.join(SYSTEM_MARKER), format!("{}\n", system))?;
    fs::write(log_root.join(INTERFACE_MARKER), format!("{}\n", interface))
}

/// Read the (system, interface) pair recorded at start. None unless both
/// markers are present.
pub fn read_markers(log_root: &Path) -> Option<(String, String)> {
    let system = fs::read_to_string(log_root.join(SYSTEM_MARKER)).ok()?;
    let interface = fs::read_to_string(log_root.join(INTERFACE_MARKER)).ok()?;
    Some((system.trim().to_string(), interface.trim().to_string()))
}

pub fn clear_markers(log_root: &Path) {
    let _ = fs::remove_file(log_root.join(SYSTEM_MARKER));
    let _ = fs::remove_file(log_root.join(INTERFACE_MARKER));
}

/// Reconstruct the active session, if any. Requires both markers and a
/// current symlink that resolves to a directory; anything less counts as
/// "no capture in progress".
pub fn load_active(log_root: &Path) -> Option<ActiveSession> {
    let (system, interface) = read_markers(log_root)?;
    let sysroot = system_root(log_root, &system);
    let dir = resolve_link(&current_link(&sysroot))?;
    Some(ActiveSession {
        system,
        interface,
        dir,
    })
}

/// Rename a finalized session directory with a `_<tag>` suffix, appending
/// separators until the name is free. Returns the (possibly unchanged)
/// directory path.
pub fn tag_session_dir(dir: &Path, tag: Option<&str>) -> io::Result<PathBuf> {
    let tag = match tag {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(dir.to_path_buf()),
    };

    let parent = dir.parent().unwrap_or_else(|| Path::new("."));
    let base = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut name = format!("{}_{}", base, tag);
    while parent.join(&name).exists() {
        name.push('_');
    }

    let target = parent.join(&name);
    fs::rename(dir, &target)?;
    Ok(target)
}

/// Parse the start time encoded in a session directory name. Tag suffixes
/// are ignored since the timestamp is a fixed-width prefix.
pub fn parse_start_time(name: &str) -> Option<NaiveDateTime> {
    let prefix = name.get(..SESSION_TIME_LEN)?;
    NaiveDateTime::parse_from_str(prefix, SESSION_TIME_FORMAT).ok()
}

/// Elapsed time since the session named `name` started.
pub fn elapsed_since_start(name: &str) -> Option<chrono::Duration> {
    let started = parse_start_time(name)?;
    Some(Local::now().naive_local() - started)
}

pub fn format_elapsed(d: chrono::Duration) -> String {
    let secs = d.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Most recent capture file in a session directory. Rotation embeds a
/// sortable timestamp in the file name, so the lexicographic maximum is
/// the newest.
pub fn latest_capture_file(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "pcap"))
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_session_dir_points_current() {
        let root = tempdir().unwrap();
        let dir = create_session_dir(root.path(), "lab-a", "2026-08-06_10-00-00").unwrap();
        assert!(dir.is_dir());

        let sysroot = system_root(root.path(), "lab-a");
        let resolved = resolve_link(&current_link(&sysroot)).unwrap();
        assert_eq!(resolved, dir);
    }

    #[test]
    fn test_point_link_replaces_existing() {
        let root = tempdir().unwrap();
        let sysroot = system_root(root.path(), "lab-a");
        fs::create_dir_all(sysroot.join("a")).unwrap();
        fs::create_dir_all(sysroot.join("b")).unwrap();

        let link = current_link(&sysroot);
        point_link(&link, "a").unwrap();
        point_link(&link, "b").unwrap();
        assert_eq!(resolve_link(&link).unwrap(), sysroot.join("b"));
    }

    #[test]
    fn test_markers_roundtrip() {
        let root = tempdir().unwrap();
        write_markers(root.path(), "edge-1", "enp3s0").unwrap();
        let (system, interface) = read_markers(root.path()).unwrap();
        assert_eq!(system, "edge-1");
        assert_eq!(interface, "enp3s0");

        clear_markers(root.path());
        assert!(read_markers(root.path()).is_none());
    }

    #[test]
    fn test_load_active_needs_all_pieces() {
        let root = tempdir().unwrap();
        assert!(load_active(root.path()).is_none());

        write_markers(root.path(), "lab-a", "eth0").unwrap();
        // Markers alone are not enough
        assert!(load_active(root.path()).is_none());

        let dir = create_session_dir(root.path(), "lab-a", "2026-08-06_10-00-00").unwrap();
        let active = load_active(root.path()).unwrap();
        assert_eq!(active.system, "lab-a");
        assert_eq!(active.interface, "eth0");
        assert_eq!(active.dir, dir);
    }

    #[test]
    fn test_tag_session_dir() {
        let root = tempdir().unwrap();
        let dir = root.path().join("2026-08-06_10-00-00");
        fs::create_dir_all(&dir).unwrap();

        let tagged = tag_session_dir(&dir, Some("baseline")).unwrap();
        assert_eq!(
            tagged.file_name().unwrap().to_str().unwrap(),
            "2026-08-06_10-00-00_baseline"
        );
        assert!(!dir.exists());
    }

    #[test]
    fn test_tag_session_dir_collision_appends_separator() {
        let root = tempdir().unwrap();
        let dir = root.path().join("2026-08-06_10-00-00");
        fs::create_dir_all(&dir).unwrap();
        fs::create_dir_all(root.path().join("2026-08-06_10-00-00_baseline")).unwrap();

        let tagged = tag_session_dir(&dir, Some("baseline")).unwrap();
        assert_eq!(
            tagged.file_name().unwrap().to_str().unwrap(),
            "2026-08-06_10-00-00_baseline_"
        );
    }

    #[test]
    fn test_tag_session_dir_none_is_noop() {
        let root = tempdir().unwrap();
        let dir = root.path().join("2026-08-06_10-00-00");
        fs::create_dir_all(&dir).unwrap();

        let unchanged = tag_session_dir(&dir, None).unwrap();
        assert_eq!(unchanged, dir);
        assert!(dir.exists());
    }

    #[test]
    fn test_parse_start_time() {
        let t = parse_start_time("2026-08-06_10-30-00").unwrap();
        assert_eq!(t.format("%H:%M:%S").to_string(), "10:30:00");

        // Tag suffix does not disturb the parse
        assert!(parse_start_time("2026-08-06_10-30-00_baseline").is_some());
        assert!(parse_start_time("not-a-timestamp").is_none());
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(chrono::Duration::seconds(0)), "00:00:00");
        assert_eq!(format_elapsed(chrono::Duration::seconds(3725)), "01:02:05");
        // Clock skew never renders negative
        assert_eq!(format_elapsed(chrono::Duration::seconds(-5)), "00:00:00");
    }

    #[test]
    fn test_latest_capture_file() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("capture-20260806-100000.pcap"), b"x").unwrap();
        fs::write(root.path().join("capture-20260806-101500.pcap"), b"x").unwrap();
        fs::write(root.path().join("session.json"), b"{}").unwrap();

        let latest = latest_capture_file(root.path()).unwrap();
        assert_eq!(
            latest.file_name().unwrap().to_str().unwrap(),
            "capture-20260806-101500.pcap"
        );
    }

    #[test]
    fn test_latest_capture_file_empty() {
        let root = tempdir().unwrap();
        assert!(latest_capture_file(root.path()).is_none());
    }
}
