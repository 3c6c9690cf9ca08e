//! Spawning and signaling the external capture tool.
//!
//! The tool runs fully detached (own session, stdio closed, stderr into
//! the session's capture.log) and is tracked through a pid file next to
//! its output. Nothing here understands the capture format.

use anyhow::{Context, Result, bail};
use std::fs::{self, File};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use std::{env, thread};

use crate::config::HostConfig;

pub const PID_FILE: &str = "capture.pid";
pub const LOG_FILE: &str = "capture.log";

/// Rotated output pattern handed to the capture tool; the strftime fields
/// keep file names unique and sortable.
pub const OUTPUT_PATTERN: &str = "capture-%Y%m%d-%H%M%S.pcap";

/// How long the starter waits for the tool to report it is listening.
pub const START_GRACE: Duration = Duration::from_secs(2);

const STOP_GRACE: Duration = Duration::from_secs(3);
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Check that an executable can be invoked: either an explicit path that
/// exists or a name found on PATH.
pub fn binary_on_path(bin: &str) -> bool {
    let path = Path::new(bin);
    if path.components().count() > 1 {
        return path.is_file();
    }
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|p| p.join(bin).is_file()))
        .unwrap_or(false)
}

/// Command line for the capture tool: interface, rotation interval,
/// output pattern, and the post-rotation hook.
pub fn build_capture_args(config: &HostConfig, interface: &str, dir: &Path) -> Vec<String> {
    vec![
        "-i".to_string(),
        interface.to_string(),
        "-G".to_string(),
        config.rotate_secs.to_string(),
        "-w".to_string(),
        dir.join(OUTPUT_PATTERN).to_string_lossy().into_owned(),
        "-z".to_string(),
        config.postprocess_bin.clone(),
    ]
}

/// Launch the capture tool detached in its own session, with stderr going
/// to the session's capture.log. Records the pid in capture.pid and
/// returns it.
pub fn spawn_capture(config: &HostConfig, interface: &str, dir: &Path) -> Result<u32> {
    use std::os::unix::process::CommandExt;

    let log_path = dir.join(LOG_FILE);
    let log = File::create(&log_path)
        .with_context(|| format!("failed to create {}", log_path.display()))?;

    let args = build_capture_args(config, interface, dir);
    tracing::debug!(bin = %config.capture_bin, ?args, "spawning capture tool");

    let mut command = Command::new(&config.capture_bin);
    command
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::from(log));

    // Detach into a new session so the tool outlives this invocation
    unsafe {
        command.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    let child = command
        .spawn()
        .with_context(|| format!("failed to start {}", config.capture_bin))?;
    let pid = child.id();

    fs::write(dir.join(PID_FILE), pid.to_string())
        .with_context(|| format!("failed to write {}", PID_FILE))?;

    // The child manages itself from here
    std::mem::forget(child);

    Ok(pid)
}

/// Poll the capture log for the tool's listening confirmation until the
/// grace period runs out.
pub fn wait_for_listening(log_path: &Path, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    loop {
        if confirmed_listening(log_path) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// True once the capture tool has reported that it is listening.
pub fn confirmed_listening(log_path: &Path) -> bool {
    fs::read_to_string(log_path)
        .map(|log| log.contains("listening on"))
        .unwrap_or(false)
}

pub fn read_pid(dir: &Path) -> Option<u32> {
    fs::read_to_string(dir.join(PID_FILE))
        .ok()?
        .trim()
        .parse()
        .ok()
}

pub fn process_alive(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

fn send_signal(pid: u32, signal: i32) -> bool {
    unsafe { libc::kill(pid as i32, signal) == 0 }
}

/// Stop the capture process recorded in a session directory: SIGTERM,
/// a short grace wait, then SIGKILL as a last resort.
pub fn stop_session_capture(dir: &Path) -> Result<()> {
    let Some(pid) = read_pid(dir) else {
        bail!("no readable {} in {}", PID_FILE, dir.display());
    };

    if !process_alive(pid) {
        eprintln!("Warning: capture process {} already exited", pid);
        return Ok(());
    }

    if !send_signal(pid, libc::SIGTERM) {
        bail!("failed to signal capture process {}", pid);
    }

    let deadline = Instant::now() + STOP_GRACE;
    while process_alive(pid) {
        if Instant::now() >= deadline {
            eprintln!("Warning: capture process {} ignored SIGTERM, killing", pid);
            send_signal(pid, libc::SIGKILL);
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    Ok(())
}

/// Last-ditch stop when no session state is left to read a pid from.
pub fn signal_capture_by_name(bin: &str) -> bool {
    let name = Path::new(bin)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| bin.to_string());

    Command::new("pkill")
        .args(["-x", &name])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
