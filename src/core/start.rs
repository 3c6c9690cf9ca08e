//! Session starter: resolve inputs, lay down the session directory and
//! its bookkeeping, launch the capture tool, confirm it is listening.

use anyhow::{Context, Result, bail};
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use crate::config::{self, HostConfig};
use crate::ui::device;
use crate::{capture, meta, session, sysname};

pub fn run(config: &HostConfig, system: Option<String>, interface: Option<String>) -> Result<()> {
    let system = config::resolve_system(system, config);
    let interface = config::resolve_interface(interface, config);

    sysname::validate_system_name(&system, &config.systems)?;
    device::warn_if_unknown_interface(&interface);

    for bin in [config.capture_bin.as_str(), config.postprocess_bin.as_str()] {
        if !capture::binary_on_path(bin) {
            bail!("required binary '{}' not found", bin);
        }
    }

    if let Some(active) = session::load_active(&config.log_root) {
        bail!(
            "a capture session is already active in {} (save, stop, or discard it first)",
            active.dir.display()
        );
    }

    let name = session::new_session_name();
    let dir = session::create_session_dir(&config.log_root, &system, &name).with_context(|| {
        format!(
            "failed to create session directory under {}",
            config.log_root.display()
        )
    })?;
    session::write_markers(&config.log_root, &system, &interface)
        .context("failed to write marker files")?;

    meta::SessionMeta::collect(&system, &interface).write(&dir)?;
    copy_format_spec(config, &dir);

    let pid = capture::spawn_capture(config, &interface, &dir)?;
    println!(
        "Capturing on {} for system {} (pid {})",
        interface, system, pid
    );
    println!("  Session: {}", dir.display());

    let log = dir.join(capture::LOG_FILE);
    if !capture::wait_for_listening(&log, capture::START_GRACE) {
        bail!(
            "capture tool did not confirm it is listening, check {}",
            log.display()
        );
    }

    println!("Capture confirmed listening on {}", interface);
    Ok(())
}

/// Copy the configured format descriptor into the session directory.
/// A missing descriptor degrades to a warning.
fn copy_format_spec(config: &HostConfig, dir: &Path) {
    match &config.format_spec {
        Some(src) if src.is_file() => {
            let file_name = src.file_name().unwrap_or_else(|| OsStr::new("FORMAT.md"));
            if let Err(e) = fs::copy(src, dir.join(file_name)) {
                eprintln!("Warning: failed to copy format descriptor: {}", e);
            }
        }
        Some(src) => {
            eprintln!(
                "Warning: format descriptor {} not found, session will lack one",
                src.display()
            );
        }
        None => {
            eprintln!("Warning: no format descriptor configured, session will lack one");
        }
    }
}
