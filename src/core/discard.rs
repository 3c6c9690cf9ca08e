//! Session discarder: throw away the active session after an explicit
//! confirmation, then restart capture with the same configuration.

use anyhow::{Context, Result};
use std::fs;

use crate::config::HostConfig;
use crate::core::start;
use crate::ui::prompt;
use crate::{capture, session};

pub fn run(config: &HostConfig) -> Result<()> {
    let Some(active) = session::load_active(&config.log_root) else {
        eprintln!("Warning: no active capture session to discard");
        return Ok(());
    };

    let name = active
        .dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let elapsed = session::elapsed_since_start(&name)
        .map(session::format_elapsed)
        .unwrap_or_else(|| "unknown".to_string());

    if !prompt::confirm(&format!("Discard session {} ({} elapsed)?", name, elapsed)) {
        println!("Keeping session, capture continues");
        return Ok(());
    }

    if let Err(e) = capture::stop_session_capture(&active.dir) {
        eprintln!("Warning: {:#}", e);
    }

    let sysroot = session::system_root(&config.log_root, &active.system);
    session::remove_link(&session::current_link(&sysroot))
        .context("failed to remove current symlink")?;
    fs::remove_dir_all(&active.dir)
        .with_context(|| format!("failed to delete {}", active.dir.display()))?;
    session::clear_markers(&config.log_root);

    println!("Discarded session {}", name);

    start::run(config, Some(active.system), Some(active.interface))
}
