//! Session saver: finalize the active session under an optional name,
//! then restart capture with the configuration the markers recorded.

use anyhow::Result;

use crate::config::HostConfig;
use crate::core::{start, stop};
use crate::session;

pub fn run(config: &HostConfig, name: Option<&str>) -> Result<()> {
    let Some(active) = session::load_active(&config.log_root) else {
        eprintln!("Warning: no active capture session to save");
        return Ok(());
    };

    // Capture the restart configuration before finalization clears it
    let system = active.system.clone();
    let interface = active.interface.clone();

    // Post-processing must not block the restart
    stop::finalize(config, name, true)?;

    start::run(config, Some(system), Some(interface))
}
