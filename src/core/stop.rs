//! Session stopper: signal the capture tool, finalize the session
//! directory and symlinks, hand the newest capture file to the external
//! post-processor.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::HostConfig;
use crate::{capture, session};

pub fn run(config: &HostConfig, background: bool) -> Result<()> {
    finalize(config, None, background)
}

/// Stop the capture and finalize the current session. `tag` renames the
/// directory (the saver passes the user-supplied name through here);
/// `background` detaches the post-processing step at reduced priority.
pub fn finalize(config: &HostConfig, tag: Option<&str>, background: bool) -> Result<()> {
    let Some(active) = session::load_active(&config.log_root) else {
        eprintln!("Warning: no active capture session");
        if capture::signal_capture_by_name(&config.capture_bin) {
            println!("Signaled stray {} process", config.capture_bin);
        }
        return Ok(());
    };

    // Finalization continues even when the process is already gone
    if let Err(e) = capture::stop_session_capture(&active.dir) {
        eprintln!("Warning: {:#}", e);
    }

    let sysroot = session::system_root(&config.log_root, &active.system);
    session::remove_link(&session::current_link(&sysroot))
        .context("failed to remove current symlink")?;

    let finalized = session::tag_session_dir(&active.dir, tag)
        .with_context(|| format!("failed to tag {}", active.dir.display()))?;
    let final_name = finalized
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    session::point_link(&session::last_link(&sysroot), &final_name)
        .context("failed to update last symlink")?;
    session::clear_markers(&config.log_root);

    println!("Session finalized: {}", finalized.display());

    match session::latest_capture_file(&finalized) {
        Some(file) => postprocess(config, &file, tag, background),
        None => {
            eprintln!(
                "Warning: no capture files in {}, skipping post-processing",
                finalized.display()
            );
            Ok(())
        }
    }
}

fn postprocess(config: &HostConfig, file: &Path, tag: Option<&str>, background: bool) -> Result<()> {
    if background {
        use std::os::unix::process::CommandExt;

        let mut command = Command::new("nice");
        command.args(["-n", "10"]).arg(&config.postprocess_bin).arg(file);
        if let Some(t) = tag {
            command.arg(t);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        unsafe {
            command.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }

        let child = command
            .spawn()
            .with_context(|| format!("failed to start {}", config.postprocess_bin))?;
        println!(
            "Post-processing {} in background (pid {})",
            file.display(),
            child.id()
        );
        std::mem::forget(child);
        Ok(())
    } else {
        let mut command = Command::new(&config.postprocess_bin);
        command.arg(file);
        if let Some(t) = tag {
            command.arg(t);
        }

        let status = command
            .status()
            .with_context(|| format!("failed to run {}", config.postprocess_bin))?;
        if !status.success() {
            bail!("post-processing of {} failed: {}", file.display(), status);
        }

        println!("Post-processing complete: {}", file.display());
        Ok(())
    }
}
