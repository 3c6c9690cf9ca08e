use clap::{Parser, Subcommand};

/// Capctl - packet capture session manager
#[derive(Parser, Debug)]
#[command(name = "capctl", about = "Start, save, and discard packet capture sessions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Begin a new capture session
    Start {
        /// Target system identifier.
        /// Falls back to CAPCTL_SYSTEM, then the host config, then a built-in default.
        system: Option<String>,

        /// Network interface to capture on.
        /// Falls back to CAPCTL_INTERFACE, then the host config, then a built-in default.
        interface: Option<String>,
    },

    /// Finalize the active session under an optional name, then restart capture
    Save {
        /// Tag appended to the finalized session directory
        name: Option<String>,
    },

    /// Delete the active session after confirmation, then restart capture
    Discard,

    /// Terminate capture, finalize the session, and run post-processing
    Stop {
        /// Run the post-processing step detached at reduced priority
        #[arg(long)]
        background: bool,
    },
}
