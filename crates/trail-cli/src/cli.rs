use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trail_core::OutputFormat;

#[derive(Parser)]
#[command(name = "trail", version)]
#[command(about = "Trail: record, share and resolve debugging sessions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a new debugging session and make it active
    Start {
        /// Replace an active session that has not ended
        #[arg(long)]
        force: bool,
    },

    /// Show the active session
    Which,

    /// Detect errors and look up prior resolutions
    Lookup {
        /// File to analyze (defaults to modified files in the working tree)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Error message to look up when detection finds nothing
        #[arg(long)]
        error: Option<String>,
    },

    /// Make an existing session active, fetching it from the remote if needed
    Checkout {
        /// Session ID
        id: String,
    },

    /// Record how the active session's problem was resolved
    Resolve {
        /// Resolution summary
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Ask an AI backend for help with an error
    Ai {
        /// Error message to explain
        #[arg(long)]
        error: Option<String>,

        /// File to analyze
        #[arg(long)]
        file: Option<PathBuf>,

        /// Local model name (defaults to settings)
        #[arg(short, long)]
        model: Option<String>,

        /// Skip the local backend and use the remote service
        #[arg(long)]
        cloud: bool,
    },

    /// Start or stop recording the active session
    Record {
        #[command(subcommand)]
        cmd: RecordCommands,
    },

    /// Print a session's recorded history
    Replay {
        /// Session ID (defaults to the active session)
        id: Option<String>,
    },

    /// End the active session
    End,

    /// Upload the active session to the remote service
    Push,

    /// Run a command and record it in the active session
    Exec {
        /// Command and arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// List local sessions
    List,

    /// Show/manage configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum RecordCommands {
    /// Begin (or resume) recording
    Start,
    /// Stop recording and capture working-tree diffs
    Stop,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Store the API token in the user config
    SetToken {
        token: String,
    },
    /// Remove the stored API token
    ClearToken,
    /// Write a commented settings.toml template if none exists
    Init,
}
