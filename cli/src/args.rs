use clap::Parser;
use std::path::PathBuf;

/// Network-engineer shell for Strata Cloud Manager configuration objects.
///
/// Reads commands interactively with tab completion, or as a script from
/// stdin / `-c` when not attached to a terminal.
#[derive(Debug, Parser)]
#[command(name = "scm", version)]
pub struct Cli {
    /// Use an in-memory object store instead of the remote API (no credentials needed)
    #[arg(long)]
    pub offline: bool,

    /// Keep command history in memory only
    #[arg(long)]
    pub ephemeral_history: bool,

    /// Settings file (default: ~/.config/scm-cli/config.toml or $SCM_CLI_CONFIG)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// History database path (overrides the settings file)
    #[arg(long, value_name = "PATH")]
    pub history_db: Option<PathBuf>,

    /// Credentials file to load before reading the environment (default: ./.env)
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Run LINE and exit; may be given several times
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    pub commands: Vec<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}
