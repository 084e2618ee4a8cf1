use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::LogLevel;

/// Exposes Bluetooth AVRCP media players as MPRIS players.
#[derive(Parser, Debug)]
#[command(name = "bluempris", version, about)]
pub struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/bluempris/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log level, overriding the configuration file
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Exit immediately; target of the generated desktop entries
    #[arg(long)]
    pub do_nothing: bool,

    /// What to do (default: run)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// Run the bridge until interrupted
    #[default]
    Run,

    /// Print every Bluetooth player and its exposed properties, then exit
    List,

    /// Print the JSON schema of the configuration file
    Schema,
}

impl Cli {
    /// Command to run, defaulting to [`Command::Run`].
    pub fn command(&self) -> Command {
        self.command.unwrap_or_default()
    }
}
