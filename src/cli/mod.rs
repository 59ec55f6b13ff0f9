//! CLI entry point for tokenkeeper.

pub mod auth;

use clap::{Parser, Subcommand};

/// tokenkeeper CLI
#[derive(Parser, Debug)]
#[command(
    name = "tokenkeeper",
    version,
    about = "Obtain and cache an OAuth access token via the device flow"
)]
pub struct Cli {
    /// Print nothing but the bare access token
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Return a valid access token, refreshing or re-authenticating as needed (default)
    Authenticate,
    /// Show the stored credential status without contacting the server
    Check,
    /// Remove the stored credential
    Clear,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The requested command; `authenticate` when none is given.
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Authenticate)
    }
}
