//! CLI interface for git-introduced.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod find;

pub use find::FindCommand;

/// git-introduced: finds the commits that introduced a string.
#[derive(Parser)]
#[command(name = "git-introduced")]
#[command(
    about = "Finds the commits that introduced a literal string into a git repository",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// The main command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Main commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Lists every commit whose added lines contain the string.
    Find(FindCommand),
}

impl Cli {
    /// Whether debug logging was requested on the command line.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Commands::Find(cmd) => cmd.verbose,
        }
    }

    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Find(find_cmd) => find_cmd.execute().await,
        }
    }
}
