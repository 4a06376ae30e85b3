//! Find command: reports the commits that introduced a literal string.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use crate::data::Report;
use crate::finder::{Finder, FinderOptions};
use crate::git::{BranchScope, GitCli, GitCliOptions, SearchQuery};
use crate::render::{render, OutputFormat};
use crate::utils::{check_git_binary, Settings};

/// Find command options.
#[derive(Parser, Debug)]
pub struct FindCommand {
    /// Literal string to look for; matched exactly and case-sensitively.
    #[arg(value_name = "STRING")]
    pub search: String,

    /// Repository root to search.
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Restricts the search to one branch (defaults to all branches).
    #[arg(long)]
    pub branch: Option<String>,

    /// Also considers merge commits, attributed through their first parent.
    #[arg(long)]
    pub include_merges: bool,

    /// Maximum number of concurrent git queries.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Timeout in seconds for each git invocation.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Output format: text (default), yaml, json, html.
    #[arg(long, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Writes the report to a file instead of stdout.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Enables debug logging.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl FindCommand {
    /// Builds the search query from the arguments.
    pub fn query(&self) -> Result<SearchQuery> {
        let scope = match &self.branch {
            Some(name) => BranchScope::Branch(name.clone()),
            None => BranchScope::All,
        };
        Ok(SearchQuery::new(self.search.clone(), scope)?)
    }

    /// Executes the find command.
    pub async fn execute(self) -> Result<()> {
        let settings = Settings::load().unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unreadable settings file");
            Settings::default()
        });

        let program = settings.git_program();
        let version = check_git_binary(&program)?;
        debug!(%version, "Found git");

        let query = self.query()?;
        let options = GitCliOptions {
            program,
            timeout: settings.query_timeout(self.timeout_secs)?,
            include_merges: self.include_merges,
        };
        let provider = GitCli::open(&self.repo, options)?;
        let finder = Finder::new(
            provider,
            FinderOptions {
                concurrency: settings.concurrency(self.concurrency)?,
            },
        );

        info!(search = %query.literal(), scope = %query.scope(), "Searching history");
        let records = finder
            .find_until(&query, shutdown_signal())
            .await
            .with_context(|| format!("Failed to search {}", self.repo.display()))?;

        let report = Report::new(&query, records);
        let rendered = render(&report, self.format)?;
        match &self.output {
            Some(path) => {
                fs::write(path, rendered)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                eprintln!(
                    "Wrote {} commit(s) to {}",
                    report.commits.len(),
                    path.display()
                );
            }
            None => print!("{rendered}"),
        }
        Ok(())
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
