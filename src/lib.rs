//! # git-introduced
//!
//! Finds every commit that introduced a literal string into a git
//! repository, with date, author, subject, containing branches and the
//! added lines that carry the string.
//!
//! ## Quick Start
//!
//! ```no_run
//! use git_introduced::finder::{Finder, FinderOptions};
//! use git_introduced::git::{BranchScope, GitCli, GitCliOptions, SearchQuery};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let provider = GitCli::open(".", GitCliOptions::default())?;
//! let query = SearchQuery::new("API_KEY", BranchScope::All)?;
//! let records = Finder::new(provider, FinderOptions::default()).find(&query).await?;
//! for record in &records {
//!     println!("{} {}", record.hash, record.subject);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod data;
pub mod finder;
pub mod git;
pub mod render;
pub mod utils;

pub use crate::cli::Cli;

/// The current version of git-introduced.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
