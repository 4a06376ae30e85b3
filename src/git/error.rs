//! Error taxonomy for history queries.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single `git` subprocess invocation.
#[derive(Error, Debug)]
pub enum GitCommandError {
    /// The git binary could not be started.
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        /// Program that was executed.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The command did not finish within its time budget and was killed.
    #[error("`git {command}` timed out after {}s", .timeout.as_secs())]
    Timeout {
        /// Git subcommand that timed out.
        command: String,
        /// Budget that was exceeded.
        timeout: Duration,
    },

    /// The command exited unsuccessfully.
    #[error("`git {command}` exited with {}: {stderr}", exit_label(*.code))]
    Failed {
        /// Git subcommand that failed.
        command: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The command succeeded but printed something we cannot parse.
    #[error("unexpected output from `git {command}`: {detail}")]
    MalformedOutput {
        /// Git subcommand whose output was rejected.
        command: String,
        /// What was wrong with it.
        detail: String,
    },
}

fn exit_label(code: Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}"))
}

/// Fatal errors of the candidate search stage.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The literal to search for was empty.
    #[error("search string must not be empty")]
    EmptyQuery,

    /// The target path holds no git repository.
    #[error("not a git repository: {}", .path.display())]
    NotARepository {
        /// Path that was inspected.
        path: PathBuf,
    },

    /// The requested branch does not exist.
    #[error("unknown branch '{name}'")]
    UnknownBranch {
        /// Branch name as given by the user.
        name: String,
    },

    /// The history search itself failed.
    #[error("history search failed")]
    ToolInvocationFailed(#[from] GitCommandError),
}

/// Per-commit failure to read display metadata.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The commit could not be resolved.
    #[error("commit {commit} not found")]
    CommitNotFound {
        /// Commit identifier.
        commit: String,
        /// Underlying query failure, when there was one.
        #[source]
        source: Option<GitCommandError>,
    },

    /// Metadata was returned but could not be interpreted.
    #[error("malformed metadata for commit {commit}: {detail}")]
    Malformed {
        /// Commit identifier.
        commit: String,
        /// What could not be parsed.
        detail: String,
    },
}

/// Per-commit failure to read a diff.
#[derive(Error, Debug)]
pub enum DiffError {
    /// The diff of the commit against its first parent could not be produced.
    #[error("diff of commit {commit} is unreadable")]
    Unreadable {
        /// Commit identifier.
        commit: String,
        /// Underlying query failure.
        #[source]
        source: GitCommandError,
    },
}
