//! Query interface over a repository's history.
//!
//! Everything the finder needs from version control goes through
//! [`HistoryProvider`], so the engine can run against a real `git` binary
//! ([`GitCli`](crate::git::GitCli)) or an in-memory fake
//! ([`InMemoryHistory`](crate::git::InMemoryHistory)).

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::git::error::{DiffError, GitCommandError, MetadataError, SearchError};

/// Boxed future returned by provider queries.
pub type QueryFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Which part of the history to search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum BranchScope {
    /// Every local and remote branch.
    All,
    /// A single named branch.
    Branch(String),
}

impl fmt::Display for BranchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all branches"),
            Self::Branch(name) => write!(f, "branch '{name}'"),
        }
    }
}

/// An immutable search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    literal: String,
    scope: BranchScope,
}

impl SearchQuery {
    /// Creates a query, rejecting an empty literal.
    pub fn new(literal: impl Into<String>, scope: BranchScope) -> Result<Self, SearchError> {
        let literal = literal.into();
        if literal.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        Ok(Self { literal, scope })
    }

    /// The exact, case-sensitive string being searched for.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// The branch scope of the search.
    pub fn scope(&self) -> &BranchScope {
        &self.scope
    }
}

/// A commit whose diff changed the number of occurrences of the literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateCommit {
    /// Full object id.
    pub id: String,
}

/// Display metadata of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMetadata {
    /// Commit date with its recorded offset.
    pub timestamp: DateTime<FixedOffset>,
    /// Author display name (no email).
    pub author: String,
    /// First line of the commit message, trimmed.
    pub subject: String,
}

/// Read-only queries the finder issues against a repository.
pub trait HistoryProvider: Send + Sync {
    /// Pickaxe search: commits whose diff changes the occurrence count of the
    /// literal, in the order the history tool reports them.
    fn find_candidates<'a>(
        &'a self,
        query: &'a SearchQuery,
    ) -> QueryFuture<'a, Result<Vec<CandidateCommit>, SearchError>>;

    /// Unified diff of a commit against its first parent (or the empty tree).
    fn commit_diff<'a>(&'a self, commit: &'a str) -> QueryFuture<'a, Result<String, DiffError>>;

    /// Branch names whose history contains the commit, restricted to `scope`.
    fn branches_containing<'a>(
        &'a self,
        commit: &'a str,
        scope: &'a BranchScope,
    ) -> QueryFuture<'a, Result<BTreeSet<String>, GitCommandError>>;

    /// Author, date and subject of a commit.
    fn commit_metadata<'a>(
        &'a self,
        commit: &'a str,
    ) -> QueryFuture<'a, Result<CommitMetadata, MetadataError>>;
}
