//! In-memory history for deterministic tests and embedding.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use crate::git::diff_split::{parse_unified_diff, LineKind};
use crate::git::error::{DiffError, GitCommandError, MetadataError, SearchError};
use crate::git::history::{
    BranchScope, CandidateCommit, CommitMetadata, HistoryProvider, QueryFuture, SearchQuery,
};

/// A commit held by [`InMemoryHistory`].
#[derive(Debug, Clone)]
pub struct FakeCommit {
    id: String,
    metadata: CommitMetadata,
    diff: String,
    branches: BTreeSet<String>,
}

impl FakeCommit {
    /// Creates a commit with the given unified diff against its parent.
    pub fn new(
        id: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
        author: impl Into<String>,
        subject: impl Into<String>,
        diff: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            metadata: CommitMetadata {
                timestamp,
                author: author.into(),
                subject: subject.into(),
            },
            diff: diff.into(),
            branches: BTreeSet::new(),
        }
    }

    /// Marks the commit as reachable from the given branches.
    pub fn on_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branches.extend(branches.into_iter().map(Into::into));
        self
    }

    /// Commit identifier.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// A [`HistoryProvider`] backed by a fixed list of commits.
///
/// Candidates are computed the way a pickaxe search does: a commit is a
/// candidate when, for some file, the number of occurrences of the literal
/// on added lines differs from the number on removed lines. Candidates are
/// returned newest first, like `git log`.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    commits: Vec<FakeCommit>,
    extra_branches: BTreeSet<String>,
    unreadable_diffs: HashSet<String>,
    missing_metadata: HashSet<String>,
    latency: Option<Duration>,
    metadata_requests: Mutex<HashMap<String, usize>>,
    branch_requests: Mutex<HashMap<String, usize>>,
}

impl InMemoryHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a commit; commits must be added oldest first.
    pub fn with_commit(mut self, commit: FakeCommit) -> Self {
        self.commits.push(commit);
        self
    }

    /// Registers a branch that exists but may contain none of the commits.
    pub fn with_branch(mut self, name: impl Into<String>) -> Self {
        self.extra_branches.insert(name.into());
        self
    }

    /// Makes diff retrieval fail for the given commit.
    pub fn with_unreadable_diff(mut self, id: impl Into<String>) -> Self {
        self.unreadable_diffs.insert(id.into());
        self
    }

    /// Makes metadata retrieval fail for the given commit.
    pub fn with_missing_metadata(mut self, id: impl Into<String>) -> Self {
        self.missing_metadata.insert(id.into());
        self
    }

    /// Delays every per-commit answer, to exercise concurrency and cancellation.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of metadata reads issued for a commit so far.
    pub fn metadata_requests(&self, id: &str) -> usize {
        count(&self.metadata_requests, id)
    }

    /// Number of branch-membership queries issued for a commit so far.
    pub fn branch_requests(&self, id: &str) -> usize {
        count(&self.branch_requests, id)
    }

    fn find(&self, id: &str) -> Option<&FakeCommit> {
        self.commits.iter().find(|c| c.id == id)
    }

    fn branch_exists(&self, name: &str) -> bool {
        self.extra_branches.contains(name) || self.commits.iter().any(|c| c.branches.contains(name))
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn count(map: &Mutex<HashMap<String, usize>>, id: &str) -> usize {
    map.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(id)
        .copied()
        .unwrap_or(0)
}

fn bump(map: &Mutex<HashMap<String, usize>>, id: &str) {
    *map.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(id.to_string())
        .or_default() += 1;
}

/// Whether a diff changes the occurrence count of `literal` in any file.
fn changes_occurrences(diff: &str, literal: &str) -> bool {
    parse_unified_diff(diff).iter().any(|patch| {
        let mut delta: i64 = 0;
        for line in patch.hunks.iter().flat_map(|h| &h.lines) {
            let n = line.text.matches(literal).count() as i64;
            match line.kind {
                LineKind::Added => delta += n,
                LineKind::Removed => delta -= n,
                LineKind::Context => {}
            }
        }
        delta != 0
    })
}

impl HistoryProvider for InMemoryHistory {
    fn find_candidates<'a>(
        &'a self,
        query: &'a SearchQuery,
    ) -> QueryFuture<'a, Result<Vec<CandidateCommit>, SearchError>> {
        Box::pin(async move {
            if let BranchScope::Branch(name) = query.scope() {
                if !self.branch_exists(name) {
                    return Err(SearchError::UnknownBranch { name: name.clone() });
                }
            }
            Ok(self
                .commits
                .iter()
                .rev()
                .filter(|c| match query.scope() {
                    BranchScope::All => true,
                    BranchScope::Branch(name) => c.branches.contains(name),
                })
                .filter(|c| changes_occurrences(&c.diff, query.literal()))
                .map(|c| CandidateCommit { id: c.id.clone() })
                .collect())
        })
    }

    fn commit_diff<'a>(&'a self, commit: &'a str) -> QueryFuture<'a, Result<String, DiffError>> {
        Box::pin(async move {
            self.simulate_latency().await;
            match self.find(commit) {
                Some(c) if !self.unreadable_diffs.contains(commit) => Ok(c.diff.clone()),
                _ => Err(DiffError::Unreadable {
                    commit: commit.to_string(),
                    source: GitCommandError::Failed {
                        command: "diff".to_string(),
                        code: Some(128),
                        stderr: format!("fatal: bad object {commit}"),
                    },
                }),
            }
        })
    }

    fn branches_containing<'a>(
        &'a self,
        commit: &'a str,
        scope: &'a BranchScope,
    ) -> QueryFuture<'a, Result<BTreeSet<String>, GitCommandError>> {
        Box::pin(async move {
            self.simulate_latency().await;
            bump(&self.branch_requests, commit);
            let branches = self.find(commit).map(|c| &c.branches);
            Ok(match (branches, scope) {
                (None, _) => BTreeSet::new(),
                (Some(all), BranchScope::All) => all.clone(),
                (Some(all), BranchScope::Branch(name)) => {
                    all.iter().filter(|b| *b == name).cloned().collect()
                }
            })
        })
    }

    fn commit_metadata<'a>(
        &'a self,
        commit: &'a str,
    ) -> QueryFuture<'a, Result<CommitMetadata, MetadataError>> {
        Box::pin(async move {
            self.simulate_latency().await;
            bump(&self.metadata_requests, commit);
            match self.find(commit) {
                Some(c) if !self.missing_metadata.contains(commit) => Ok(c.metadata.clone()),
                _ => Err(MetadataError::CommitNotFound {
                    commit: commit.to_string(),
                    source: None,
                }),
            }
        })
    }
}
