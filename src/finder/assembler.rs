//! Merges per-line matches into one sorted record per commit.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::data::{CommitRecord, ContextEntry, IntroductionMatch};
use crate::finder::{branches, metadata};
use crate::git::{HistoryProvider, SearchQuery};

/// Groups matches by commit, keeping each commit's entries in match order.
pub fn group_matches(matches: Vec<IntroductionMatch>) -> BTreeMap<String, Vec<ContextEntry>> {
    let mut groups: BTreeMap<String, Vec<ContextEntry>> = BTreeMap::new();
    for m in matches {
        groups.entry(m.commit).or_default().push(ContextEntry {
            file: m.file,
            line: m.line,
        });
    }
    groups
}

/// Sorts records oldest first, breaking ties by hash.
pub fn sort_records(records: &mut [CommitRecord]) {
    records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.hash.cmp(&b.hash)));
}

/// Builds report records from introduction matches.
pub struct ReportAssembler<'a, P: ?Sized> {
    provider: &'a P,
    query: &'a SearchQuery,
    concurrency: usize,
}

impl<'a, P> ReportAssembler<'a, P>
where
    P: HistoryProvider + ?Sized,
{
    /// Creates an assembler issuing at most `concurrency` lookups at a time.
    pub fn new(provider: &'a P, query: &'a SearchQuery, concurrency: usize) -> Self {
        Self {
            provider,
            query,
            concurrency: concurrency.max(1),
        }
    }

    /// Groups, enriches and sorts `matches`.
    ///
    /// Metadata and branch membership are looked up exactly once per commit.
    /// A commit whose metadata cannot be read is dropped with a warning.
    pub async fn assemble(&self, matches: Vec<IntroductionMatch>) -> Vec<CommitRecord> {
        let groups = group_matches(matches);
        let total = groups.len();
        let semaphore = Semaphore::new(self.concurrency);
        let completed = AtomicUsize::new(0);

        let futs: Vec<_> = groups
            .into_iter()
            .map(|(hash, context)| {
                let semaphore = &semaphore;
                let completed = &completed;
                async move {
                    // The semaphore is never closed; a failed acquire just runs unthrottled.
                    let _permit = semaphore.acquire().await.ok();
                    let (meta, branches) = tokio::join!(
                        metadata::read(self.provider, &hash),
                        branches::resolve(self.provider, &hash, self.query),
                    );
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(commit = %hash, "{done}/{total} commits enriched");
                    match meta {
                        Ok(meta) => Some(CommitRecord::new(hash, meta, branches, context)),
                        Err(e) => {
                            warn!(commit = %hash, error = %e, "Dropping commit without metadata");
                            None
                        }
                    }
                }
            })
            .collect();

        let mut records: Vec<CommitRecord> = futures::future::join_all(futs)
            .await
            .into_iter()
            .flatten()
            .collect();
        sort_records(&mut records);
        records
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::git::{BranchScope, CommitMetadata, FakeCommit, InMemoryHistory};
    use chrono::{DateTime, FixedOffset};
    use std::collections::BTreeSet;

    fn at(ts: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(ts).unwrap()
    }

    fn hit(commit: &str, file: &str, line: &str) -> IntroductionMatch {
        IntroductionMatch {
            commit: commit.to_string(),
            file: file.to_string(),
            line: line.to_string(),
        }
    }

    fn record(hash: &str, ts: &str) -> CommitRecord {
        CommitRecord::new(
            hash.to_string(),
            CommitMetadata {
                timestamp: at(ts),
                author: "A".to_string(),
                subject: "s".to_string(),
            },
            BTreeSet::new(),
            Vec::new(),
        )
    }

    #[test]
    fn grouping_is_by_key_not_position() {
        let groups = group_matches(vec![
            hit("b", "x", "1"),
            hit("a", "y", "2"),
            hit("b", "z", "3"),
        ]);
        assert_eq!(groups.len(), 2);
        let b: Vec<&str> = groups["b"].iter().map(|e| e.line.as_str()).collect();
        assert_eq!(b, vec!["1", "3"]);
    }

    #[test]
    fn sorting_uses_instant_then_hash() {
        let mut records = vec![
            record("ccc", "2024-01-02T00:00:00Z"),
            record("bbb", "2024-01-01T12:00:00+02:00"),
            record("aaa", "2024-01-01T10:00:00Z"),
        ];
        sort_records(&mut records);
        let hashes: Vec<&str> = records.iter().map(|r| r.hash.as_str()).collect();
        // 12:00+02:00 is 10:00Z, equal to aaa; the hash breaks the tie
        assert_eq!(hashes, vec!["aaa", "bbb", "ccc"]);
    }

    #[tokio::test]
    async fn metadata_and_branches_are_queried_once_per_commit() {
        let history = InMemoryHistory::new().with_commit(
            FakeCommit::new("c1", at("2024-01-01T00:00:00Z"), "Ann", "add", "")
                .on_branches(["main"]),
        );
        let query = SearchQuery::new("foo", BranchScope::All).unwrap();
        let records = ReportAssembler::new(&history, &query, 4)
            .assemble(vec![hit("c1", "a", "foo"), hit("c1", "b", "foo"), hit("c1", "c", "foo")])
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].context.len(), 3);
        assert_eq!(records[0].author, "Ann");
        assert_eq!(history.metadata_requests("c1"), 1);
        assert_eq!(history.branch_requests("c1"), 1);
    }

    #[tokio::test]
    async fn commit_without_metadata_is_dropped() {
        let history = InMemoryHistory::new()
            .with_commit(FakeCommit::new("c1", at("2024-01-01T00:00:00Z"), "A", "a", ""))
            .with_commit(FakeCommit::new("c2", at("2024-01-02T00:00:00Z"), "B", "b", ""))
            .with_missing_metadata("c1");
        let query = SearchQuery::new("foo", BranchScope::All).unwrap();
        let records = ReportAssembler::new(&history, &query, 1)
            .assemble(vec![hit("c1", "a", "foo"), hit("c2", "b", "foo")])
            .await;
        let hashes: Vec<&str> = records.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes, vec!["c2"]);
    }
}
