//! Branch membership of confirmed commits.

use std::collections::BTreeSet;

use tracing::warn;

use crate::git::{HistoryProvider, SearchQuery};

/// Returns the branches, within the query's scope, that contain `commit`.
///
/// Never fails: an unreachable commit and a failed lookup both yield an
/// empty set, the latter with a warning.
pub async fn resolve<P>(provider: &P, commit: &str, query: &SearchQuery) -> BTreeSet<String>
where
    P: HistoryProvider + ?Sized,
{
    match provider.branches_containing(commit, query.scope()).await {
        Ok(branches) => branches,
        Err(e) => {
            warn!(commit, error = %e, "Could not resolve branch membership");
            BTreeSet::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::git::{BranchScope, FakeCommit, InMemoryHistory};
    use chrono::DateTime;

    fn history() -> InMemoryHistory {
        InMemoryHistory::new().with_commit(
            FakeCommit::new(
                "a1",
                DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap(),
                "A",
                "init",
                "",
            )
            .on_branches(["main", "origin/main", "feature"]),
        )
    }

    #[tokio::test]
    async fn all_scope_lists_every_branch() {
        let query = SearchQuery::new("x", BranchScope::All).unwrap();
        let branches = resolve(&history(), "a1", &query).await;
        assert_eq!(
            branches.into_iter().collect::<Vec<_>>(),
            vec!["feature", "main", "origin/main"]
        );
    }

    #[tokio::test]
    async fn single_scope_is_intersected() {
        let query = SearchQuery::new("x", BranchScope::Branch("feature".to_string())).unwrap();
        let branches = resolve(&history(), "a1", &query).await;
        assert_eq!(branches, BTreeSet::from(["feature".to_string()]));
    }

    #[tokio::test]
    async fn unreachable_commit_has_no_branches() {
        let query = SearchQuery::new("x", BranchScope::Branch("feature".to_string())).unwrap();
        assert!(resolve(&history(), "zz", &query).await.is_empty());
    }
}
