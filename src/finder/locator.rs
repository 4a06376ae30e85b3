//! Candidate search: commits that changed the literal's occurrence count.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::git::{CandidateCommit, HistoryProvider, SearchError, SearchQuery};

/// Runs the pickaxe search for `query`.
///
/// Identifiers reported more than once by the provider are collapsed to
/// their first occurrence. Any failure here aborts the run.
pub async fn locate<P>(provider: &P, query: &SearchQuery) -> Result<Vec<CandidateCommit>, SearchError>
where
    P: HistoryProvider + ?Sized,
{
    if query.literal().is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    info!(scope = %query.scope(), "Searching history for occurrence changes");

    let mut seen = HashSet::new();
    let candidates: Vec<CandidateCommit> = provider
        .find_candidates(query)
        .await?
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .collect();

    debug!(count = candidates.len(), "Candidate commits found");
    Ok(candidates)
}
