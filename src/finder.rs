//! The introduction-detection engine.
//!
//! Data flows in one direction:
//!
//! 1. [`locator`] runs the pickaxe search and yields candidate commits.
//! 2. [`analyzer`] fetches each candidate's first-parent diff and keeps the
//!    added lines that contain the literal.
//! 3. [`assembler`] groups the matches per commit, attaches
//!    [`metadata`] and [`branches`], and sorts the records oldest first.
//!
//! Per-commit queries run concurrently, bounded by
//! [`FinderOptions::concurrency`]. Per-commit failures are logged and the
//! commit is skipped; only a failure of the search itself aborts the run.

pub mod analyzer;
pub mod assembler;
pub mod branches;
pub mod locator;
pub mod metadata;

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::data::{CommitRecord, IntroductionMatch};
use crate::git::{HistoryProvider, SearchError, SearchQuery};

pub use assembler::ReportAssembler;

/// Concurrency used when nothing else is configured and the CPU count is unknown.
const FALLBACK_CONCURRENCY: usize = 4;

/// Top-level failure of a run.
#[derive(Error, Debug)]
pub enum FindError {
    /// The candidate search failed.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// The run was interrupted before it finished.
    #[error("search cancelled")]
    Cancelled,
}

/// Tuning knobs for a [`Finder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinderOptions {
    /// Maximum number of per-commit queries in flight.
    pub concurrency: usize,
}

impl Default for FinderOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// Number of available execution units, or a small constant.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism().map_or(FALLBACK_CONCURRENCY, NonZeroUsize::get)
}

/// Finds the commits that introduced a literal string.
pub struct Finder<P> {
    provider: P,
    options: FinderOptions,
}

impl<P> Finder<P>
where
    P: HistoryProvider,
{
    /// Creates a finder over `provider`.
    pub fn new(provider: P, options: FinderOptions) -> Self {
        Self { provider, options }
    }

    /// The underlying history provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Runs the whole pipeline for `query`.
    ///
    /// An empty result is a successful run that found no introduction.
    pub async fn find(&self, query: &SearchQuery) -> Result<Vec<CommitRecord>, SearchError> {
        let candidates = locator::locate(&self.provider, query).await?;
        if candidates.is_empty() {
            info!("No commit changed the occurrence count");
            return Ok(Vec::new());
        }

        let total = candidates.len();
        let semaphore = Semaphore::new(self.options.concurrency.max(1));
        let completed = AtomicUsize::new(0);

        let futs: Vec<_> = candidates
            .iter()
            .map(|candidate| {
                let semaphore = &semaphore;
                let completed = &completed;
                async move {
                    // The semaphore is never closed; a failed acquire just runs unthrottled.
                    let _permit = semaphore.acquire().await.ok();
                    let result = analyzer::analyze(&self.provider, candidate, query.literal()).await;
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(commit = %candidate.id, "{done}/{total} candidates analyzed");
                    match result {
                        Ok(matches) => matches,
                        Err(e) => {
                            warn!(commit = %candidate.id, error = %e, "Skipping commit with unreadable diff");
                            Vec::new()
                        }
                    }
                }
            })
            .collect();

        let matches: Vec<IntroductionMatch> = futures::future::join_all(futs)
            .await
            .into_iter()
            .flatten()
            .collect();
        info!(
            candidates = total,
            matches = matches.len(),
            "Diff analysis complete"
        );

        let records = ReportAssembler::new(&self.provider, query, self.options.concurrency)
            .assemble(matches)
            .await;
        info!(commits = records.len(), "Introducing commits found");
        Ok(records)
    }

    /// Runs [`find`](Self::find) until it completes or `shutdown` resolves.
    ///
    /// On shutdown every in-flight query is dropped, which kills its child
    /// process, and [`FindError::Cancelled`] is returned.
    pub async fn find_until<F>(
        &self,
        query: &SearchQuery,
        shutdown: F,
    ) -> Result<Vec<CommitRecord>, FindError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.find(query) => Ok(result?),
            () = shutdown => {
                warn!("Search interrupted; discarding partial results");
                Err(FindError::Cancelled)
            }
        }
    }
}
