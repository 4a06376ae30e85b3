//! Display metadata of confirmed commits.

use tracing::debug;

use crate::git::{CommitMetadata, HistoryProvider, MetadataError};

/// Reads author, date and subject of `commit`.
pub async fn read<P>(provider: &P, commit: &str) -> Result<CommitMetadata, MetadataError>
where
    P: HistoryProvider + ?Sized,
{
    let metadata = provider.commit_metadata(commit).await?;
    debug!(commit, date = %metadata.timestamp, author = %metadata.author, "Read commit metadata");
    Ok(metadata)
}
