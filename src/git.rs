//! Git history access: the query interface and its implementations.

pub mod command;
pub mod diff_split;
pub mod error;
pub mod history;
pub mod memory;
pub mod repository;

pub use command::{GitCli, GitCliOptions};
pub use error::{DiffError, GitCommandError, MetadataError, SearchError};
pub use history::{
    BranchScope, CandidateCommit, CommitMetadata, HistoryProvider, QueryFuture, SearchQuery,
};
pub use memory::{FakeCommit, InMemoryHistory};
pub use repository::GitRepository;

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;
