//! Report-ready records produced by the finder.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::git::{BranchScope, CommitMetadata, SearchQuery};

/// An added line containing the literal, found in one commit's diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntroductionMatch {
    /// Commit the line was added in.
    pub commit: String,
    /// File the line was added to.
    pub file: String,
    /// Added line text, without the `+` marker.
    pub line: String,
}

/// One `(file, line)` pair shown for a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Path of the file relative to the repository root.
    pub file: String,
    /// Added line containing the searched literal.
    pub line: String,
}

/// A commit that introduced the literal, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit hash; unique within a report.
    pub hash: String,
    /// Commit date with its recorded offset.
    pub date: DateTime<FixedOffset>,
    /// Author display name.
    pub author: String,
    /// First line of the commit message.
    pub subject: String,
    /// Branches containing the commit; empty when none does.
    pub branches: BTreeSet<String>,
    /// Added lines containing the literal, in diff order.
    pub context: Vec<ContextEntry>,
}

impl CommitRecord {
    /// Builds a record from metadata, branch membership and grouped matches.
    pub fn new(
        hash: String,
        metadata: CommitMetadata,
        branches: BTreeSet<String>,
        context: Vec<ContextEntry>,
    ) -> Self {
        Self {
            hash,
            date: metadata.timestamp,
            author: metadata.author,
            subject: metadata.subject,
            branches,
            context,
        }
    }
}

/// Envelope handed to the renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Version of the tool that produced the report.
    pub version: String,
    /// The searched literal.
    pub search: String,
    /// Branch scope of the search.
    pub scope: BranchScope,
    /// Introducing commits, oldest first.
    pub commits: Vec<CommitRecord>,
}

impl Report {
    /// Wraps finder output for a query.
    pub fn new(query: &SearchQuery, commits: Vec<CommitRecord>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            search: query.literal().to_string(),
            scope: query.scope().clone(),
            commits,
        }
    }

    /// Whether no introducing commit was found.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}
