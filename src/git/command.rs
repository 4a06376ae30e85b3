//! [`HistoryProvider`] backed by the `git` command line.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use chrono::DateTime;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::git::error::{DiffError, GitCommandError, MetadataError, SearchError};
use crate::git::history::{
    BranchScope, CandidateCommit, CommitMetadata, HistoryProvider, QueryFuture, SearchQuery,
};
use crate::git::repository::GitRepository;

/// Default per-query time budget.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Field separator used in `--format` strings.
const FIELD_SEP: char = '\0';

/// Options for [`GitCli`].
#[derive(Debug, Clone)]
pub struct GitCliOptions {
    /// Program to execute, usually `git`.
    pub program: String,
    /// Time budget of every single git invocation.
    pub timeout: Duration,
    /// Whether merge commits take part in the pickaxe walk.
    pub include_merges: bool,
}

impl Default for GitCliOptions {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            timeout: DEFAULT_QUERY_TIMEOUT,
            include_merges: false,
        }
    }
}

/// Runs read-only `git` subprocesses against one repository.
///
/// Every invocation is bounded by [`GitCliOptions::timeout`] and spawned with
/// `kill_on_drop`, so dropping a pending query (for instance on Ctrl-C)
/// terminates the child process.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_path: PathBuf,
    options: GitCliOptions,
}

impl GitCli {
    /// Validates that `path` is a repository and prepares to query it.
    pub fn open<P: AsRef<Path>>(path: P, options: GitCliOptions) -> Result<Self, SearchError> {
        let repo = GitRepository::open_at(&path)?;
        debug!(git_dir = %repo.path().display(), "Opened repository");
        Ok(Self {
            repo_path: repo.workdir(),
            options,
        })
    }

    /// Directory the git commands run in.
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Runs git and returns its raw output, whatever the exit status.
    async fn output(&self, args: &[&str]) -> Result<Output, GitCommandError> {
        let label = args.first().copied().unwrap_or_default().to_string();
        let mut cmd = Command::new(&self.options.program);
        cmd.arg("-c")
            .arg("core.quotePath=false")
            .args(args)
            .current_dir(&self.repo_path)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %label, ?args, "Running git");
        match tokio::time::timeout(self.options.timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(source)) => Err(GitCommandError::Spawn {
                program: self.options.program.clone(),
                source,
            }),
            Err(_) => Err(GitCommandError::Timeout {
                command: label,
                timeout: self.options.timeout,
            }),
        }
    }

    /// Runs git and returns stdout, failing on a non-zero exit.
    async fn run(&self, args: &[&str]) -> Result<String, GitCommandError> {
        let output = self.output(args).await?;
        if !output.status.success() {
            return Err(failed(args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Returns the first parent of `commit`, or `None` for a root commit.
    async fn first_parent(&self, commit: &str) -> Result<Option<String>, GitCommandError> {
        let stdout = self
            .run(&["rev-list", "--parents", "-n", "1", commit, "--"])
            .await?;
        let mut ids = stdout.split_whitespace();
        if ids.next().is_none() {
            return Err(GitCommandError::MalformedOutput {
                command: "rev-list".to_string(),
                detail: format!("no entry for {commit}"),
            });
        }
        Ok(ids.next().map(str::to_string))
    }

    async fn read_diff(&self, commit: &str) -> Result<String, GitCommandError> {
        const DIFF_FLAGS: [&str; 5] = [
            "--no-color",
            "--no-ext-diff",
            "--no-textconv",
            "--src-prefix=a/",
            "--dst-prefix=b/",
        ];
        match self.first_parent(commit).await? {
            Some(parent) => {
                let mut args = vec!["diff"];
                args.extend(DIFF_FLAGS);
                args.extend([parent.as_str(), commit, "--"]);
                self.run(&args).await
            }
            None => {
                let mut args = vec!["diff-tree", "-p", "-r", "--root", "--no-commit-id"];
                args.extend(DIFF_FLAGS);
                args.extend([commit, "--"]);
                self.run(&args).await
            }
        }
    }
}

fn failed(args: &[&str], output: &Output) -> GitCommandError {
    GitCommandError::Failed {
        command: args.first().copied().unwrap_or_default().to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

/// Whether `s` looks like a full SHA-1 or SHA-256 object id.
fn is_object_id(s: &str) -> bool {
    matches!(s.len(), 40 | 64) && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Parses `git log --format=%H` output, keeping first occurrences only.
pub(crate) fn parse_candidate_ids(stdout: &str) -> Result<Vec<CandidateCommit>, GitCommandError> {
    let mut seen = std::collections::HashSet::new();
    let mut candidates = Vec::new();
    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !is_object_id(line) {
            return Err(GitCommandError::MalformedOutput {
                command: "log".to_string(),
                detail: format!("expected a commit id, got '{line}'"),
            });
        }
        if seen.insert(line) {
            candidates.push(CandidateCommit {
                id: line.to_string(),
            });
        }
    }
    Ok(candidates)
}

/// Parses `git branch --format=%(refname:short)%09%(symref)` output.
pub(crate) fn parse_branch_list(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .filter_map(|line| {
            let (name, symref) = line.split_once('\t').unwrap_or((line, ""));
            let name = name.trim();
            let skip = name.is_empty()
                || !symref.trim().is_empty()
                || name.contains("->")
                || name.starts_with('(');
            (!skip).then(|| name.to_string())
        })
        .collect()
}

/// Parses `%H%x00%cI%x00%an%x00%B` output into metadata.
pub(crate) fn parse_metadata(commit: &str, stdout: &str) -> Result<CommitMetadata, MetadataError> {
    let malformed = |detail: String| MetadataError::Malformed {
        commit: commit.to_string(),
        detail,
    };
    let mut fields = stdout.splitn(4, FIELD_SEP);
    let (Some(_hash), Some(date), Some(author), Some(message)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(malformed("missing fields".to_string()));
    };
    let timestamp = DateTime::parse_from_rfc3339(date.trim())
        .map_err(|e| malformed(format!("bad date '{}': {e}", date.trim())))?;
    Ok(CommitMetadata {
        timestamp,
        author: author.trim().to_string(),
        subject: message.lines().next().unwrap_or_default().trim().to_string(),
    })
}

/// Classifies a failed pickaxe search.
fn classify_search_failure(err: GitCommandError, query: &SearchQuery, path: &Path) -> SearchError {
    if let GitCommandError::Failed { stderr, .. } = &err {
        if stderr.contains("not a git repository") {
            return SearchError::NotARepository {
                path: path.to_path_buf(),
            };
        }
        if let BranchScope::Branch(name) = query.scope() {
            if stderr.contains("unknown revision") || stderr.contains("bad revision") {
                return SearchError::UnknownBranch { name: name.clone() };
            }
        }
    }
    SearchError::ToolInvocationFailed(err)
}

impl HistoryProvider for GitCli {
    fn find_candidates<'a>(
        &'a self,
        query: &'a SearchQuery,
    ) -> QueryFuture<'a, Result<Vec<CandidateCommit>, SearchError>> {
        Box::pin(async move {
            if let BranchScope::Branch(name) = query.scope() {
                let repo = GitRepository::open_at(&self.repo_path)?;
                if !repo.branch_exists(name) {
                    debug!(known = ?repo.branch_names(), "Branch not found");
                    return Err(SearchError::UnknownBranch { name: name.clone() });
                }
            }

            let pickaxe = format!("-S{}", query.literal());
            let mut args = vec!["log", "--format=%H", "--no-color", pickaxe.as_str()];
            if self.options.include_merges {
                args.push("-m");
            } else {
                args.push("--no-merges");
            }
            match query.scope() {
                BranchScope::All => args.push("--all"),
                BranchScope::Branch(name) => args.push(name.as_str()),
            }
            args.push("--");

            let stdout = self
                .run(&args)
                .await
                .map_err(|e| classify_search_failure(e, query, &self.repo_path))?;
            Ok(parse_candidate_ids(&stdout)?)
        })
    }

    fn commit_diff<'a>(&'a self, commit: &'a str) -> QueryFuture<'a, Result<String, DiffError>> {
        Box::pin(async move {
            self.read_diff(commit)
                .await
                .map_err(|source| DiffError::Unreadable {
                    commit: commit.to_string(),
                    source,
                })
        })
    }

    fn branches_containing<'a>(
        &'a self,
        commit: &'a str,
        scope: &'a BranchScope,
    ) -> QueryFuture<'a, Result<BTreeSet<String>, GitCommandError>> {
        Box::pin(async move {
            match scope {
                BranchScope::All => {
                    let stdout = self
                        .run(&[
                            "branch",
                            "--all",
                            "--no-color",
                            "--format=%(refname:short)%09%(symref)",
                            "--contains",
                            commit,
                        ])
                        .await?;
                    Ok(parse_branch_list(&stdout))
                }
                BranchScope::Branch(name) => {
                    let args = ["merge-base", "--is-ancestor", commit, name.as_str()];
                    let output = self.output(&args).await?;
                    match output.status.code() {
                        Some(0) => Ok(BTreeSet::from([name.clone()])),
                        Some(1) => {
                            warn!(commit, branch = %name, "Commit is not reachable from the searched branch");
                            Ok(BTreeSet::new())
                        }
                        _ => Err(failed(&args, &output)),
                    }
                }
            }
        })
    }

    fn commit_metadata<'a>(
        &'a self,
        commit: &'a str,
    ) -> QueryFuture<'a, Result<CommitMetadata, MetadataError>> {
        Box::pin(async move {
            let stdout = self
                .run(&[
                    "show",
                    "-s",
                    "--no-color",
                    "--format=%H%x00%cI%x00%an%x00%B",
                    commit,
                    "--",
                ])
                .await
                .map_err(|source| MetadataError::CommitNotFound {
                    commit: commit.to_string(),
                    source: Some(source),
                })?;
            parse_metadata(commit, &stdout)
        })
    }
}
