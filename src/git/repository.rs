//! Git repository access through libgit2.

use std::path::{Path, PathBuf};

use git2::{BranchType, ErrorCode, Repository};
use tracing::debug;

use crate::git::error::SearchError;

/// Git repository wrapper used for validation and ref lookups.
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Opens the repository rooted exactly at `path`.
    ///
    /// No upward discovery is performed: a subdirectory of a work tree is
    /// not accepted.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self, SearchError> {
        let path = path.as_ref();
        match Repository::open(path) {
            Ok(repo) => Ok(Self { repo }),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Failed to open git repository");
                Err(SearchError::NotARepository {
                    path: path.to_path_buf(),
                })
            }
        }
    }

    /// Returns the repository's `.git` path.
    pub fn path(&self) -> &Path {
        self.repo.path()
    }

    /// Returns the directory `git` should run in.
    pub fn workdir(&self) -> PathBuf {
        self.repo
            .workdir()
            .unwrap_or_else(|| self.repo.path())
            .to_path_buf()
    }

    /// Checks whether `branch_name` names a local or remote-tracking branch.
    pub fn branch_exists(&self, branch_name: &str) -> bool {
        [BranchType::Local, BranchType::Remote]
            .into_iter()
            .any(|kind| match self.repo.find_branch(branch_name, kind) {
                Ok(_) => true,
                Err(e) if e.code() == ErrorCode::NotFound => false,
                Err(e) => {
                    debug!(branch = branch_name, error = %e, "Branch lookup failed");
                    false
                }
            })
    }

    /// Lists local and remote-tracking branch names.
    pub fn branch_names(&self) -> Vec<String> {
        let Ok(branches) = self.repo.branches(None) else {
            return Vec::new();
        };
        let mut names: Vec<String> = branches
            .flatten()
            .filter_map(|(branch, _)| branch.name().ok().flatten().map(str::to_string))
            .filter(|name| !name.ends_with("/HEAD"))
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use git2::Signature;

    fn init_with_commit(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        {
            let sig = Signature::now("Test User", "test@example.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
                .unwrap();
        }
        repo
    }

    #[test]
    fn open_plain_directory_is_not_a_repository() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = GitRepository::open_at(temp_dir.path()).err().unwrap();
        assert!(matches!(err, SearchError::NotARepository { .. }));
    }

    #[test]
    fn branch_lookup() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = init_with_commit(temp_dir.path());
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.branch("feature/x", &head, false).unwrap();

        let git = GitRepository::open_at(temp_dir.path()).unwrap();
        assert!(git.branch_exists("feature/x"));
        assert!(!git.branch_exists("nope"));
        assert!(git.branch_names().contains(&"feature/x".to_string()));
        assert_eq!(git.workdir().canonicalize().unwrap(), temp_dir.path().canonicalize().unwrap());
    }
}
