use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::branch::Branch;
use super::state::{LocalState, RemoteState};

/// Unique identifier for a repository, derived from its path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepoId(pub String);

impl RepoId {
    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().to_string())
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of everything the engine knows about one repository.
///
/// Snapshots are immutable until replaced: operations never patch
/// individual fields, they build a whole new snapshot and swap it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub path: PathBuf,
    pub branch: Branch,
    pub local: LocalState,
    pub remote: RemoteState,
    /// Unix seconds of the most recent commit, if any.
    pub last_commit: Option<i64>,
    pub remote_url: Option<String>,
    /// Local branches fully merged into HEAD; the prune candidates.
    pub merged_branches: Vec<String>,
}

impl Repository {
    pub fn id(&self) -> RepoId {
        RepoId::from_path(&self.path)
    }

    /// Display name for a repository root: its final path component.
    pub fn name_of(path: &Path) -> String {
        path.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}
