use crate::domain::Repository;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

/// Port for git operations, implemented by the subprocess adapter.
#[async_trait]
pub trait GitPort: Send + Sync {
    /// Collect a full repository snapshot via concurrent queries.
    ///
    /// Individual query failures degrade only the affected field to
    /// its `Error` variant; building a snapshot never fails whole.
    async fn build_snapshot(&self, path: &Path) -> Repository;

    /// `git fetch --quiet`. Failures come back directly rather than
    /// being folded into a snapshot.
    async fn fetch(&self, path: &Path) -> Result<()>;

    /// `git pull --rebase --progress`, streaming every output line
    /// through `lines` in emission order. Returns the exit code.
    async fn pull(&self, path: &Path, lines: mpsc::Sender<String>) -> i32;

    /// Safe-delete each named branch in turn, streaming one line per
    /// attempt. An individual failure never aborts the remainder.
    /// Returns the exit code and the number of branches deleted.
    async fn delete_branches(
        &self,
        path: &Path,
        branches: &[String],
        lines: mpsc::Sender<String>,
    ) -> (i32, u32);
}
