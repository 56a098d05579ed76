use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Request for repository discovery.
#[derive(Clone, Debug)]
pub struct DiscoverReq {
    pub base: PathBuf,
}

/// Port for repository discovery.
///
/// `scan` is blocking; callers run it in `spawn_blocking`. Each
/// confirmed repository root is sent on `found` as soon as it is
/// known, and the stream closes when the call returns. A scan never
/// descends into a found repository's subtree, and per-directory read
/// errors are skipped rather than aborting the walk.
pub trait DiscoveryPort: Send + Sync {
    fn scan(&self, req: DiscoverReq, found: mpsc::UnboundedSender<PathBuf>) -> Result<()>;
}
