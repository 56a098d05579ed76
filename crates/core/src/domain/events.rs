use std::path::PathBuf;

use super::activity::{OpKind, OpOutcome};
use super::repo::{RepoId, Repository};

/// Events emitted by the engine. The reducer applies every event to
/// the projection in receipt order; a copy is forwarded to the
/// presentation layer over the external channel.
#[derive(Debug, Clone)]
pub enum Event {
    /// Discovery confirmed a repository root.
    RepoDiscovered { id: RepoId, path: PathBuf },

    /// Discovery finished; no further roots will arrive.
    ScanCompleted,

    /// A freshly built snapshot replaced the repository's state.
    SnapshotReplaced { id: RepoId, repo: Repository },

    /// An operation started on an idle repository.
    OperationStarted { id: RepoId, op: OpKind },

    /// One line of streamed output from the running operation.
    ProgressLine { id: RepoId, line: String },

    /// The running operation finished; carries the final snapshot.
    OperationComplete {
        id: RepoId,
        outcome: OpOutcome,
        repo: Repository,
    },

    /// A non-fatal engine error.
    Error { id: Option<RepoId>, message: String },
}
