use std::path::PathBuf;

use crate::domain::{OpKind, RepoId};

/// Commands accepted by the engine service.
#[derive(Debug, Clone)]
pub enum Command {
    /// Discover repositories under a new root.
    Rescan { base: PathBuf },

    /// Run one operation on one repository. Silently ignored while
    /// that repository is busy.
    Dispatch { id: RepoId, op: OpKind },

    /// Dispatch an operation on every idle repository. Busy
    /// repositories are skipped, never queued.
    DispatchAll { op: OpKind },

    /// Stop the engine loop.
    Quit,
}
