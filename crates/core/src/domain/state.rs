use serde::{Deserialize, Serialize};

/// Working-tree state of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalState {
    Clean,
    Dirty {
        added: u32,
        modified: u32,
        deleted: u32,
        untracked: u32,
    },
    Error {
        message: String,
    },
}

impl std::fmt::Display for LocalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocalState::Clean => write!(f, "clean"),
            LocalState::Dirty {
                added,
                modified,
                deleted,
                untracked,
            } => write!(f, "+{added} ~{modified} -{deleted} ?{untracked}"),
            LocalState::Error { message } => write!(f, "error: {message}"),
        }
    }
}

/// Synchronization state against the upstream branch. Counts are
/// strictly positive wherever they appear; `(0, 0)` is `Synced`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteState {
    Synced,
    Ahead { count: u32 },
    Behind { count: u32 },
    Diverged { ahead: u32, behind: u32 },
    NoUpstream,
    Detached,
    Error { message: String },
}

impl RemoteState {
    /// Build a state from ahead/behind counts, collapsing zeroes.
    pub fn from_counts(ahead: u32, behind: u32) -> Self {
        match (ahead, behind) {
            (0, 0) => RemoteState::Synced,
            (a, 0) => RemoteState::Ahead { count: a },
            (0, b) => RemoteState::Behind { count: b },
            (a, b) => RemoteState::Diverged { ahead: a, behind: b },
        }
    }
}

impl std::fmt::Display for RemoteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteState::Synced => write!(f, "synced"),
            RemoteState::Ahead { count } => write!(f, "ahead {count}"),
            RemoteState::Behind { count } => write!(f, "behind {count}"),
            RemoteState::Diverged { ahead, behind } => {
                write!(f, "diverged +{ahead}/-{behind}")
            }
            RemoteState::NoUpstream => write!(f, "no upstream"),
            RemoteState::Detached => write!(f, "detached"),
            RemoteState::Error { message } => write!(f, "error: {message}"),
        }
    }
}
