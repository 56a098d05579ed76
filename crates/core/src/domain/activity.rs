/// Prefix of progress lines reporting one successful branch deletion.
/// The reducer folds these into the live deleted count while pruning.
pub const PRUNE_DELETED_PREFIX: &str = "Deleted: ";

/// Prefix of progress lines reporting one failed branch deletion.
pub const PRUNE_FAILED_PREFIX: &str = "Failed: ";

/// Per-repository activity state machine.
///
/// At most one non-idle activity exists per repository at any time;
/// the engine's dispatch gate enforces this. The line buffers are
/// append-only and start empty when an operation is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    Idle,
    Refreshing,
    Pulling { lines: Vec<String> },
    Pruning { lines: Vec<String>, deleted: u32 },
}

impl Activity {
    pub fn is_busy(&self) -> bool {
        !matches!(self, Activity::Idle)
    }

    /// Append one streamed output line. Activities without a line
    /// buffer ignore it.
    pub fn push_line(&mut self, line: String) {
        match self {
            Activity::Pulling { lines } => lines.push(line),
            Activity::Pruning { lines, deleted } => {
                if line.starts_with(PRUNE_DELETED_PREFIX) {
                    *deleted += 1;
                }
                lines.push(line);
            }
            Activity::Idle | Activity::Refreshing => {}
        }
    }

    pub fn last_line(&self) -> Option<&str> {
        match self {
            Activity::Pulling { lines } | Activity::Pruning { lines, .. } => {
                lines.last().map(String::as_str)
            }
            Activity::Idle | Activity::Refreshing => None,
        }
    }
}

/// The operations that can run on a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Fetch the remote and recompute the synchronization state.
    Refresh,
    /// Rebase-based update onto the upstream branch.
    Pull,
    /// Delete local branches already merged into HEAD.
    Prune,
}

impl OpKind {
    /// The activity this operation occupies while running.
    pub fn activity(self) -> Activity {
        match self {
            OpKind::Refresh => Activity::Refreshing,
            OpKind::Pull => Activity::Pulling { lines: Vec::new() },
            OpKind::Prune => Activity::Pruning {
                lines: Vec::new(),
                deleted: 0,
            },
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Refresh => write!(f, "refresh"),
            OpKind::Pull => write!(f, "pull"),
            OpKind::Prune => write!(f, "prune"),
        }
    }
}

/// Result of a finished operation, kept beside the activity after the
/// machine returns to idle so callers can still render the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpOutcome {
    pub op: OpKind,
    pub exit_code: i32,
    /// Branches actually deleted; meaningful for prune only.
    pub deleted: u32,
    /// Final captured output line, if the operation produced any.
    pub last_line: Option<String>,
}

impl OpOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}
