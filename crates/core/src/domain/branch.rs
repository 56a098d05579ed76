use serde::{Deserialize, Serialize};

/// Where HEAD points. Exactly one variant holds at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Branch {
    /// HEAD is on a named local branch.
    OnBranch { name: String },
    /// HEAD points directly at a commit.
    Detached { commit_id: String },
    /// No usable HEAD: unborn branch or a failed lookup.
    NoBranch { reason: String },
}

impl Branch {
    /// The branch name, when HEAD is on one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Branch::OnBranch { name } => Some(name),
            Branch::Detached { .. } | Branch::NoBranch { .. } => None,
        }
    }
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Branch::OnBranch { name } => write!(f, "{name}"),
            Branch::Detached { commit_id } => write!(f, "detached@{commit_id}"),
            Branch::NoBranch { reason } => write!(f, "(no branch: {reason})"),
        }
    }
}
