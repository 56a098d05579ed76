use thiserror::Error;

/// Engine failures that are not representable as degraded repository
/// state. Almost everything else is folded into an `Error` variant of
/// the affected field instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("repository not found: {id}")]
    RepositoryNotFound { id: String },

    #[error("discovery failed: {source}")]
    Discovery { source: anyhow::Error },
}
