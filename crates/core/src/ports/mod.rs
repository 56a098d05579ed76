pub mod discovery;
pub mod git;

// Re-exports
pub use discovery::*;
pub use git::*;
