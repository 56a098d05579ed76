pub mod activity;
pub mod branch;
pub mod events;
pub mod repo;
pub mod state;

// Re-exports for convenience
pub use activity::*;
pub use branch::*;
pub use events::*;
pub use repo::*;
pub use state::*;
