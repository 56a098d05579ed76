pub mod discovery;
pub mod git;
pub mod process;
