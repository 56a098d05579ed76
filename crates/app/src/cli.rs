use clap::{Parser, ValueEnum};
use repofresh_core::domain::OpKind;
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "repofresh")]
#[command(about = "Monitor and bulk-update many Git repositories from one place")]
pub struct CliArgs {
    /// Directory to scan for repositories (overrides config)
    #[arg(long)]
    pub scan_dir: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Operation to run on every discovered repository after the scan
    #[arg(long, value_enum)]
    pub op: Option<OpArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OpArg {
    Refresh,
    Pull,
    Prune,
}

impl From<OpArg> for OpKind {
    fn from(arg: OpArg) -> Self {
        match arg {
            OpArg::Refresh => OpKind::Refresh,
            OpArg::Pull => OpKind::Pull,
            OpArg::Prune => OpKind::Prune,
        }
    }
}
