use std::path::PathBuf;

use clap::Parser;

/// Check whether two container config documents are equivalent. Exits with
/// status 1 when they differ
#[derive(Parser, Debug)]
pub struct Compare {
    #[clap(required = true)]
    pub first: PathBuf,
    #[clap(required = true)]
    pub second: PathBuf,
    /// Compare the host configs as well
    #[clap(long)]
    pub host_config: bool,
    /// Do not print anything, only set the exit status
    #[clap(short, long)]
    pub quiet: bool,
}
