use std::fmt::Debug;
use std::path::PathBuf;

use clap::Parser;

mod compare;
mod decode;
mod merge;
mod run;

pub use compare::Compare;
pub use decode::Decode;
pub use merge::Merge;
pub use run::Run;

/// Path argument that reads standard input instead of a file.
pub const STDIN_PATH: &str = "-";

#[derive(Parser, Debug)]
pub enum ConfigCmd {
    RunConfig(Run),
    Decode(Decode),
    Merge(Merge),
    Compare(Compare),
}

#[derive(Parser, Debug)]
pub struct GlobalOpts {
    /// set the log file to write logs to (default is '/dev/stderr')
    #[clap(long, overrides_with("log"))]
    pub log: Option<PathBuf>,
    /// change log level to debug, but the `log-level` flag takes precedence
    #[clap(long)]
    pub debug: bool,
    /// set the log format ('text' (default), or 'json') (default: "text")
    #[clap(long)]
    pub log_format: Option<String>,
    /// set the log level (default is 'error')
    #[clap(long)]
    pub log_level: Option<String>,
    /// also send logs to the systemd journal
    #[clap(long)]
    pub systemd_log: bool,
}
