//! # runconfig
//! Turns `docker run` style arguments and container config documents of any
//! API generation into one normalized configuration, and reconciles or
//! compares such configurations.
mod commands;
mod observability;

use anyhow::Result;
use clap::{crate_version, CommandFactory, Parser};

use librunconfig_cli::{ConfigCmd, GlobalOpts};

#[derive(Parser, Debug)]
#[clap(version = crate_version!(), author = env!("CARGO_PKG_AUTHORS"))]
struct Opts {
    #[clap(flatten)]
    global: GlobalOpts,

    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Parser, Debug)]
enum SubCommand {
    #[clap(flatten)]
    Config(ConfigCmd),

    Completion(commands::completion::Completion),
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let mut app = Opts::command();

    if let Err(e) = observability::init(&opts) {
        eprintln!("log init failed: {e:?}");
    }

    tracing::debug!(args = ?std::env::args_os().collect::<Vec<_>>(), "started");

    match opts.subcmd {
        SubCommand::Config(cmd) => match cmd {
            ConfigCmd::RunConfig(run) => commands::run_config::run_config(run),
            ConfigCmd::Decode(decode) => commands::decode::decode(decode),
            ConfigCmd::Merge(merge) => commands::merge::merge(merge),
            ConfigCmd::Compare(compare) => {
                if !commands::compare::compare(compare)? {
                    std::process::exit(1);
                }
                Ok(())
            }
        },
        SubCommand::Completion(completion) => {
            commands::completion::completion(completion, &mut app)
        }
    }
}
