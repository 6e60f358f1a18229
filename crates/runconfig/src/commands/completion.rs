use std::io;

use anyhow::Result;
use clap::{Command, Parser};
use clap_complete::{generate, Generator, Shell};

/// Generate scripts for shell completion
#[derive(Debug, Parser)]
pub struct Completion {
    #[clap(long = "shell", short = 's', value_enum)]
    pub shell: Shell,
}

pub fn completion(args: Completion, app: &mut Command) -> Result<()> {
    generate_completions(args.shell, app, &mut io::stdout());
    Ok(())
}

fn generate_completions<G: Generator>(gen: G, app: &mut Command, out: &mut dyn io::Write) {
    let name = app.get_name().to_string();
    generate(gen, app, name, out);
}
