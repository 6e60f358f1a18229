use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use librunconfig::decode::{decode_container_config, encode_container_config};
use librunconfig::{Config, HostConfig};
use librunconfig_cli::STDIN_PATH;

pub mod compare;
pub mod completion;
pub mod decode;
pub mod merge;
pub mod run_config;

fn load_document<P: AsRef<Path>>(path: P) -> Result<(Config, HostConfig)> {
    let path = path.as_ref();
    if path == Path::new(STDIN_PATH) {
        return decode_container_config(io::stdin().lock())
            .context("failed to decode container config from stdin");
    }

    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    decode_container_config(BufReader::new(file))
        .with_context(|| format!("failed to decode container config {}", path.display()))
}

fn write_document<W: Write>(mut out: W, config: &Config, host_config: &HostConfig) -> Result<()> {
    encode_container_config(&mut out, config, host_config)
        .context("failed to encode container config")?;
    writeln!(out)?;
    Ok(())
}

fn print_document(config: &Config, host_config: &HostConfig) -> Result<()> {
    write_document(io::stdout().lock(), config, host_config)
}
