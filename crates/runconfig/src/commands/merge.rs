use anyhow::{Context, Result};
use librunconfig::merge::{merge as merge_config, merge_host_config};
use librunconfig::{Config, HostConfig};
use librunconfig_cli::Merge;

use super::{load_document, print_document};

pub fn merge(args: Merge) -> Result<()> {
    let (mut config, mut host_config) = load_document(&args.user)?;
    let (image, image_host) = load_document(&args.image)?;
    merge_documents(
        &mut config,
        &mut host_config,
        &image,
        &image_host,
        args.skip_host_config,
    )?;
    print_document(&config, &host_config)
}

fn merge_documents(
    config: &mut Config,
    host_config: &mut HostConfig,
    image: &Config,
    image_host: &HostConfig,
    skip_host_config: bool,
) -> Result<()> {
    merge_config(config, image)
        .with_context(|| format!("failed to merge image config of {}", image.image))?;
    if !skip_host_config {
        merge_host_config(host_config, image_host);
    }
    Ok(())
}
