use anyhow::Result;
use librunconfig_cli::Decode;

use super::{load_document, print_document};

pub fn decode(args: Decode) -> Result<()> {
    let (config, host_config) = load_document(&args.path)?;
    tracing::debug!(path = %args.path.display(), image = %config.image, "decoded document");
    print_document(&config, &host_config)
}
