use std::path::PathBuf;

use clap::Parser;

/// Fill the unset fields of a user config from an image config
#[derive(Parser, Debug)]
pub struct Merge {
    /// Document holding the user's configuration, or '-' for standard input
    #[clap(required = true)]
    pub user: PathBuf,
    /// Document holding the image's default configuration
    #[clap(required = true)]
    pub image: PathBuf,
    /// Leave the host config of the user document untouched
    #[clap(long)]
    pub skip_host_config: bool,
}
