use std::path::PathBuf;

use clap::Parser;

/// Read a container config document of any API generation and print it in
/// the current format
#[derive(Parser, Debug)]
pub struct Decode {
    /// Path to the document, or '-' for standard input
    #[clap(required = true)]
    pub path: PathBuf,
}
