use anyhow::Result;
use librunconfig::compare::{compare as compare_config, compare_host_config};
use librunconfig_cli::Compare;

use super::load_document;

/// Returns whether the two documents are equivalent.
pub fn compare(args: Compare) -> Result<bool> {
    let (first, first_host) = load_document(&args.first)?;
    let (second, second_host) = load_document(&args.second)?;

    let same = compare_config(&first, &second)
        && (!args.host_config || compare_host_config(&first_host, &second_host));
    tracing::debug!(same, host_config = args.host_config, "compared documents");

    if !args.quiet {
        println!("{}", if same { "equivalent" } else { "different" });
    }
    Ok(same)
}
