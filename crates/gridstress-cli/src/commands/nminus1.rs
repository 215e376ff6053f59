use anyhow::{bail, Result};
use gridstress_cli::{HarnessConfig, RunArgs};
use gridstress_io::load_network;
use gridstress_scenarios::{n_minus_one, n_minus_one_subset, NMinusOneOptions};
use std::path::Path;

use super::run::run_candidates;

pub fn handle(
    config: &HarnessConfig,
    network_path: &Path,
    branches: &[String],
    include_links: bool,
    args: &RunArgs,
) -> Result<()> {
    let mut config = config.clone();
    config.apply_args(args)?;
    let network = load_network(network_path)?;
    let candidates = if branches.is_empty() {
        n_minus_one(&network, NMinusOneOptions { include_links })
    } else {
        n_minus_one_subset(&network, branches)?
    };
    if candidates.is_empty() {
        bail!("'{}' has no active branch to trip", network_path.display());
    }
    run_candidates(&config, network_path, &network, &candidates)
}
