use anyhow::{anyhow, Result};
use gridstress_cli::{HarnessConfig, RunArgs};
use gridstress_io::load_network;
use gridstress_scenarios::{
    load_spec_from_path, network_path, resolve_scenarios, scenario_candidates,
};
use std::path::Path;

use super::run::run_candidates;

pub fn handle(
    config: &HarnessConfig,
    network: Option<&Path>,
    spec_path: &Path,
    args: &RunArgs,
) -> Result<()> {
    let mut config = config.clone();
    config.apply_args(args)?;
    let set = load_spec_from_path(spec_path)?;
    let scenarios = resolve_scenarios(&set)?;
    let network_file = network
        .map(Path::to_path_buf)
        .or_else(|| network_path(&set, spec_path))
        .ok_or_else(|| {
            anyhow!(
                "no network given and '{}' does not name one",
                spec_path.display()
            )
        })?;
    let network = load_network(&network_file)?;
    run_candidates(&config, &network_file, &network, &scenario_candidates(&scenarios))
}
