use anyhow::{bail, Result};
use gridstress_core::graph_utils::graph_stats;
use gridstress_core::Severity;
use gridstress_io::load_network;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;
use tabwriter::TabWriter;

pub fn handle(network_path: &Path) -> Result<()> {
    let network = load_network(network_path)?;
    println!("Network {}", network_path.display());
    println!("{}", graph_stats(&network));

    let horizon = network.horizon();
    let mut demand = vec![0.0; horizon];
    for load in network.loads() {
        for (total, value) in demand.iter_mut().zip(load.p_set.values(horizon)) {
            *total += value;
        }
    }
    let peak = demand.iter().copied().fold(0.0, f64::max);
    println!("  Peak demand   : {peak:.3} MW");
    println!("  Horizon       : {:.1} h", network.snapshots.total_hours());

    let mut capacity: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for gen in network.generators() {
        let entry = capacity.entry(gen.carrier.as_str()).or_default();
        entry.0 += 1;
        entry.1 += gen.p_nom;
    }
    println!();
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "CARRIER\tUNITS\tCAPACITY MW")?;
    for (carrier, (units, p_nom)) in &capacity {
        let carrier = if carrier.is_empty() { "-" } else { carrier };
        writeln!(writer, "{carrier}\t{units}\t{p_nom:.3}")?;
    }
    writer.flush()?;

    let diagnostics = network.validate();
    if diagnostics.issues.is_empty() {
        println!("\nNo issues found");
        return Ok(());
    }
    println!("\nIssues:");
    for issue in &diagnostics.issues {
        println!("  {issue}");
    }
    if diagnostics.has_errors() {
        bail!("network has {} error(s)", diagnostics.count(Severity::Error));
    }
    Ok(())
}
