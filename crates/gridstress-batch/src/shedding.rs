use gridstress_core::{Carrier, Gen, GridResult, Network};
use serde::{Deserialize, Serialize};

/// Whether unserved demand is priced in or makes a scenario infeasible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SheddingPolicy {
    /// Solve scenarios as built; a stranded load is infeasible.
    #[default]
    Disabled,
    /// Add an `Unserved_<bus>` unit of `carrier` to every bus that lacks one.
    Enabled {
        marginal_cost: f64,
        carrier: String,
        p_nom: f64,
    },
}

impl SheddingPolicy {
    pub const DEFAULT_MARGINAL_COST: f64 = 10_000.0;
    pub const DEFAULT_CARRIER: &'static str = "unserved";
    pub const DEFAULT_P_NOM: f64 = 1.0e4;

    /// Enabled with the default price, carrier and per-bus capacity.
    pub fn enabled() -> Self {
        SheddingPolicy::Enabled {
            marginal_cost: Self::DEFAULT_MARGINAL_COST,
            carrier: Self::DEFAULT_CARRIER.to_string(),
            p_nom: Self::DEFAULT_P_NOM,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, SheddingPolicy::Enabled { .. })
    }

    pub fn carrier(&self) -> Option<&str> {
        match self {
            SheddingPolicy::Disabled => None,
            SheddingPolicy::Enabled { carrier, .. } => Some(carrier),
        }
    }

    /// Copy of `network` with the shedding units this policy asks for.
    pub fn apply(&self, network: &Network) -> GridResult<Network> {
        let mut out = network.clone();
        let SheddingPolicy::Enabled {
            marginal_cost,
            carrier,
            p_nom,
        } = self
        else {
            return Ok(out);
        };

        if !out.carriers.contains_key(carrier) {
            out.add_carrier(Carrier {
                name: carrier.clone(),
                co2_emissions: 0.0,
            });
        }
        let buses: Vec<_> = network
            .buses()
            .into_iter()
            .filter(|bus| {
                !network
                    .generators_at_bus(bus.id)
                    .iter()
                    .any(|g| &g.carrier == carrier)
            })
            .map(|bus| (bus.id, unserved_name(&bus.name)))
            .collect();
        for (bus, name) in buses {
            let id = out.next_generator_id();
            out.add_generator(
                Gen::new(id, name, bus)
                    .with_capacity(*p_nom)
                    .with_marginal_cost(*marginal_cost)
                    .with_carrier(carrier.as_str()),
            )?;
        }
        Ok(out)
    }
}

/// `Unserved_<bus>` with whitespace replaced, e.g. `Unserved_Bus_4`.
pub fn unserved_name(bus: &str) -> String {
    let bus: String = bus
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("Unserved_{bus}")
}
