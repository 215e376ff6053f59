//! Seeded synthetic demand and availability profiles.
//!
//! Identical arguments (including the seed) give identical series, so runs
//! built on these profiles are reproducible bit for bit.

use gridstress_core::{Profile, SnapshotWindow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// `periods` evenly spaced points from 0 to `stop`, both included.
pub fn linspace(stop: f64, periods: usize) -> Vec<f64> {
    match periods {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n).map(|i| stop * i as f64 / (n - 1) as f64).collect(),
    }
}

/// `base + amplitude · sin(x)` with `x` spanning `half_cycles · π`.
pub fn sinusoidal_demand(periods: usize, base: f64, amplitude: f64, half_cycles: f64) -> Profile {
    Profile::Series(
        linspace(half_cycles * PI, periods)
            .into_iter()
            .map(|x| base + amplitude * x.sin())
            .collect(),
    )
}

/// Daylight-shaped availability: `max(0, sin(x))` with `x` spanning `half_cycles · π`.
pub fn half_sine_availability(periods: usize, half_cycles: f64) -> Profile {
    Profile::Series(
        linspace(half_cycles * PI, periods)
            .into_iter()
            .map(|x| x.sin().max(0.0))
            .collect(),
    )
}

/// Normally distributed availability clipped to `[0, 1]`.
pub fn clipped_normal_availability(periods: usize, mean: f64, std_dev: f64, seed: u64) -> Profile {
    let mut rng = StdRng::seed_from_u64(seed);
    Profile::Series(
        (0..periods)
            .map(|_| (mean + std_dev * standard_normal(&mut rng)).clamp(0.0, 1.0))
            .collect(),
    )
}

/// Overwrite the values inside `window` with `value` (lulls, outages).
pub fn with_window_value(
    profile: &Profile,
    window: SnapshotWindow,
    value: f64,
    periods: usize,
) -> Profile {
    Profile::Series(
        profile
            .values(periods)
            .into_iter()
            .enumerate()
            .map(|(t, v)| if window.contains(t) { value } else { v })
            .collect(),
    )
}

// Box-Muller
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
