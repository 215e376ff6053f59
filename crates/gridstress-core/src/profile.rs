//! Per-period values attached to assets (availability, demand, ratings).

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A per-snapshot quantity: either one value for the whole horizon or one
/// value per snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Profile {
    Constant(f64),
    Series(Vec<f64>),
}

/// Half-open interval `[start, end)` of snapshot indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotWindow {
    pub start: usize,
    pub end: usize,
}

impl SnapshotWindow {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn contains(&self, t: usize) -> bool {
        t >= self.start && t < self.end
    }

    /// A window is usable when it is non-empty and ends inside the horizon.
    pub fn fits(&self, horizon: usize) -> bool {
        self.start < self.end && self.end <= horizon
    }
}

impl Profile {
    pub fn constant(value: f64) -> Self {
        Profile::Constant(value)
    }

    /// Value at snapshot `t`. Series are length-checked by
    /// [`crate::Network::validate`], so a validated network never reads past the end.
    #[inline]
    pub fn at(&self, t: usize) -> f64 {
        match self {
            Profile::Constant(value) => *value,
            Profile::Series(values) => values.get(t).copied().unwrap_or(0.0),
        }
    }

    /// Number of values carried by a series, `None` for constants.
    pub fn series_len(&self) -> Option<usize> {
        match self {
            Profile::Constant(_) => None,
            Profile::Series(values) => Some(values.len()),
        }
    }

    /// Expand to exactly `horizon` values.
    pub fn values(&self, horizon: usize) -> Vec<f64> {
        (0..horizon).map(|t| self.at(t)).collect()
    }

    pub fn max_value(&self) -> f64 {
        match self {
            Profile::Constant(value) => *value,
            Profile::Series(values) => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    pub fn min_value(&self) -> f64 {
        match self {
            Profile::Constant(value) => *value,
            Profile::Series(values) => values.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }

    /// Multiply by `factor`, either everywhere or only inside `window`.
    ///
    /// A constant scaled over the full horizon stays constant; any windowed
    /// scaling materializes a series of `horizon` values.
    pub fn scaled(&self, factor: f64, window: Option<SnapshotWindow>, horizon: usize) -> Profile {
        match (self, window) {
            (Profile::Constant(value), None) => Profile::Constant(value * factor),
            (_, None) => Profile::Series(self.values(horizon).iter().map(|v| v * factor).collect()),
            (_, Some(window)) => Profile::Series(
                self.values(horizon)
                    .into_iter()
                    .enumerate()
                    .map(|(t, v)| if window.contains(t) { v * factor } else { v })
                    .collect(),
            ),
        }
    }
}

impl From<f64> for Profile {
    fn from(value: f64) -> Self {
        Profile::Constant(value)
    }
}

impl From<Vec<f64>> for Profile {
    fn from(values: Vec<f64>) -> Self {
        Profile::Series(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_scaled_without_window_stays_constant() {
        let p = Profile::constant(0.5).scaled(0.3, None, 10);
        assert_eq!(p, Profile::Constant(0.15));
    }

    #[test]
    fn test_windowed_scaling_only_touches_window() {
        let p = Profile::constant(1.0).scaled(0.0, Some(SnapshotWindow::new(2, 4)), 6);
        assert_eq!(p.values(6), vec![1.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_untagged_serde() {
        let c: Profile = serde_json::from_str("0.7").unwrap();
        assert_eq!(c, Profile::Constant(0.7));
        let s: Profile = serde_json::from_str("[1.0, 0.5]").unwrap();
        assert_eq!(s.series_len(), Some(2));
        assert_eq!(s.at(1), 0.5);
    }

    #[test]
    fn test_window_fits() {
        assert!(SnapshotWindow::new(72, 96).fits(168));
        assert!(!SnapshotWindow::new(5, 5).fits(168));
        assert!(!SnapshotWindow::new(100, 200).fits(168));
    }
}
