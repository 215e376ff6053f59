use chrono::{DateTime, Duration, Utc};

use crate::error::{GridError, GridResult};

/// Ordered snapshot timestamps with their weightings in hours.
///
/// Weightings scale energy (MW x h) in the objective, in storage balances and
/// in unserved-energy accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshots {
    timestamps: Vec<DateTime<Utc>>,
    weightings: Vec<f64>,
}

impl Snapshots {
    /// `periods` consecutive hourly snapshots starting at `start`.
    pub fn hourly(start: DateTime<Utc>, periods: usize) -> Self {
        let timestamps = (0..periods)
            .map(|i| start + Duration::hours(i as i64))
            .collect();
        Self {
            timestamps,
            weightings: vec![1.0; periods],
        }
    }

    /// Infer weightings from the spacing between timestamps. The last
    /// snapshot reuses the previous spacing; a single snapshot weighs one hour.
    pub fn from_timestamps(timestamps: Vec<DateTime<Utc>>) -> GridResult<Self> {
        if timestamps.is_empty() {
            return Err(GridError::Validation("snapshot list is empty".into()));
        }
        let mut weightings = Vec::with_capacity(timestamps.len());
        for pair in timestamps.windows(2) {
            let hours = (pair[1] - pair[0]).num_seconds() as f64 / 3600.0;
            if hours <= 0.0 {
                return Err(GridError::Validation(format!(
                    "snapshots must be strictly increasing ({} then {})",
                    pair[0], pair[1]
                )));
            }
            weightings.push(hours);
        }
        weightings.push(weightings.last().copied().unwrap_or(1.0));
        Ok(Self {
            timestamps,
            weightings,
        })
    }

    pub fn with_weightings(
        timestamps: Vec<DateTime<Utc>>,
        weightings: Vec<f64>,
    ) -> GridResult<Self> {
        if timestamps.len() != weightings.len() {
            return Err(GridError::Validation(format!(
                "{} snapshots but {} weightings",
                timestamps.len(),
                weightings.len()
            )));
        }
        if timestamps.is_empty() {
            return Err(GridError::Validation("snapshot list is empty".into()));
        }
        if let Some(w) = weightings.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(GridError::Validation(format!(
                "snapshot weighting {w} must be positive"
            )));
        }
        Ok(Self {
            timestamps,
            weightings,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn weightings(&self) -> &[f64] {
        &self.weightings
    }

    #[inline]
    pub fn weighting(&self, t: usize) -> f64 {
        self.weightings.get(t).copied().unwrap_or(1.0)
    }

    pub fn total_hours(&self) -> f64 {
        self.weightings.iter().sum()
    }
}

impl Default for Snapshots {
    /// One hourly snapshot at the Unix epoch.
    fn default() -> Self {
        Self::hourly(DateTime::UNIX_EPOCH, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_hourly() {
        let snaps = Snapshots::hourly(ts("2025-01-01T00:00:00Z"), 168);
        assert_eq!(snaps.len(), 168);
        assert_eq!(snaps.timestamps()[24], ts("2025-01-02T00:00:00Z"));
        assert_eq!(snaps.total_hours(), 168.0);
    }

    #[test]
    fn test_weightings_from_spacing() {
        let snaps = Snapshots::from_timestamps(vec![
            ts("2025-01-01T00:00:00Z"),
            ts("2025-01-01T03:00:00Z"),
            ts("2025-01-01T06:00:00Z"),
        ])
        .unwrap();
        assert_eq!(snaps.weightings(), &[3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_rejects_unordered_snapshots() {
        let err = Snapshots::from_timestamps(vec![
            ts("2025-01-01T03:00:00Z"),
            ts("2025-01-01T00:00:00Z"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }
}
