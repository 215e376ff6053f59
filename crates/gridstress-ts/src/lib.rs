//! Historical time-series ingestion.
//!
//! A source is a CSV table keyed by a timestamp column (`utc_timestamp` by
//! default) with numeric columns for demand and renewable output. Tables are
//! read with polars, sliced by date and turned into snapshots and profiles.

use std::{fs, fs::File, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use gridstress_core::{Profile, Snapshots};
use polars::prelude::*;

pub const DEFAULT_TIMESTAMP_COLUMN: &str = "utc_timestamp";

/// A CSV table with a parsed timestamp index.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    frame: DataFrame,
    timestamp_column: String,
    timestamps: Vec<DateTime<Utc>>,
}

pub fn read_timeseries_csv(path: &Path, timestamp_column: &str) -> Result<TimeSeries> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let frame = CsvReader::new(&mut file)
        .has_header(true)
        .finish()
        .with_context(|| format!("reading CSV file {}", path.display()))?;
    TimeSeries::from_frame(frame, timestamp_column)
}

impl TimeSeries {
    pub fn from_frame(frame: DataFrame, timestamp_column: &str) -> Result<Self> {
        let column = frame
            .column(timestamp_column)
            .with_context(|| format!("timestamp column '{timestamp_column}' not found"))?;
        let values = column
            .utf8()
            .with_context(|| format!("timestamp column '{timestamp_column}' must hold text"))?;
        let mut timestamps = Vec::with_capacity(values.len());
        for (row, value) in values.into_iter().enumerate() {
            let value = value.ok_or_else(|| anyhow!("missing timestamp at row {row}"))?;
            timestamps.push(parse_timestamp(value)?);
        }
        if timestamps.windows(2).any(|pair| pair[1] <= pair[0]) {
            bail!("timestamps in '{timestamp_column}' must be strictly increasing");
        }
        Ok(Self {
            frame,
            timestamp_column: timestamp_column.to_string(),
            timestamps,
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

    /// Value columns, i.e. every column except the timestamp.
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .filter(|name| *name != self.timestamp_column)
            .map(String::from)
            .collect()
    }

    /// Rows whose timestamp falls on any day from `start` to `end`, both inclusive.
    pub fn slice_dates(&self, start: NaiveDate, end: NaiveDate) -> Result<TimeSeries> {
        if end < start {
            bail!("slice end {end} is before start {start}");
        }
        let from = Utc.from_utc_datetime(&start.and_time(chrono::NaiveTime::MIN));
        let until =
            Utc.from_utc_datetime(&end.and_time(chrono::NaiveTime::MIN)) + Duration::days(1);
        self.filter_rows(|ts| ts >= from && ts < until)
    }

    fn filter_rows<F>(&self, keep: F) -> Result<TimeSeries>
    where
        F: Fn(DateTime<Utc>) -> bool,
    {
        let flags: Vec<bool> = self.timestamps.iter().map(|ts| keep(*ts)).collect();
        let mask_series = Series::new("mask", flags.clone());
        let mask = mask_series.bool()?;
        let frame = self.frame.filter(mask).context("slicing time series")?;
        let timestamps = self
            .timestamps
            .iter()
            .zip(flags)
            .filter(|(_, keep)| *keep)
            .map(|(ts, _)| *ts)
            .collect();
        Ok(TimeSeries {
            frame,
            timestamp_column: self.timestamp_column.clone(),
            timestamps,
        })
    }

    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let series = self
            .frame
            .column(name)
            .with_context(|| format!("column '{name}' not found"))?
            .cast(&DataType::Float64)
            .with_context(|| format!("casting column '{name}' to Float64"))?;
        let values = series.f64()?;
        values
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| anyhow!("missing value in column '{name}' at row {row}"))
            })
            .collect()
    }

    /// Column as a per-snapshot profile (e.g. a load's `p_set`).
    pub fn profile(&self, name: &str) -> Result<Profile> {
        Ok(Profile::Series(self.column(name)?))
    }

    /// Column divided by its maximum, for use as an availability (`p_max_pu`).
    pub fn normalized_profile(&self, name: &str) -> Result<Profile> {
        let values = self.column(name)?;
        let peak = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !(peak > 0.0) {
            bail!("column '{name}' has no positive value to normalize by");
        }
        Ok(Profile::Series(values.iter().map(|v| (v / peak).max(0.0)).collect()))
    }

    pub fn snapshots(&self) -> Result<Snapshots> {
        Snapshots::from_timestamps(self.timestamps.clone()).context("deriving snapshots")
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut frame = self.frame.clone();
        let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        CsvWriter::new(&mut file)
            .finish(&mut frame)
            .context("writing CSV file")
    }
}

/// Accepts RFC 3339, `%Y-%m-%d %H:%M:%S`, `%Y-%m-%dT%H:%M:%S` (taken as UTC)
/// and bare dates.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
    }
    Err(anyhow!("parsing timestamp '{value}'; use RFC3339 or '%Y-%m-%d %H:%M:%S'"))
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("parsing date '{value}'; expected YYYY-MM-DD"))
}
