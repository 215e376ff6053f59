use anyhow::{Context, Result};
use gridstress_cli::TsCommands;
use gridstress_ts::{parse_date, read_timeseries_csv};
use tracing::info;

pub fn handle(command: &TsCommands) -> Result<()> {
    match command {
        TsCommands::Slice {
            input,
            start,
            end,
            out,
            timestamp_column,
        } => {
            let series = read_timeseries_csv(input, timestamp_column)?;
            let start = parse_date(start).context("parsing --start")?;
            let end = parse_date(end).context("parsing --end")?;
            let sliced = series.slice_dates(start, end)?;
            sliced.write_csv(out)?;
            info!(rows = sliced.len(), of = series.len(), "sliced time series");
            println!(
                "Sliced {} of {} rows ({start} to {end}) into {}",
                sliced.len(),
                series.len(),
                out.display()
            );
            Ok(())
        }
    }
}
