use polars::prelude::*;

use crate::model::RunSample;
use crate::run::Run;

pub const RUN: &str = "run";
pub const BUCKET: &str = "bucket";
pub const NF_NAME: &str = "nf_name";
pub const DELTA: &str = "delta";
pub const CPU: &str = "cpu";
pub const MEM: &str = "mem";
pub const NET_IO_TX: &str = "net_io_tx";
pub const NET_IO_RX: &str = "net_io_rx";
pub const BLOCK_IO_TX: &str = "block_io_tx";
pub const BLOCK_IO_RX: &str = "block_io_rx";
pub const NET_IO_TX_PER_S: &str = "net_io_tx_per_s";
pub const NET_IO_RX_PER_S: &str = "net_io_rx_per_s";
pub const TRIALS: &str = "trials";

/// Numeric columns of the long table that are averaged across trials.
pub const METRICS: [&str; 9] = [
    DELTA,
    CPU,
    MEM,
    NET_IO_TX,
    NET_IO_RX,
    BLOCK_IO_TX,
    BLOCK_IO_RX,
    NET_IO_TX_PER_S,
    NET_IO_RX_PER_S,
];

/// Metrics that get a confidence interval and can be charted with error bars.
pub const CI_METRICS: [&str; 4] = [CPU, MEM, NET_IO_TX_PER_S, NET_IO_RX_PER_S];

pub fn mean_column(metric: &str) -> String {
    format!("{metric}_mean")
}

pub fn std_column(metric: &str) -> String {
    format!("{metric}_std")
}

pub fn ci_lower_column(metric: &str) -> String {
    format!("{metric}_ci_lower")
}

pub fn ci_upper_column(metric: &str) -> String {
    format!("{metric}_ci_upper")
}

pub fn err_column(metric: &str) -> String {
    format!("{metric}_err")
}

/// Concatenate the samples of every run into one long table, one row per sample.
pub fn long_frame(runs: &[Run]) -> PolarsResult<DataFrame> {
    let samples = || runs.iter().flat_map(|run| run.samples.iter());
    let floats = |f: fn(&RunSample) -> f64| samples().map(f).collect::<Vec<_>>();

    let run_names = runs
        .iter()
        .flat_map(|run| std::iter::repeat_n(run.name.as_str(), run.samples.len()))
        .collect::<Vec<_>>();

    df!(
        RUN => run_names,
        BUCKET => samples().map(|s| s.bucket).collect::<Vec<_>>(),
        NF_NAME => samples().map(|s| s.nf_name.as_str()).collect::<Vec<_>>(),
        DELTA => floats(|s| s.delta),
        CPU => floats(|s| s.cpu),
        MEM => floats(|s| s.mem),
        NET_IO_TX => floats(|s| s.net_io_tx),
        NET_IO_RX => floats(|s| s.net_io_rx),
        BLOCK_IO_TX => floats(|s| s.block_io_tx),
        BLOCK_IO_RX => floats(|s| s.block_io_rx),
        NET_IO_TX_PER_S => floats(|s| s.net_io_tx_per_s),
        NET_IO_RX_PER_S => floats(|s| s.net_io_rx_per_s)
    )
}

/// Read a numeric column as floats, nulls become NaN.
pub fn f64_values(frame: &DataFrame, column: &str) -> PolarsResult<Vec<f64>> {
    let values = frame.column(column)?.cast(&DataType::Float64)?;
    Ok(values
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Read a string column as owned values, nulls become empty strings.
pub fn str_values(frame: &DataFrame, column: &str) -> PolarsResult<Vec<String>> {
    Ok(frame
        .column(column)?
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}
