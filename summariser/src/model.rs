use chrono::NaiveDateTime;
use nf_stats_run_model::{RunMetadata, TimeWindow};
use serde::{Deserialize, Serialize};

/// One row of a resource usage snapshot: the state of a single workload at a point in time.
///
/// Counters are cumulative since the container started.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub nf_name: String,
    /// Percent of the whole machine, see [crate::unit::parse_cpu]
    pub cpu: f64,
    /// MiB
    pub mem: f64,
    /// Bytes
    pub net_io_tx: f64,
    pub net_io_rx: f64,
    pub block_io_tx: f64,
    pub block_io_rx: f64,
}

/// The observations of one log file together with their derived network rates.
///
/// The rate vectors are parallel to `observations`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    pub observations: Vec<Observation>,
    pub net_io_tx_per_s: Vec<f64>,
    pub net_io_rx_per_s: Vec<f64>,
}

impl ObservationTable {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// An observation re-based onto the timeline of its run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSample {
    /// Ordinal of the snapshot within the run, starting at 0
    pub bucket: u32,
    /// Seconds since the first observation of the run, microsecond precision
    pub delta: f64,
    pub nf_name: String,
    pub cpu: f64,
    pub mem: f64,
    pub net_io_tx: f64,
    pub net_io_rx: f64,
    pub block_io_tx: f64,
    pub block_io_rx: f64,
    pub net_io_tx_per_s: f64,
    pub net_io_rx_per_s: f64,
}

/// What is reported about each loaded run alongside the statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub name: String,
    pub metadata: RunMetadata,
    pub window: TimeWindow,
    pub observations: usize,
}
