use std::io::{BufRead as _, Read};
use std::path::Path;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use nf_stats_run_model::{anchor_time_of_day, TimeWindow};

use crate::model::{Observation, ObservationTable};
use crate::rate::derive_rates;
use crate::unit::{parse_cpu, parse_io_pair, parse_mem_mib, ParseError};

/// Lines containing this are the column header printed above each snapshot.
const HEADER_MARKER: &str = "NAME";
/// Lines containing this are the time of day a snapshot was taken.
const TIMESTAMP_MARKER: char = ':';
const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.f";
/// name, cpu, mem, net io, block io
const ROW_FIELDS: usize = 5;

/// Reads the snapshots that `docker stats` printed during a run.
///
/// A log is a sequence of snapshots, each a timestamp line followed by one comma separated row per
/// workload:
///
/// ```text
/// NAME,CPU %,MEM USAGE / LIMIT,NET I/O,BLOCK I/O,PIDS
/// 14:03:22.104512
/// amf,0.50%,10.5MiB / 15.5GiB,1.2kB / 3.4kB,0B / 0B,5
/// smf,1.25%,20MiB / 15.5GiB,2.5kB / 1kB,0B / 0B,7
///
/// 14:03:23.107003
/// ...
/// ```
///
/// Only rows stamped inside the window are kept. Timestamps are assumed to never go backwards,
/// so reading stops at the first snapshot past the end of the window.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    window: TimeWindow,
    core_count: u16,
    capture_lag: TimeDelta,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("An error occurred while reading the input: {0}")]
    Io(#[from] std::io::Error),
    #[error("Line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },
}

enum State {
    AwaitingTimestamp,
    InSnapshot(NaiveDateTime),
}

impl SnapshotReader {
    /// Create a reader keeping the rows inside `window`, with 12 cores and a one second capture lag.
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            core_count: 12,
            capture_lag: TimeDelta::seconds(1),
        }
    }

    /// Builds a [`SnapshotReader`] normalising cpu percentages by `core_count`.
    pub fn core_count(mut self, core_count: u16) -> Self {
        self.core_count = core_count;
        self
    }

    /// Builds a [`SnapshotReader`] adding `secs` to every timestamp line.
    ///
    /// `docker stats` prints the time before it has collected the values that follow.
    pub fn capture_lag(mut self, secs: u32) -> Self {
        self.capture_lag = TimeDelta::seconds(i64::from(secs));
        self
    }

    /// Reads the snapshots from a reader and derives the network rates.
    pub fn read<R>(&self, reader: R) -> Result<ObservationTable, SnapshotError>
    where
        R: Read,
    {
        let mut observations = Vec::new();
        let mut state = State::AwaitingTimestamp;

        for (index, line) in std::io::BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            let line_number = index + 1;

            if let State::InSnapshot(timestamp) = state {
                if self.window.is_past(timestamp) {
                    trace!("Stopping at line {line_number}, {timestamp} is past the window");
                    break;
                }
            }

            if line.contains(HEADER_MARKER) {
                continue;
            }
            if line.contains(TIMESTAMP_MARKER) {
                let timestamp = self
                    .parse_timestamp(line)
                    .map_err(|source| SnapshotError::Parse {
                        line: line_number,
                        source,
                    })?;
                state = State::InSnapshot(timestamp);
                continue;
            }
            if line.is_empty() {
                continue;
            }

            let timestamp = match state {
                State::InSnapshot(timestamp) if self.window.contains(timestamp) => timestamp,
                _ => continue,
            };
            let observation = self
                .parse_row(timestamp, line)
                .map_err(|source| SnapshotError::Parse {
                    line: line_number,
                    source,
                })?;
            observations.push(observation);
        }

        let net_io_tx_per_s = derive_rates(&observations, |o| o.nf_name.as_str(), |o| o.net_io_tx);
        let net_io_rx_per_s = derive_rates(&observations, |o| o.nf_name.as_str(), |o| o.net_io_rx);

        Ok(ObservationTable {
            observations,
            net_io_tx_per_s,
            net_io_rx_per_s,
        })
    }

    /// Reads the snapshots from the file at the specified path.
    pub fn read_from_file<P>(&self, path: P) -> Result<ObservationTable, SnapshotError>
    where
        P: AsRef<Path>,
    {
        let file = std::fs::File::open(path)?;
        self.read(file)
    }

    fn parse_timestamp(&self, line: &str) -> Result<NaiveDateTime, ParseError> {
        let time = NaiveTime::parse_from_str(line, TIMESTAMP_FORMAT)
            .map_err(|_| ParseError::InvalidTimestamp(line.to_string()))?;
        Ok(anchor_time_of_day(time) + self.capture_lag)
    }

    fn parse_row(&self, timestamp: NaiveDateTime, row: &str) -> Result<Observation, ParseError> {
        let fields = row.split(',').map(str::trim).collect::<Vec<_>>();
        let [nf_name, cpu, mem, net_io, block_io, ..] = fields.as_slice() else {
            return Err(ParseError::MalformedRow {
                expected: ROW_FIELDS,
                row: row.to_string(),
            });
        };

        let (net_io_tx, net_io_rx) = parse_io_pair(net_io)?;
        let (block_io_tx, block_io_rx) = parse_io_pair(block_io)?;

        Ok(Observation {
            timestamp,
            nf_name: nf_name.to_string(),
            cpu: parse_cpu(cpu, self.core_count)?,
            mem: parse_mem_mib(mem)?,
            net_io_tx,
            net_io_rx,
            block_io_tx,
            block_io_rx,
        })
    }
}
