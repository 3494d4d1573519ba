use std::path::{Path, PathBuf};

use nf_stats_run_model::{load_run_metadata, MetadataError, RunMetadata, TimeWindow};
use walkdir::WalkDir;

use crate::config::AnalysisConfig;
use crate::model::{ObservationTable, RunInfo, RunSample};
use crate::snapshot::{SnapshotError, SnapshotReader};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("No file containing `{marker}` in {}", dir.display())]
    NotFound { dir: PathBuf, marker: String },
    #[error("No snapshots fell inside the window of {}", dir.display())]
    EmptyRun { dir: PathBuf },
    #[error("Could not read run metadata: {0}")]
    Metadata(#[from] MetadataError),
    #[error("Could not read snapshots from {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },
    #[error("Could not list the run directory: {0}")]
    Io(#[from] walkdir::Error),
}

/// One execution of the benchmark, re-based so that its first snapshot is at `delta = 0`.
#[derive(Debug, Clone)]
pub struct Run {
    pub name: String,
    pub dir: PathBuf,
    pub metadata: RunMetadata,
    pub window: TimeWindow,
    pub samples: Vec<RunSample>,
}

impl Run {
    pub fn info(&self) -> RunInfo {
        RunInfo {
            name: self.name.clone(),
            metadata: self.metadata,
            window: self.window,
            observations: self.samples.len(),
        }
    }
}

/// The first file directly inside `dir`, in name order, whose name contains `marker`.
pub fn find_in_dir(dir: &Path, marker: &str) -> Result<PathBuf, RunError> {
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() && entry.file_name().to_string_lossy().contains(marker) {
            return Ok(entry.into_path());
        }
    }

    Err(RunError::NotFound {
        dir: dir.to_path_buf(),
        marker: marker.to_string(),
    })
}

/// Load the metadata and the windowed snapshots of the run stored in `dir`.
pub fn load_run(dir: &Path, config: &AnalysisConfig) -> Result<Run, RunError> {
    let stats_path = find_in_dir(dir, &config.stats_file_marker)?;
    let metadata_path = find_in_dir(dir, &config.metadata_file_marker)?;

    let metadata = load_run_metadata(&metadata_path, &config.metadata_markers)?;
    let window = metadata.window(config.pre_roll_secs, config.post_roll_secs);
    debug!(
        "Run {} started at {} for {}s, reading snapshots between {} and {}",
        dir.display(),
        metadata.started_at,
        metadata.duration_secs,
        window.start,
        window.end
    );

    let table = SnapshotReader::new(window)
        .core_count(config.core_count)
        .capture_lag(config.capture_lag_secs)
        .read_from_file(&stats_path)
        .map_err(|source| RunError::Parse {
            path: stats_path.clone(),
            source,
        })?;

    if table.is_empty() {
        return Err(RunError::EmptyRun {
            dir: dir.to_path_buf(),
        });
    }

    Ok(Run {
        name: dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        dir: dir.to_path_buf(),
        metadata,
        window,
        samples: rebase(table),
    })
}

/// Express every observation relative to the first one of the table.
///
/// All rows of one snapshot share a timestamp, so `bucket` counts the snapshots seen so far.
fn rebase(table: ObservationTable) -> Vec<RunSample> {
    let Some(origin) = table.observations.first().map(|o| o.timestamp) else {
        return Vec::new();
    };

    let mut bucket = 0;
    let mut previous = origin;
    table
        .observations
        .into_iter()
        .zip(table.net_io_tx_per_s)
        .zip(table.net_io_rx_per_s)
        .map(|((observation, net_io_tx_per_s), net_io_rx_per_s)| {
            if observation.timestamp != previous {
                bucket += 1;
                previous = observation.timestamp;
            }
            let offset = observation.timestamp - origin;

            RunSample {
                bucket,
                delta: offset.num_microseconds().unwrap_or(i64::MAX) as f64 / 1e6,
                nf_name: observation.nf_name,
                cpu: observation.cpu,
                mem: observation.mem,
                net_io_tx: observation.net_io_tx,
                net_io_rx: observation.net_io_rx,
                block_io_tx: observation.block_io_tx,
                block_io_rx: observation.block_io_rx,
                net_io_tx_per_s,
                net_io_rx_per_s,
            }
        })
        .collect()
}
