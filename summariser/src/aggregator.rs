use std::path::{Path, PathBuf};

use itertools::Itertools;
use polars::prelude::*;
use walkdir::WalkDir;

use crate::analyze::with_confidence_intervals;
use crate::config::{AnalysisConfig, ConfigError};
use crate::frame::{
    err_column, f64_values, long_frame, mean_column, std_column, str_values, BUCKET, CI_METRICS,
    DELTA, METRICS, NF_NAME, TRIALS,
};
use crate::model::RunInfo;
use crate::run::{load_run, RunError};

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("No run directories found in {}", dir.display())]
    NoRuns { dir: PathBuf },
    #[error("Failed to load run {}: {source}", dir.display())]
    Run {
        dir: PathBuf,
        #[source]
        source: RunError,
    },
    #[error("Data frame error: {0}")]
    Frame(#[from] PolarsError),
    #[error("Could not list the scenario directory: {0}")]
    Io(#[from] walkdir::Error),
    #[error("Workload `{workload}` has no first snapshot in any run, cannot count the trials")]
    InsufficientTrials { workload: String },
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// One point of a charted series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    /// Mean time since the start of the run, in seconds
    pub x: f64,
    pub y: f64,
    /// Half width of the confidence interval, NaN when there is none
    pub err: f64,
}

/// The statistics of one scenario.
#[derive(Debug, Clone)]
pub struct ScenarioSummary {
    /// Name of the scenario directory
    pub name: String,
    pub runs: Vec<RunInfo>,
    /// Number of trials used for the confidence intervals
    pub trials: usize,
    /// Every sample of every run, see [crate::frame::long_frame]
    pub long: DataFrame,
    /// One row per (bucket, workload)
    pub aggregate: DataFrame,
}

impl ScenarioSummary {
    /// Mean of every aggregate column over all buckets, one row per workload.
    pub fn workload_means(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .aggregate
            .get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != NF_NAME && name.as_str() != BUCKET)
            .map(|name| col(name.clone()).cast(DataType::Float64).mean())
            .collect::<Vec<_>>();

        self.aggregate
            .clone()
            .lazy()
            .group_by([col(NF_NAME)])
            .agg(columns)
            .sort([NF_NAME], SortMultipleOptions::default())
            .collect()
    }

    /// Names of the workloads seen in any run, sorted.
    pub fn workloads(&self) -> PolarsResult<Vec<String>> {
        Ok(str_values(&self.aggregate, NF_NAME)?
            .into_iter()
            .sorted()
            .dedup()
            .collect())
    }

    /// The mean of `metric` over time for one workload, in bucket order.
    ///
    /// Metrics without interval columns get NaN error bars.
    pub fn workload_series(&self, nf_name: &str, metric: &str) -> PolarsResult<Vec<SeriesPoint>> {
        let frame = self
            .aggregate
            .clone()
            .lazy()
            .filter(col(NF_NAME).eq(lit(nf_name)))
            .sort([BUCKET], SortMultipleOptions::default())
            .collect()?;

        let x = f64_values(&frame, &mean_column(DELTA))?;
        let y = f64_values(&frame, &mean_column(metric))?;
        let err = match frame.column(&err_column(metric)) {
            Ok(_) => f64_values(&frame, &err_column(metric))?,
            Err(_) => vec![f64::NAN; frame.height()],
        };

        Ok(x.into_iter()
            .zip(y)
            .zip(err)
            .map(|((x, y), err)| SeriesPoint { x, y, err })
            .collect())
    }
}

/// Loads every run of a scenario and combines them into per bucket statistics.
pub struct ScenarioAggregator {
    config: AnalysisConfig,
}

impl ScenarioAggregator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// The run directories directly inside `dir`, in name order.
    ///
    /// Anything else in the scenario directory is skipped with a log message.
    pub fn discover_runs(&self, dir: &Path) -> Result<Vec<PathBuf>, AggregateError> {
        let mut runs = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            let is_run = entry
                .file_name()
                .to_string_lossy()
                .starts_with(&self.config.run_dir_prefix);
            if !is_run {
                info!("Skipping {}, it is not a run", entry.path().display());
                continue;
            }
            if !entry.file_type().is_dir() {
                warn!(
                    "Skipping {}, run names must be directories",
                    entry.path().display()
                );
                continue;
            }
            runs.push(entry.into_path());
        }

        if runs.is_empty() {
            return Err(AggregateError::NoRuns {
                dir: dir.to_path_buf(),
            });
        }
        Ok(runs)
    }

    pub fn aggregate(&self, dir: &Path) -> Result<ScenarioSummary, AggregateError> {
        let runs = self
            .discover_runs(dir)?
            .into_iter()
            .map(|run_dir| {
                debug!("read {}", run_dir.display());
                load_run(&run_dir, &self.config).map_err(|source| AggregateError::Run {
                    dir: run_dir,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for run in &runs {
            match run.metadata.n_ues {
                Some(n_ues) => info!(
                    "Loaded {} with {} samples and {n_ues} UEs",
                    run.name,
                    run.samples.len()
                ),
                None => info!("Loaded {} with {} samples", run.name, run.samples.len()),
            }
        }

        let long = long_frame(&runs)?;
        let trials = self.count_trials(&long)?;
        if trials < 2 {
            warn!(
                "Only {trials} trial(s) in {}, confidence intervals are undefined",
                dir.display()
            );
        }

        let aggregate = self.aggregate_frame(&long)?;
        let aggregate =
            with_confidence_intervals(aggregate, &CI_METRICS, trials, self.config.confidence)?;

        Ok(ScenarioSummary {
            name: dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            runs: runs.iter().map(|run| run.info()).collect(),
            trials,
            long,
            aggregate,
        })
    }

    /// Count the rows of the reference workload at the start of a run.
    ///
    /// Assumes the reference workload is sampled in every trial.
    fn count_trials(&self, long: &DataFrame) -> Result<usize, AggregateError> {
        let reference = self.config.reference_workload.as_str();
        let trials = long
            .clone()
            .lazy()
            .filter(col(NF_NAME).eq(lit(reference)).and(col(DELTA).eq(lit(0.0))))
            .collect()?
            .height();

        if trials == 0 {
            return Err(AggregateError::InsufficientTrials {
                workload: reference.to_string(),
            });
        }
        Ok(trials)
    }

    fn aggregate_frame(&self, long: &DataFrame) -> PolarsResult<DataFrame> {
        let mut aggs = METRICS
            .iter()
            .flat_map(|metric| {
                [
                    col(*metric).mean().alias(mean_column(metric)),
                    col(*metric).std(1).alias(std_column(metric)),
                ]
            })
            .collect::<Vec<_>>();
        aggs.push(len().alias(TRIALS));

        long.clone()
            .lazy()
            .with_columns(
                METRICS
                    .iter()
                    .map(|metric| col(*metric).fill_null(lit(0.0)))
                    .collect::<Vec<_>>(),
            )
            .group_by([col(BUCKET), col(NF_NAME)])
            .agg(aggs)
            .sort([BUCKET, NF_NAME], SortMultipleOptions::default())
            .collect()
    }
}
