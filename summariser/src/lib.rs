//! Summarises the container resource usage recorded during repeated network function benchmark
//! runs.
//!
//! A scenario is a directory holding one directory per run. Each run has a `docker stats`
//! snapshot log and a metadata file giving the start time and duration of the run. The runs are
//! aligned on their first snapshot and averaged, see [summarise_scenario].

#[macro_use]
extern crate log;

use std::path::Path;

pub mod aggregator;
pub mod analyze;
pub mod config;
mod filter;
pub mod frame;
pub mod model;
pub mod plot;
pub mod rate;
pub mod report;
pub mod run;
pub mod snapshot;
pub mod table;
pub mod unit;

pub use aggregator::{AggregateError, ScenarioAggregator, ScenarioSummary};
pub use config::{AnalysisConfig, ConfigError};

/// Load every run of the scenario in `dir` and compute its statistics.
pub fn summarise_scenario(
    dir: &Path,
    config: &AnalysisConfig,
) -> Result<ScenarioSummary, AggregateError> {
    config.validate()?;
    info!("Summarising scenario {}", dir.display());
    let summary = ScenarioAggregator::new(config.clone()).aggregate(dir)?;
    info!(
        "Scenario {} has {} runs and {} trials",
        summary.name,
        summary.runs.len(),
        summary.trials
    );
    Ok(summary)
}
