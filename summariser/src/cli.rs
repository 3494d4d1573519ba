use std::path::PathBuf;

use clap::Parser;
use nf_stats_summariser::AnalysisConfig;

#[derive(Debug, Parser)]
#[command(about, long_about = None)]
pub struct CliArgs {
    /// Scenario directories, each holding one directory per run.
    #[arg(required = true)]
    pub scenarios: Vec<PathBuf>,

    /// Directory the CSV files, run reports and charts are written to.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Number of cores of the machine the benchmark ran on.
    #[arg(long, default_value_t = 12)]
    pub cores: u16,

    /// Seconds of log kept before the start of each run.
    #[arg(long, default_value_t = 5)]
    pub pre_roll: u32,

    /// Seconds of log kept after the end of each run.
    #[arg(long, default_value_t = 10)]
    pub post_roll: u32,

    /// Seconds added to every snapshot timestamp.
    #[arg(long, default_value_t = 1)]
    pub capture_lag: u32,

    /// Confidence parameter of the intervals.
    #[arg(long, default_value_t = 0.05)]
    pub confidence: f64,

    /// Workload whose first snapshots give the number of trials.
    #[arg(long, default_value = "amf")]
    pub reference_workload: String,

    /// Key of the metadata line holding the run duration.
    #[arg(long, default_value = "N_ITERATIONS")]
    pub duration_marker: String,

    /// Key of the metadata line holding the number of UEs.
    #[arg(long, default_value = "N_UES")]
    pub ues_marker: String,

    /// Workloads left out of the charts.
    #[arg(long = "exclude", default_values_t = vec!["nr_gnb".to_string()])]
    pub excluded_workloads: Vec<String>,

    /// Save a chart per metric next to the CSV.
    #[arg(long)]
    pub plot: bool,

    /// Also write the loaded runs and their metadata as JSON.
    #[arg(long)]
    pub runs_report: bool,
}

impl CliArgs {
    pub fn to_config(&self) -> AnalysisConfig {
        AnalysisConfig::default()
            .core_count(self.cores)
            .padding(self.pre_roll, self.post_roll)
            .capture_lag(self.capture_lag)
            .confidence(self.confidence)
            .reference_workload(self.reference_workload.as_str())
            .duration_marker(self.duration_marker.as_str())
            .ues_marker(self.ues_marker.as_str())
            .excluded_workloads(self.excluded_workloads.clone())
    }
}
