use nf_stats_run_model::MetadataMarkers;

/// Everything that shapes how a scenario is read and summarised.
///
/// Build it from the defaults and override what differs:
///
/// ```
/// use nf_stats_summariser::AnalysisConfig;
///
/// let config = AnalysisConfig::default()
///     .core_count(8)
///     .duration_marker("DURATION");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Divisor turning docker's per core cpu percentage into a whole machine percentage.
    pub core_count: u16,
    /// Seconds of log kept before the advertised start of a run.
    pub pre_roll_secs: u32,
    /// Seconds of log kept after the advertised end of a run.
    pub post_roll_secs: u32,
    /// Seconds added to every snapshot timestamp.
    pub capture_lag_secs: u32,
    /// Passed as-is to `(1 + confidence) / 2` when picking the t quantile.
    pub confidence: f64,
    /// The workload whose first snapshots are counted to find the number of trials.
    pub reference_workload: String,
    /// Children of a scenario directory starting with this are runs.
    pub run_dir_prefix: String,
    /// Marks the snapshot log within a run directory.
    pub stats_file_marker: String,
    /// Marks the metadata file within a run directory.
    pub metadata_file_marker: String,
    pub metadata_markers: MetadataMarkers,
    /// Workloads left out of charts.
    pub excluded_workloads: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            core_count: 12,
            pre_roll_secs: 5,
            post_roll_secs: 10,
            capture_lag_secs: 1,
            confidence: 0.05,
            reference_workload: "amf".to_string(),
            run_dir_prefix: "test".to_string(),
            stats_file_marker: "docker_stats".to_string(),
            metadata_file_marker: "general".to_string(),
            metadata_markers: MetadataMarkers::default(),
            excluded_workloads: vec!["nr_gnb".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("The core count must be at least 1")]
    ZeroCores,
    #[error("The confidence must be within (0, 1), got {0}")]
    ConfidenceOutOfRange(f64),
}

impl AnalysisConfig {
    /// Builds an [`AnalysisConfig`] with the specified core count.
    pub fn core_count(mut self, core_count: u16) -> Self {
        self.core_count = core_count;
        self
    }

    /// Builds an [`AnalysisConfig`] with the specified window padding, in seconds.
    pub fn padding(mut self, pre_roll_secs: u32, post_roll_secs: u32) -> Self {
        self.pre_roll_secs = pre_roll_secs;
        self.post_roll_secs = post_roll_secs;
        self
    }

    /// Builds an [`AnalysisConfig`] with the specified capture lag, in seconds.
    pub fn capture_lag(mut self, secs: u32) -> Self {
        self.capture_lag_secs = secs;
        self
    }

    /// Builds an [`AnalysisConfig`] with the specified confidence.
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Builds an [`AnalysisConfig`] with the specified reference workload.
    pub fn reference_workload(mut self, name: impl Into<String>) -> Self {
        self.reference_workload = name.into();
        self
    }

    /// Builds an [`AnalysisConfig`] with the specified marker for the duration metadata line.
    pub fn duration_marker(mut self, marker: impl Into<String>) -> Self {
        self.metadata_markers = self.metadata_markers.duration(marker);
        self
    }

    /// Builds an [`AnalysisConfig`] with the specified marker for the UE count metadata line.
    pub fn ues_marker(mut self, marker: impl Into<String>) -> Self {
        self.metadata_markers = self.metadata_markers.ues(marker);
        self
    }

    /// Builds an [`AnalysisConfig`] with the specified workloads left out of charts.
    pub fn excluded_workloads(mut self, names: Vec<String>) -> Self {
        self.excluded_workloads = names;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.core_count == 0 {
            return Err(ConfigError::ZeroCores);
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ConfigError::ConfidenceOutOfRange(self.confidence));
        }
        Ok(())
    }
}
