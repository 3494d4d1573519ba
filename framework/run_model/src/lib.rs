use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Read};
use std::path::Path;

/// Format of the time-of-day token leading the "started" line, once `-` has been replaced by `:`.
const STARTED_FORMAT: &str = "%H:%M:%S";
/// Number of characters making up the time-of-day token of the "started" line.
const STARTED_TOKEN_LEN: usize = 8;

/// Anchor a time of day on a fixed date.
///
/// Neither the metadata file nor the resource usage logs carry a date, only a time of day. Every
/// time in a run is placed on the same date so that a padded window reaching back past midnight
/// stays ordered instead of wrapping around.
pub fn anchor_time_of_day(time: NaiveTime) -> NaiveDateTime {
    NaiveDate::default().and_time(time)
}

/// Metadata of a single run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunMetadata {
    /// The wall-clock time the run started, anchored with [anchor_time_of_day]
    pub started_at: NaiveDateTime,
    /// The duration that the run was configured with, in seconds
    pub duration_secs: u32,
    /// The number of UEs connected during the run
    ///
    /// Not every scenario sets this, idle runs for example have no UEs.
    pub n_ues: Option<u32>,
}

impl RunMetadata {
    /// Compute the padded time window of the run.
    ///
    /// The window is inclusive on both ends and spans
    /// `[started_at - pre_roll, started_at + duration + post_roll]`.
    pub fn window(&self, pre_roll_secs: u32, post_roll_secs: u32) -> TimeWindow {
        TimeWindow {
            start: self.started_at - TimeDelta::seconds(i64::from(pre_roll_secs)),
            end: self.started_at
                + TimeDelta::seconds(i64::from(self.duration_secs))
                + TimeDelta::seconds(i64::from(post_roll_secs)),
        }
    }
}

/// An inclusive time window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Create a window spanning `[start, end]`
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Whether the given time falls inside the window, bounds included
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        time >= self.start && time <= self.end
    }

    /// Whether `time` is after the end of the window.
    pub fn is_past(&self, time: NaiveDateTime) -> bool {
        time > self.end
    }
}

/// The markers used to recognise lines of a metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataMarkers {
    /// Marks the line that starts with the time the run started
    pub started: String,
    /// Marks the `<key>: <count>` line carrying the number of UEs
    pub ues: String,
    /// Marks the `<key>: <seconds>` line carrying the run duration
    pub duration: String,
}

impl Default for MetadataMarkers {
    fn default() -> Self {
        Self {
            started: "started".to_string(),
            ues: "N_UES".to_string(),
            duration: "N_ITERATIONS".to_string(),
        }
    }
}

impl MetadataMarkers {
    /// Use a different marker for the duration line, some scenarios record it as `DURATION`.
    pub fn duration(mut self, marker: impl Into<String>) -> Self {
        self.duration = marker.into();
        self
    }

    /// Use a different marker for the UE count line.
    pub fn ues(mut self, marker: impl Into<String>) -> Self {
        self.ues = marker.into();
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No line containing `{marker}` with the run start time")]
    MissingStartTime { marker: String },
    #[error("No line containing `{marker}` with the run duration")]
    MissingDuration { marker: String },
    #[error("Invalid start time in line `{line}`")]
    InvalidStartTime { line: String },
    #[error("Invalid value for `{marker}` in line `{line}`")]
    InvalidValue { marker: String, line: String },
}

/// Parse the metadata of a run from a reader.
///
/// The file is line oriented. Lines are matched against the markers in order: the start time
/// first, then the UE count, then the duration. Missing start time or duration is an error, a
/// missing UE count is not.
pub fn parse_run_metadata<R: Read>(
    reader: R,
    markers: &MetadataMarkers,
) -> Result<RunMetadata, MetadataError> {
    let reader = std::io::BufReader::new(reader);
    let mut started_at = None;
    let mut duration_secs = None;
    let mut n_ues = None;

    for line in reader.lines() {
        let line = line?;
        if line.contains(&markers.started) {
            started_at = Some(parse_started(&line)?);
        } else if line.contains(&markers.ues) {
            n_ues = Some(parse_value(&line, &markers.ues)?);
        } else if line.contains(&markers.duration) {
            duration_secs = Some(parse_value(&line, &markers.duration)?);
        }
    }

    Ok(RunMetadata {
        started_at: started_at.ok_or_else(|| MetadataError::MissingStartTime {
            marker: markers.started.clone(),
        })?,
        duration_secs: duration_secs.ok_or_else(|| MetadataError::MissingDuration {
            marker: markers.duration.clone(),
        })?,
        n_ues,
    })
}

/// Load the metadata of a run from a file
pub fn load_run_metadata(
    path: impl AsRef<Path>,
    markers: &MetadataMarkers,
) -> Result<RunMetadata, MetadataError> {
    let file = std::fs::File::open(path)?;
    parse_run_metadata(file, markers)
}

fn parse_started(line: &str) -> Result<NaiveDateTime, MetadataError> {
    let invalid = || MetadataError::InvalidStartTime {
        line: line.to_string(),
    };
    let token = line.get(..STARTED_TOKEN_LEN).ok_or_else(invalid)?;
    let time = NaiveTime::parse_from_str(&token.replace('-', ":"), STARTED_FORMAT)
        .map_err(|_| invalid())?;
    Ok(anchor_time_of_day(time))
}

/// Parse the integer after the first `:` of the line, dropping a trailing unit such as `s`.
fn parse_value(line: &str, marker: &str) -> Result<u32, MetadataError> {
    let invalid = || MetadataError::InvalidValue {
        marker: marker.to_string(),
        line: line.to_string(),
    };
    let value = line.split(':').nth(1).ok_or_else(invalid)?;
    value
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn time(h: u32, m: u32, s: u32) -> NaiveDateTime {
        anchor_time_of_day(NaiveTime::from_hms_opt(h, m, s).unwrap())
    }

    #[test]
    fn parse_full_metadata() {
        let content = "14-03-20 test started\nN_UES: 10\nN_ITERATIONS: 30s\n14-03-55 test finished\n";
        let metadata = parse_run_metadata(content.as_bytes(), &MetadataMarkers::default()).unwrap();

        assert_eq!(
            RunMetadata {
                started_at: time(14, 3, 20),
                duration_secs: 30,
                n_ues: Some(10),
            },
            metadata
        );
    }

    #[test]
    fn parse_duration_without_unit() {
        let content = "09-00-00 started\nDURATION: 120\n";
        let markers = MetadataMarkers::default().duration("DURATION");
        let metadata = parse_run_metadata(content.as_bytes(), &markers).unwrap();

        assert_eq!(120, metadata.duration_secs);
        assert_eq!(None, metadata.n_ues);
    }

    #[test]
    fn missing_start_time_is_an_error() {
        let content = "N_ITERATIONS: 30s\n";
        let err = parse_run_metadata(content.as_bytes(), &MetadataMarkers::default()).unwrap_err();

        assert!(matches!(err, MetadataError::MissingStartTime { .. }));
    }

    #[test]
    fn missing_duration_is_an_error() {
        let content = "14-03-20 test started\nN_UES: 10\n";
        let err = parse_run_metadata(content.as_bytes(), &MetadataMarkers::default()).unwrap_err();

        assert!(matches!(err, MetadataError::MissingDuration { .. }));
    }

    #[test]
    fn garbage_duration_is_an_error() {
        let content = "14-03-20 test started\nN_ITERATIONS: soon\n";
        let err = parse_run_metadata(content.as_bytes(), &MetadataMarkers::default()).unwrap_err();

        assert!(matches!(err, MetadataError::InvalidValue { .. }));
    }

    #[test]
    fn short_started_line_is_an_error() {
        let content = "started\nN_ITERATIONS: 30\n";
        let err = parse_run_metadata(content.as_bytes(), &MetadataMarkers::default()).unwrap_err();

        assert!(matches!(err, MetadataError::InvalidStartTime { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("general.log");
        std::fs::write(&path, "10-15-00 started\nN_ITERATIONS: 5s\n").unwrap();

        let metadata = load_run_metadata(&path, &MetadataMarkers::default()).unwrap();
        assert_eq!(time(10, 15, 0), metadata.started_at);
        assert_eq!(5, metadata.duration_secs);
    }

    #[test]
    fn window_is_padded_on_both_sides() {
        let metadata = RunMetadata {
            started_at: time(14, 3, 20),
            duration_secs: 30,
            n_ues: None,
        };

        let window = metadata.window(5, 10);
        assert_eq!(time(14, 3, 15), window.start);
        assert_eq!(time(14, 4, 0), window.end);
        assert!(window.contains(time(14, 3, 15)));
        assert!(window.contains(time(14, 4, 0)));
        assert!(!window.contains(time(14, 4, 1)));
        assert!(!window.is_past(time(14, 4, 0)));
        assert!(window.is_past(time(14, 4, 1)));
    }

    #[test]
    fn window_before_midnight_does_not_wrap() {
        let metadata = RunMetadata {
            started_at: time(0, 0, 2),
            duration_secs: 10,
            n_ues: None,
        };

        let window = metadata.window(5, 10);
        assert!(window.start < window.end);
        assert!(window.contains(time(0, 0, 0)));
    }
}
