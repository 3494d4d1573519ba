use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use polars::prelude::*;
use serde::Serialize;

use crate::aggregator::ScenarioSummary;
use crate::model::RunInfo;

/// A destination for the summary of a scenario.
pub trait Report {
    type Error;

    /// Report the summary of one scenario.
    fn report(&mut self, summary: &ScenarioSummary) -> Result<(), Self::Error>;
}

/// A [`Report`] implementation writing the per workload means as CSV, `nf_name` first.
pub struct CsvReporter<W>
where
    W: Write,
{
    writer: W,
}

impl<W> CsvReporter<W>
where
    W: Write,
{
    /// Creates a new [`CsvReporter`] with the specified [`Write`]r.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl CsvReporter<File> {
    /// Creates a new [`CsvReporter`] writing to a file at the specified path.
    pub fn from_file<P>(path: P) -> Result<Self, io::Error>
    where
        P: AsRef<Path>,
    {
        let file = File::create(path)?;
        Ok(Self::new(file))
    }
}

impl<W> Report for CsvReporter<W>
where
    W: Write,
{
    type Error = PolarsError;

    fn report(&mut self, summary: &ScenarioSummary) -> Result<(), Self::Error> {
        let mut means = summary.workload_means()?;
        debug!(
            "Writing {} workload means of scenario {}",
            means.height(),
            summary.name
        );
        CsvWriter::new(&mut self.writer)
            .include_header(true)
            .finish(&mut means)
    }
}

/// Which runs went into a summary, written next to the CSV.
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    scenario: &'a str,
    trials: usize,
    runs: &'a [RunInfo],
}

/// A [`Report`] implementation writing the loaded runs and their metadata as JSON.
pub struct JsonRunReporter<W>
where
    W: Write,
{
    writer: W,
}

impl<W> JsonRunReporter<W>
where
    W: Write,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl JsonRunReporter<File> {
    pub fn from_file<P>(path: P) -> Result<Self, io::Error>
    where
        P: AsRef<Path>,
    {
        let file = File::create(path)?;
        Ok(Self::new(file))
    }
}

impl<W> Report for JsonRunReporter<W>
where
    W: Write,
{
    type Error = serde_json::Error;

    fn report(&mut self, summary: &ScenarioSummary) -> Result<(), Self::Error> {
        serde_json::to_writer_pretty(
            &mut self.writer,
            &RunReport {
                scenario: &summary.name,
                trials: summary.trials,
                runs: &summary.runs,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::ScenarioAggregator;
    use crate::config::AnalysisConfig;

    fn summary() -> ScenarioSummary {
        let scenario = tempfile::tempdir().unwrap();
        for (name, cpu) in [("test_1", "24.00%"), ("test_2", "36.00%")] {
            let dir = scenario.path().join(name);
            std::fs::create_dir(&dir).unwrap();
            std::fs::write(dir.join("general"), "08-30-00 started\nN_UES: 2\nN_ITERATIONS: 1s\n")
                .unwrap();
            std::fs::write(
                dir.join("docker_stats"),
                format!(
                    "08:30:00.000000\namf,{cpu},8MiB / 1GiB,0B / 0B,0B / 0B,1\n\
                     smf,12.00%,4MiB / 1GiB,0B / 0B,0B / 0B,1\n"
                ),
            )
            .unwrap();
        }

        ScenarioAggregator::new(AnalysisConfig::default())
            .aggregate(scenario.path())
            .unwrap()
    }

    #[test]
    fn test_write_workload_means() {
        let mut buffer = Vec::new();
        CsvReporter::new(&mut buffer).report(&summary()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let mut lines = output.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("nf_name,"));
        assert!(header.contains("cpu_mean"));
        assert!(header.contains("cpu_err"));
        assert!(lines.next().unwrap().starts_with("amf,"));
        assert!(lines.next().unwrap().starts_with("smf,"));
        assert_eq!(None, lines.next());
    }

    #[test]
    fn test_should_write_to_file() {
        let tempfile = tempfile::NamedTempFile::new().unwrap();
        CsvReporter::from_file(tempfile.path())
            .unwrap()
            .report(&summary())
            .unwrap();

        let content = std::fs::read_to_string(tempfile.path()).unwrap();
        assert_eq!(3, content.lines().count());
    }

    #[test]
    fn test_write_run_report() {
        let mut buffer = Vec::new();
        JsonRunReporter::new(&mut buffer)
            .report(&summary())
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(2, value["trials"]);
        assert_eq!("test_1", value["runs"][0]["name"]);
        assert_eq!(2, value["runs"][1]["metadata"]["n_ues"]);
        assert_eq!(2, value["runs"][0]["observations"]);
    }
}
