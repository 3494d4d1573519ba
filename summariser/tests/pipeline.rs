use std::path::{Path, PathBuf};

use nf_stats_summariser::frame::{f64_values, str_values, CPU};
use nf_stats_summariser::plot::chart_series;
use nf_stats_summariser::report::{CsvReporter, Report};
use nf_stats_summariser::run::RunError;
use nf_stats_summariser::{summarise_scenario, AggregateError, AnalysisConfig, ScenarioSummary};
use polars::prelude::*;
use pretty_assertions::assert_eq;

fn idle_scenario() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/idle")
}

fn idle_summary() -> ScenarioSummary {
    summarise_scenario(&idle_scenario(), &AnalysisConfig::default()).unwrap()
}

/// Value of `column` for one workload and bucket of the aggregate.
fn aggregate_value(summary: &ScenarioSummary, nf_name: &str, bucket: u32, column: &str) -> f64 {
    let frame = &summary.aggregate;
    let mask = frame.column("nf_name").unwrap().str().unwrap().equal(nf_name)
        & frame.column("bucket").unwrap().u32().unwrap().equal(bucket);
    let row = frame.filter(&mask).unwrap();
    assert_eq!(1, row.height(), "{nf_name} bucket {bucket}");
    f64_values(&row, column).unwrap()[0]
}

fn assert_close(expected: f64, actual: f64) {
    assert!(
        (expected - actual).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn idle_scenario_runs_are_discovered() {
    let summary = idle_summary();

    assert_eq!("idle", summary.name);
    assert_eq!(
        vec!["test_1", "test_2"],
        summary.runs.iter().map(|r| r.name.as_str()).collect::<Vec<_>>()
    );
    assert_eq!(2, summary.trials);
    assert_eq!(Some(0), summary.runs[0].metadata.n_ues);
    // four snapshots of three workloads per run, the ones outside the window are dropped
    assert_eq!(12, summary.runs[0].observations);
    assert_eq!(12, summary.runs[1].observations);
    assert_eq!(24, summary.long.height());
}

#[test]
fn idle_scenario_is_averaged_per_bucket() {
    let summary = idle_summary();

    assert_eq!(12, summary.aggregate.height());
    assert_close(2.5, aggregate_value(&summary, "amf", 0, "cpu_mean"));
    assert_close(1.5, aggregate_value(&summary, "amf", 1, "cpu_mean"));
    assert_close(101.0, aggregate_value(&summary, "amf", 0, "mem_mean"));
    assert_close(0.0, aggregate_value(&summary, "amf", 0, "net_io_tx_per_s_mean"));
    assert_close(1500.0, aggregate_value(&summary, "amf", 1, "net_io_tx_per_s_mean"));
    assert_close(1.025, aggregate_value(&summary, "amf", 1, "delta_mean"));
    assert_close(
        1_750_000.0,
        aggregate_value(&summary, "nr_gnb", 3, "block_io_tx_mean"),
    );
    assert_close(2.0, aggregate_value(&summary, "smf", 2, "trials"));

    let std = aggregate_value(&summary, "amf", 0, "cpu_std");
    assert_close((0.5f64).sqrt(), std);
    let err = aggregate_value(&summary, "amf", 0, "cpu_err");
    assert!(err > 0.0 && err < std);
    assert_close(
        2.5 - err,
        aggregate_value(&summary, "amf", 0, "cpu_ci_lower"),
    );
}

#[test]
fn idle_scenario_means_are_written_as_csv() {
    let summary = idle_summary();
    let means = summary.workload_means().unwrap();
    assert_eq!(
        vec!["amf", "nr_gnb", "smf"],
        str_values(&means, "nf_name").unwrap()
    );

    let output = tempfile::tempdir().unwrap();
    let path = output.path().join("idle_mean.csv");
    CsvReporter::from_file(&path)
        .unwrap()
        .report(&summary)
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert!(lines.next().unwrap().starts_with("nf_name,"));
    assert_eq!(
        vec!["amf", "nr_gnb", "smf"],
        lines
            .map(|line| line.split(',').next().unwrap())
            .collect::<Vec<_>>()
    );
}

#[test]
fn excluded_workloads_are_not_charted() {
    let summary = idle_summary();

    let series = chart_series(&summary, CPU, &["nr_gnb".to_string()]).unwrap();
    assert_eq!(
        vec!["amf", "smf"],
        series.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>()
    );
    assert!(series.iter().all(|(_, points)| points.len() == 4));
    assert_eq!(0.0, series[0].1[0].x);
}

#[test]
fn broken_log_aborts_the_scenario() {
    let scenario = tempfile::tempdir().unwrap();
    let run = scenario.path().join("test_1");
    std::fs::create_dir(&run).unwrap();
    std::fs::copy(
        idle_scenario().join("test_1/general.txt"),
        run.join("general.txt"),
    )
    .unwrap();
    std::fs::write(
        run.join("docker_stats.log"),
        "10:00:00.100000\namf,24.00%,100MiB / 15.5GiB,1TB / 2kB,0B / 0B,12\n",
    )
    .unwrap();

    let err = summarise_scenario(scenario.path(), &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        AggregateError::Run {
            source: RunError::Parse { .. },
            ..
        }
    ));
}

#[test]
fn invalid_config_is_rejected_before_reading() {
    let err = summarise_scenario(&idle_scenario(), &AnalysisConfig::default().core_count(0))
        .unwrap_err();
    assert!(matches!(err, AggregateError::Config(_)));
}
