#[macro_use]
extern crate log;

use std::path::Path;

use anyhow::Context;
use clap::Parser as _;
use nf_stats_summariser::frame::CI_METRICS;
use nf_stats_summariser::plot::{plot_metric, PlotSpec};
use nf_stats_summariser::report::{CsvReporter, JsonRunReporter, Report};
use nf_stats_summariser::table::print_summary_table;
use nf_stats_summariser::{summarise_scenario, AnalysisConfig, ScenarioSummary};

mod cli;

const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    env_logger::try_init()?;

    let args = cli::CliArgs::try_parse()?;
    info!("{CRATE_NAME} {CRATE_VERSION}");

    let config = args.to_config();
    config.validate()?;
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Creating {}", args.output_dir.display()))?;

    for scenario in &args.scenarios {
        let summary = summarise_scenario(scenario, &config)
            .with_context(|| format!("Summarising {}", scenario.display()))?;

        let csv_path = args.output_dir.join(format!("{}_mean.csv", summary.name));
        CsvReporter::from_file(&csv_path)?
            .report(&summary)
            .with_context(|| format!("Writing {}", csv_path.display()))?;
        info!("Wrote {}", csv_path.display());

        print_summary_table(&summary.name, &summary.workload_means()?)?;

        if args.runs_report {
            let json_path = args.output_dir.join(format!("{}_runs.json", summary.name));
            JsonRunReporter::from_file(&json_path)?.report(&summary)?;
            info!("Wrote {}", json_path.display());
        }

        if args.plot {
            plot_scenario(&summary, &config, &args.output_dir)?;
        }
    }

    Ok(())
}

fn plot_scenario(
    summary: &ScenarioSummary,
    config: &AnalysisConfig,
    output_dir: &Path,
) -> anyhow::Result<()> {
    for metric in CI_METRICS {
        let Some(spec) = PlotSpec::for_metric(&summary.name, metric) else {
            continue;
        };
        let path = plot_metric(summary, &spec, &config.excluded_workloads, output_dir)
            .with_context(|| format!("Plotting {}", spec.title))?;
        info!("Saved {}", path.display());
    }
    Ok(())
}
