use polars::prelude::*;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::frame::{
    f64_values, mean_column, str_values, CPU, MEM, NET_IO_RX_PER_S, NET_IO_TX_PER_S, NF_NAME,
};

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct WorkloadRow {
    pub nf_name: String,
    #[tabled(display = "float2")]
    pub cpu_percent: f64,
    #[tabled(display = "float2")]
    pub mem_mib: f64,
    #[tabled(display = "float2")]
    pub tx_bytes_per_s: f64,
    #[tabled(display = "float2")]
    pub rx_bytes_per_s: f64,
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}

/// One row per workload of a frame produced by [crate::ScenarioSummary::workload_means].
pub fn workload_rows(means: &DataFrame) -> PolarsResult<Vec<WorkloadRow>> {
    let names = str_values(means, NF_NAME)?;
    let cpu = f64_values(means, &mean_column(CPU))?;
    let mem = f64_values(means, &mean_column(MEM))?;
    let tx = f64_values(means, &mean_column(NET_IO_TX_PER_S))?;
    let rx = f64_values(means, &mean_column(NET_IO_RX_PER_S))?;

    Ok(names
        .into_iter()
        .enumerate()
        .map(|(i, nf_name)| WorkloadRow {
            nf_name,
            cpu_percent: cpu[i],
            mem_mib: mem[i],
            tx_bytes_per_s: tx[i],
            rx_bytes_per_s: rx[i],
        })
        .collect())
}

pub fn render_summary_table(rows: &[WorkloadRow]) -> String {
    let mut table = Table::new(rows);
    table.with(Style::modern());
    table.to_string()
}

/// Print the mean usage of every workload of a scenario to stdout.
pub fn print_summary_table(scenario: &str, means: &DataFrame) -> PolarsResult<()> {
    let rows = workload_rows(means)?;
    println!("\nScenario: {scenario}");
    println!("{}", render_summary_table(&rows));
    Ok(())
}
