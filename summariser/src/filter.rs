use itertools::Itertools;

/// The workloads that get a line on a chart: everything not excluded, sorted and deduplicated.
pub fn charted_workloads(workloads: Vec<String>, excluded: &[String]) -> Vec<String> {
    workloads
        .into_iter()
        .filter(|name| {
            let keep = !excluded.contains(name);
            if !keep {
                trace!("Leaving {name} out of the chart");
            }
            keep
        })
        .sorted()
        .dedup()
        .collect()
}
