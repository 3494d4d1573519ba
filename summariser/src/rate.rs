use std::collections::HashMap;

/// Per workload first differences of a cumulative counter.
///
/// Samples are taken roughly once a second, so the difference is reported as a per second rate
/// without dividing by the actual interval. `items` must be in timestamp order. Each item is
/// compared with the previous item of the same workload, the first item of every workload gets a
/// rate of zero.
pub fn derive_rates<T, K, V>(items: &[T], workload: K, value: V) -> Vec<f64>
where
    K: Fn(&T) -> &str,
    V: Fn(&T) -> f64,
{
    let mut last_seen: HashMap<&str, f64> = HashMap::new();
    items
        .iter()
        .map(|item| {
            let current = value(item);
            match last_seen.insert(workload(item), current) {
                Some(previous) => current - previous,
                None => 0.0,
            }
        })
        .collect()
}
