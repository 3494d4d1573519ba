use polars::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::frame::{
    ci_lower_column, ci_upper_column, err_column, f64_values, mean_column, std_column,
};

/// The t quantile used to widen a standard deviation into a confidence interval.
///
/// `confidence` is used literally as `(1 + confidence) / 2`, so the default of 0.05 picks the
/// 52.5th percentile. With fewer than two trials there are no degrees of freedom and the quantile
/// is undefined.
pub fn t_quantile(confidence: f64, n: usize) -> Option<f64> {
    if n < 2 {
        return None;
    }

    let dist = StudentsT::new(0.0, 1.0, (n - 1) as f64).ok()?;
    Some(dist.inverse_cdf((1.0 + confidence) / 2.0))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    /// Also the length of the error bar drawn on either side of the mean.
    pub half_width: f64,
}

impl ConfidenceInterval {
    const UNDEFINED: Self = Self {
        lower: f64::NAN,
        upper: f64::NAN,
        half_width: f64::NAN,
    };

    pub fn new(mean: f64, std: f64, n: usize, confidence: f64) -> Option<Self> {
        let half_width = std * t_quantile(confidence, n)?;
        Some(Self {
            lower: mean - half_width,
            upper: mean + half_width,
            half_width,
        })
    }
}

/// Add the `_ci_lower`, `_ci_upper` and `_err` columns of each metric to an aggregate frame.
///
/// `n` is the number of trials. The columns are NaN when it is too small for an interval, or
/// when a group has no standard deviation.
pub(crate) fn with_confidence_intervals(
    mut frame: DataFrame,
    metrics: &[&str],
    n: usize,
    confidence: f64,
) -> PolarsResult<DataFrame> {
    for metric in metrics {
        let means = f64_values(&frame, &mean_column(metric))?;
        let stds = f64_values(&frame, &std_column(metric))?;
        let intervals = means
            .into_iter()
            .zip(stds)
            .map(|(mean, std)| {
                ConfidenceInterval::new(mean, std, n, confidence)
                    .unwrap_or(ConfidenceInterval::UNDEFINED)
            })
            .collect::<Vec<_>>();

        let column = |name: String, f: fn(&ConfidenceInterval) -> f64| {
            Series::new(name.into(), intervals.iter().map(f).collect::<Vec<_>>())
        };
        frame.with_column(column(ci_lower_column(metric), |ci| ci.lower))?;
        frame.with_column(column(ci_upper_column(metric), |ci| ci.upper))?;
        frame.with_column(column(err_column(metric), |ci| ci.half_width))?;
    }

    Ok(frame)
}
