// Metrics engine: time-in-range family, mean, GMI and CV of a trace.

use crate::constants::*;
use crate::error::{TutorError, TutorResult};
use crate::types::{MetricsSummary, RangeBand, Trace};

pub fn summarize(trace: &Trace) -> TutorResult<MetricsSummary> {
    let values: Vec<f64> = trace.values().collect();
    summarize_values(&values)
}

/// Summary of raw glucose values. CV uses the sample (n-1) standard
/// deviation; a single reading has a CV of 0.
pub fn summarize_values(values: &[f64]) -> TutorResult<MetricsSummary> {
    if values.is_empty() {
        return Err(TutorError::invalid("cannot summarize an empty trace"));
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(TutorError::invalid(format!(
            "reading {} is not finite: {}",
            i, values[i]
        )));
    }
    let n = values.len() as f64;

    let mut in_range = 0usize;
    let mut below = 0usize;
    let mut above = 0usize;
    for &v in values {
        if v < RANGE_LOW {
            below += 1;
        } else if v > RANGE_HIGH {
            above += 1;
        } else {
            in_range += 1;
        }
    }

    let mean = values.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return Err(TutorError::invalid("mean glucose must be positive"));
    }
    let cv = sample_std_dev(values, mean) / mean * 100.0;

    Ok(MetricsSummary {
        time_in_range: in_range as f64 / n * 100.0,
        time_below_70: below as f64 / n * 100.0,
        time_above_180: above as f64 / n * 100.0,
        mean_glucose: mean,
        gmi: gmi(mean),
        cv,
    })
}

/// Glucose Management Indicator for a mean glucose in mg/dL.
pub fn gmi(mean_glucose: f64) -> f64 {
    GMI_INTERCEPT + GMI_SLOPE * mean_glucose
}

fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

pub fn time_in_range_band(time_in_range: f64) -> RangeBand {
    if time_in_range > TIR_ON_TARGET {
        RangeBand::OnTarget
    } else if time_in_range > TIR_BORDERLINE {
        RangeBand::Borderline
    } else {
        RangeBand::OffTarget
    }
}

pub fn time_below_band(time_below_70: f64) -> RangeBand {
    if time_below_70 < LOW_ON_TARGET {
        RangeBand::OnTarget
    } else if time_below_70 < LOW_BORDERLINE {
        RangeBand::Borderline
    } else {
        RangeBand::OffTarget
    }
}
