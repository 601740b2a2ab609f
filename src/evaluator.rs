// Adjustment evaluator: validates a proposed settings change, predicts next
// week's trace under it and classifies the change in time in range.

use tracing::{info, warn};

use crate::constants::*;
use crate::error::{TutorError, TutorResult};
use crate::generator::generate_seeded;
use crate::metrics::summarize;
use crate::types::*;

fn check_range(field: impl Into<String>, value: f64, min: f64, max: f64) -> TutorResult<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(TutorError::validation(field, value, min, max))
    }
}

fn on_basal_grid(rate: f64) -> bool {
    ((rate / BASAL_STEP).round() * BASAL_STEP - rate).abs() < 1e-6
}

/// Check every field of `settings` against its declared range.
pub fn validate(settings: &TherapySettings) -> TutorResult<()> {
    if settings.basal_profile.len() != HOURS_PER_DAY {
        return Err(settings.profile_mismatch());
    }
    for (hour, &rate) in settings.basal_profile.iter().enumerate() {
        let field = format!("basal_profile[{}]", hour);
        check_range(field.clone(), rate, BASAL_MIN, BASAL_MAX)?;
        if !on_basal_grid(rate) {
            return Err(TutorError::OffGrid {
                field,
                value: rate,
                step: BASAL_STEP,
            });
        }
    }
    for (meal, &ratio) in &settings.ic_ratios {
        check_range(
            format!("ic_ratios.{}", meal.as_str()),
            ratio,
            IC_RATIO_MIN,
            IC_RATIO_MAX,
        )?;
    }
    check_range(
        "correction_factor",
        settings.correction_factor,
        CORRECTION_FACTOR_MIN,
        CORRECTION_FACTOR_MAX,
    )?;
    check_range(
        "target_glucose",
        settings.target_glucose,
        TARGET_GLUCOSE_MIN,
        TARGET_GLUCOSE_MAX,
    )
}

/// A proposal may change ratios but may not drop a meal the original covers.
fn check_meals_retained(original: &TherapySettings, proposed: &TherapySettings) -> TutorResult<()> {
    match original
        .ic_ratios
        .keys()
        .find(|meal| !proposed.ic_ratios.contains_key(meal))
    {
        Some(meal) => Err(TutorError::invalid(format!(
            "proposed ic_ratios is missing '{}'",
            meal.as_str()
        ))),
        None => Ok(()),
    }
}

pub fn classify(delta_tir: f64) -> AdjustmentVerdict {
    let outcome = if delta_tir > EXCELLENT_TIR_GAIN {
        Outcome::Excellent
    } else if delta_tir > 0.0 {
        Outcome::Good
    } else {
        Outcome::NoneOrNegative
    };
    AdjustmentVerdict { outcome, delta_tir }
}

pub fn verdict_for(before: &MetricsSummary, after: &MetricsSummary) -> AdjustmentVerdict {
    classify(after.time_in_range - before.time_in_range)
}

/// Evaluate with the default trace length and seed scheme.
pub fn evaluate(
    original: &TherapySettings,
    proposed: &TherapySettings,
    scenario: ScenarioTag,
    current_week: WeekIndex,
) -> TutorResult<EvaluationResult> {
    evaluate_with(
        original,
        proposed,
        scenario,
        current_week,
        DEFAULT_TRACE_DAYS,
        DEFAULT_SEED_BASE,
    )
}

/// Compare `original` at `current_week` with `proposed` one week later.
/// Only valid before the maintenance phase (week 8).
pub fn evaluate_with(
    original: &TherapySettings,
    proposed: &TherapySettings,
    scenario: ScenarioTag,
    current_week: WeekIndex,
    days: usize,
    seed_base: u64,
) -> TutorResult<EvaluationResult> {
    if !current_week.allows_adjustment() {
        return Err(TutorError::invalid(format!(
            "week {} is in the maintenance phase; adjustments end after week {}",
            current_week.get(),
            ADJUSTMENT_WEEKS - 1
        )));
    }
    if let Err(e) = validate(proposed).and_then(|_| check_meals_retained(original, proposed)) {
        warn!(week = current_week.get(), error = %e, "rejected settings proposal");
        return Err(e);
    }

    let before_trace = generate_seeded(days, original, scenario, current_week, seed_base)?;
    let after_trace = generate_seeded(days, proposed, scenario, current_week.next(), seed_base)?;
    let before_metrics = summarize(&before_trace)?;
    let after_metrics = summarize(&after_trace)?;
    let verdict = verdict_for(&before_metrics, &after_metrics);

    info!(
        week = current_week.get(),
        scenario = scenario.as_str(),
        outcome = %verdict.outcome,
        delta_tir = verdict.delta_tir,
        "evaluated adjustment"
    );

    Ok(EvaluationResult {
        before_trace,
        after_trace,
        before_metrics,
        after_metrics,
        verdict,
    })
}
