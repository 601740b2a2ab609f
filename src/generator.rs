// Trace generator: diurnal baseline, basal dampening, scenario perturbation
// and meal boluses, clamped to the sensor range.

use chrono::{Duration, Timelike};
use tracing::debug;

use crate::constants::*;
use crate::error::{TutorError, TutorResult};
use crate::rng::{week_seed, GlucoseRng, SeededRng};
use crate::types::*;

/// Mean and sd of the diurnal bucket containing `hour`.
pub fn diurnal_baseline(hour: u32) -> (f64, f64) {
    DIURNAL_BUCKETS
        .iter()
        .find(|b| (b.first_hour..=b.last_hour).contains(&hour))
        .map(|b| (b.mean, b.sd))
        .unwrap_or((DEFAULT_BASELINE_MEAN, DEFAULT_BASELINE_SD))
}

fn decayed(strength: f64, per_week: f64, week: WeekIndex) -> f64 {
    (strength - f64::from(week.get()) * per_week).max(0.0)
}

/// Signed glucose offset the scenario adds at `hour`.
/// Zero once the learner reaches week 4.
pub fn scenario_offset(
    scenario: ScenarioTag,
    hour: u32,
    week: WeekIndex,
    settings: &TherapySettings,
    rng: &mut impl GlucoseRng,
) -> f64 {
    if week.get() >= PERTURBATION_WEEKS {
        return 0.0;
    }
    match scenario {
        ScenarioTag::DawnPhenomenon if (4..=7).contains(&hour) => {
            decayed(DAWN_RISE, DAWN_DECAY_PER_WEEK, week)
        }
        ScenarioTag::AfternoonLows if (14..=16).contains(&hour) => {
            -decayed(AFTERNOON_DROP, AFTERNOON_DECAY_PER_WEEK, week)
        }
        ScenarioTag::PostMealSpikes if hour == 13 || hour == 19 => {
            let reduction = if settings.has_ic_ratios() {
                f64::from(week.get()) * MEAL_SPIKE_DECAY_PER_WEEK
            } else {
                0.0
            };
            (MEAL_SPIKE - reduction).max(MEAL_SPIKE_FLOOR)
        }
        ScenarioTag::NocturnalLows if (1..=3).contains(&hour) => {
            -decayed(NOCTURNAL_DROP, NOCTURNAL_DECAY_PER_WEEK, week)
        }
        ScenarioTag::HypoglycemiaUnawareness => {
            if rng.chance(UNAWARENESS_PROBABILITY) {
                -UNAWARENESS_DROP
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Replace `glucose` with its post-meal value if a meal is bolused at
/// `hour:minute`.
pub fn apply_meal(
    glucose: f64,
    hour: u32,
    minute: u32,
    settings: &TherapySettings,
    rng: &mut impl GlucoseRng,
) -> f64 {
    if minute != 0 {
        return glucose;
    }
    let Some(meal) = Meal::at_hour(hour) else {
        return glucose;
    };
    let carbs = rng.gaussian(MEAL_CARBS_MEAN, MEAL_CARBS_SD);
    match settings.ic_ratio(meal) {
        Some(ratio) => {
            let insulin = carbs / ratio;
            let drop = insulin * settings.correction_factor;
            glucose + MEAL_RISE - drop
        }
        None => glucose + UNCONTROLLED_MEAL_RISE,
    }
}

/// Glucose value of one sample at `hour:minute`, before it is clamped.
pub fn sample_value(
    hour: u32,
    minute: u32,
    settings: &TherapySettings,
    scenario: ScenarioTag,
    week: WeekIndex,
    rng: &mut impl GlucoseRng,
) -> TutorResult<f64> {
    let (mean, sd) = diurnal_baseline(hour);
    let basal_effect = settings.basal_at(hour)? * BASAL_EFFECT_PER_UNIT;
    let mut glucose = rng.gaussian(mean, sd) - basal_effect;
    glucose += scenario_offset(scenario, hour, week, settings, rng);
    Ok(apply_meal(glucose, hour, minute, settings, rng))
}

/// Settings the meal and basal arithmetic can produce a finite value from.
/// Range checks belong to `evaluator::validate`; this only rules out
/// inputs that would turn a reading into NaN or infinity.
fn check_computable(settings: &TherapySettings) -> TutorResult<()> {
    if let Some((hour, rate)) = settings
        .basal_profile
        .iter()
        .enumerate()
        .find(|(_, rate)| !rate.is_finite())
    {
        return Err(TutorError::invalid(format!(
            "basal_profile[{}] is not a finite rate: {}",
            hour, rate
        )));
    }
    for (meal, &ratio) in &settings.ic_ratios {
        if !(ratio.is_finite() && ratio > 0.0) {
            return Err(TutorError::invalid(format!(
                "ic_ratios.{} must be a positive finite ratio, got {}",
                meal.as_str(),
                ratio
            )));
        }
    }
    if !(settings.correction_factor.is_finite() && settings.correction_factor > 0.0) {
        return Err(TutorError::invalid(format!(
            "correction_factor must be positive and finite, got {}",
            settings.correction_factor
        )));
    }
    Ok(())
}

/// Generate a trace drawing from the supplied randomness source.
pub fn generate_with(
    days: usize,
    settings: &TherapySettings,
    scenario: ScenarioTag,
    week: WeekIndex,
    rng: &mut impl GlucoseRng,
) -> TutorResult<Trace> {
    if days == 0 {
        return Err(TutorError::invalid("days must be at least 1"));
    }
    if settings.basal_profile.len() != HOURS_PER_DAY {
        return Err(settings.profile_mismatch());
    }
    check_computable(settings)?;

    let start = Trace::reference_start();
    let count = days * SAMPLES_PER_DAY;
    let mut samples = Vec::with_capacity(count);
    for i in 0..count {
        let timestamp = start + Duration::minutes(i as i64 * SAMPLE_INTERVAL_MINUTES);
        let raw = sample_value(
            timestamp.hour(),
            timestamp.minute(),
            settings,
            scenario,
            week,
            rng,
        )?;
        if !raw.is_finite() {
            return Err(TutorError::invalid(format!(
                "glucose at {} is not finite",
                timestamp
            )));
        }
        samples.push(GlucoseSample {
            timestamp,
            value: raw.clamp(GLUCOSE_FLOOR, GLUCOSE_CEILING),
        });
    }
    Ok(Trace::from_samples(samples))
}

/// Generate a trace seeded from `seed_base + week`, so a week always
/// replays the same trace.
pub fn generate_seeded(
    days: usize,
    settings: &TherapySettings,
    scenario: ScenarioTag,
    week: WeekIndex,
    seed_base: u64,
) -> TutorResult<Trace> {
    let seed = week_seed(seed_base, week);
    debug!(
        days,
        scenario = scenario.as_str(),
        week = week.get(),
        seed,
        "generating glucose trace"
    );
    let mut rng = SeededRng::from_seed(seed);
    generate_with(days, settings, scenario, week, &mut rng)
}

/// Generate a trace with the default seed scheme (42 + week).
pub fn generate(
    days: usize,
    settings: &TherapySettings,
    scenario: ScenarioTag,
    week: WeekIndex,
) -> TutorResult<Trace> {
    generate_seeded(days, settings, scenario, week, DEFAULT_SEED_BASE)
}
