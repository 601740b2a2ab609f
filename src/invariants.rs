// Safety invariants over sessions and generated traces.

use chrono::Duration;

use crate::constants::*;
use crate::evaluator::validate;
use crate::session::Session;
use crate::types::*;

pub fn week_within_journey(session: &Session) -> bool {
    session.week.get() <= FINAL_WEEK
}

pub fn basal_profiles_complete(session: &Session) -> bool {
    [&session.original, &session.working, &session.week_baseline]
        .iter()
        .all(|s| s.basal_profile.len() == HOURS_PER_DAY)
}

pub fn working_settings_valid(session: &Session) -> bool {
    validate(&session.working).is_ok()
}

/// successful_outcomes <= adjustments_made
pub fn outcomes_within_adjustments(session: &Session) -> bool {
    session.stats.successful_outcomes <= session.stats.adjustments_made
}

/// A session completes its patient at most once.
pub fn completion_counted_once(session: &Session) -> bool {
    session.stats.patients_completed == u32::from(session.journey_complete)
}

/// adjustment_made implies the week still allows adjustments
pub fn no_adjustment_in_maintenance(session: &Session) -> bool {
    !session.adjustment_made || session.week.allows_adjustment()
}

pub const ALL_INVARIANTS: &[(&str, fn(&Session) -> bool)] = &[
    ("weekWithinJourney", week_within_journey),
    ("basalProfilesComplete", basal_profiles_complete),
    ("workingSettingsValid", working_settings_valid),
    ("outcomesWithinAdjustments", outcomes_within_adjustments),
    ("completionCountedOnce", completion_counted_once),
    ("noAdjustmentInMaintenance", no_adjustment_in_maintenance),
];

pub fn session_invariant(session: &Session) -> bool {
    ALL_INVARIANTS.iter().all(|(_, check)| check(session))
}

/// Name of the first violated session invariant, if any.
pub fn check_invariants(session: &Session) -> Result<(), &'static str> {
    for (name, check) in ALL_INVARIANTS {
        if !check(session) {
            return Err(name);
        }
    }
    Ok(())
}

pub fn values_within_sensor_range(trace: &Trace) -> bool {
    trace
        .values()
        .all(|v| (GLUCOSE_FLOOR..=GLUCOSE_CEILING).contains(&v))
}

pub fn fixed_cadence(trace: &Trace) -> bool {
    let step = Duration::minutes(SAMPLE_INTERVAL_MINUTES);
    trace.samples().first().map_or(true, |s| s.timestamp == Trace::reference_start())
        && trace
            .samples()
            .windows(2)
            .all(|w| w[1].timestamp - w[0].timestamp == step)
}

pub fn whole_days(trace: &Trace) -> bool {
    !trace.is_empty() && trace.len() % SAMPLES_PER_DAY == 0
}

pub const TRACE_INVARIANTS: &[(&str, fn(&Trace) -> bool)] = &[
    ("valuesWithinSensorRange", values_within_sensor_range),
    ("fixedCadence", fixed_cadence),
    ("wholeDays", whole_days),
];

pub fn check_trace(trace: &Trace) -> Result<(), &'static str> {
    for (name, check) in TRACE_INVARIANTS {
        if !check(trace) {
            return Err(name);
        }
    }
    Ok(())
}
