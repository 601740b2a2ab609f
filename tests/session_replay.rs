// Integration tests: deterministic session replay via SessionAction sequences.
// Each test replays a hardcoded action sequence and asserts the final session.

use pump_therapy_tutor::cases::find_case;
use pump_therapy_tutor::config::TutorConfig;
use pump_therapy_tutor::explorer::run_exploration;
use pump_therapy_tutor::invariants;
use pump_therapy_tutor::replay::{replay_actions, ActionOutcome, ReplayError, SessionAction};
use pump_therapy_tutor::session::{Session, WeekTransition};
use pump_therapy_tutor::types::*;
use pump_therapy_tutor::TutorError;

fn dawn_session() -> Session {
    Session::start(find_case("pump-001").unwrap())
}

fn config() -> TutorConfig {
    TutorConfig::default()
}

fn raised_dawn_basal(settings: &TherapySettings) -> TherapySettings {
    let mut next = settings.clone();
    for hour in 3..=7 {
        next.basal_profile[hour] += 0.2;
    }
    next
}

/// 1. Fresh session: week 0, working copy equals the baseline.
#[test]
fn session_starts_at_week_zero_with_baseline() {
    let session = dawn_session();
    assert_eq!(session.week, WeekIndex::FIRST);
    assert_eq!(session.working, session.original);
    assert_eq!(session.scenario, ScenarioTag::DawnPhenomenon);
    assert!(!session.in_maintenance());
    assert!(invariants::session_invariant(&session));
}

/// 2. Review at week 0 is a no-op.
#[test]
fn review_previous_at_week_zero_is_unchanged() {
    let session = dawn_session();
    let (next, transition) = session.review_previous();
    assert_eq!(transition, WeekTransition::Unchanged);
    assert_eq!(next, session);
}

/// 3. Full journey: eleven advances complete the patient exactly once.
#[test]
fn advancing_to_the_last_week_completes_the_journey() {
    let mut actions = vec![SessionAction::Advance; 13];
    actions.push(SessionAction::ReviewPrevious);
    actions.push(SessionAction::Advance);

    let steps = replay_actions(dawn_session(), &actions, &config()).unwrap();

    assert_eq!(steps[0].0, ActionOutcome::Week(WeekTransition::Advanced(WeekIndex::new(1).unwrap())));
    assert_eq!(steps[10].0, ActionOutcome::Week(WeekTransition::JourneyComplete));
    assert_eq!(steps[10].1.week, WeekIndex::LAST);
    // clamped at week 11
    assert_eq!(steps[12].1.week, WeekIndex::LAST);
    assert_eq!(steps[12].0, ActionOutcome::Week(WeekTransition::JourneyComplete));
    assert_eq!(steps[13].1.week, WeekIndex::new(10).unwrap());

    let final_session = &steps.last().unwrap().1;
    assert!(final_session.journey_complete);
    assert_eq!(final_session.stats.patients_completed, 1);
}

/// 4. Adjustment: proposal becomes the working settings and is counted.
#[test]
fn accepted_proposal_updates_working_settings() {
    let session = dawn_session();
    let proposed = raised_dawn_basal(&session.working);

    let (next, result) = session.propose(proposed.clone(), &config()).unwrap();

    assert_eq!(next.working, proposed);
    assert_eq!(next.original, session.original);
    assert!(next.adjustment_made);
    assert_eq!(next.stats.adjustments_made, 1);
    let excellent = u32::from(result.verdict.outcome == Outcome::Excellent);
    assert_eq!(next.stats.successful_outcomes, excellent);
    assert!(invariants::session_invariant(&next));
}

/// 5. Two proposals in one week are both compared against the week's start.
#[test]
fn proposals_in_one_week_share_the_before_trace() {
    let session = dawn_session();
    let first = raised_dawn_basal(&session.working);
    let mut second = first.clone();
    second.correction_factor = 45.0;

    let (after_first, r1) = session.propose(first, &config()).unwrap();
    let (_, r2) = after_first.propose(second, &config()).unwrap();
    assert_eq!(r1.before_trace, r2.before_trace);
    assert_eq!(r1.before_metrics, r2.before_metrics);
}

/// 6. Advancing resets the adjustment flag and rebases the week.
#[test]
fn advance_rebases_on_working_settings() {
    let session = dawn_session();
    let proposed = raised_dawn_basal(&session.working);
    let (adjusted, _) = session.propose(proposed.clone(), &config()).unwrap();
    let (next, _) = adjusted.advance();
    assert!(!next.adjustment_made);
    assert_eq!(next.week_baseline, proposed);
    assert_eq!(next.stats.adjustments_made, 1);
}

/// 7. A rejected proposal leaves the session as it was.
#[test]
fn rejected_proposal_leaves_session_unchanged() {
    let session = dawn_session();
    let snapshot = session.clone();
    let mut proposed = session.working.clone();
    proposed.correction_factor = 150.0;

    let err = session.propose(proposed, &config()).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(session, snapshot);
}

/// 8. Maintenance phase: from week 8 proposals are refused.
#[test]
fn maintenance_phase_refuses_proposals() {
    let mut actions = vec![SessionAction::Advance; 8];
    actions.push(SessionAction::Propose(dawn_session().working));

    let err = replay_actions(dawn_session(), &actions, &config()).unwrap_err();
    match err {
        ReplayError::Action { index, source, .. } => {
            assert_eq!(index, 8);
            assert!(matches!(source, TutorError::InvalidInput(_)));
        }
        other => panic!("unexpected error: {}", other),
    }
}

/// 9. Week view is stable on revisits.
#[test]
fn revisiting_a_week_shows_the_same_trace() {
    let session = dawn_session();
    let first_view = session.current_view(&config()).unwrap();
    let (later, _) = session.advance();
    let (back, _) = later.review_previous();
    let second_view = back.current_view(&config()).unwrap();
    assert_eq!(first_view, second_view);
    assert!(invariants::check_trace(&second_view.trace).is_ok());
}

/// 10. Random walks keep every invariant.
#[test]
fn random_walks_hold_invariants() {
    let cfg = TutorConfig {
        trace_days: 1,
        ..TutorConfig::default()
    };
    let result = run_exploration(15, 8, 7, &cfg, false);
    assert!(result.violation.is_none());
    assert_eq!(result.walks, 8);
    assert!(result.actions <= 8 * 15);
    assert!(result.to_string().contains("--seed 7"));
}
