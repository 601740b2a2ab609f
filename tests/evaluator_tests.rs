// Adjustment evaluator: validation, before/after generation and verdicts.

use pump_therapy_tutor::cases::find_case;
use pump_therapy_tutor::evaluator::*;
use pump_therapy_tutor::generator::generate;
use pump_therapy_tutor::metrics::summarize_values;
use pump_therapy_tutor::types::*;
use pump_therapy_tutor::TutorError;

fn baseline() -> TherapySettings {
    find_case("pump-001").unwrap().baseline()
}

fn metrics_with_tir(tir: f64) -> MetricsSummary {
    let mut m = summarize_values(&[120.0]).unwrap();
    m.time_in_range = tir;
    m
}

#[test]
fn verdict_thresholds() {
    let before = metrics_with_tir(60.0);
    let v = verdict_for(&before, &metrics_with_tir(68.0));
    assert_eq!(v.outcome, Outcome::Excellent);
    assert_eq!(v.delta_tir, 8.0);

    assert_eq!(classify(3.0).outcome, Outcome::Good);
    assert_eq!(classify(5.0).outcome, Outcome::Good);
    assert_eq!(classify(5.1).outcome, Outcome::Excellent);
    assert_eq!(classify(0.0).outcome, Outcome::NoneOrNegative);
    assert_eq!(classify(-2.0).outcome, Outcome::NoneOrNegative);
}

#[test]
fn feedback_mentions_the_improvement() {
    assert!(classify(8.0).feedback().contains("8.0%"));
    assert!(classify(3.0).feedback().contains("fine-tuning"));
    assert!(classify(-1.0).feedback().contains("consider different settings"));
}

#[test]
fn case_baselines_are_valid() {
    for id in ["pump-001", "pump-002", "pump-003", "pump-004"] {
        assert!(validate(&find_case(id).unwrap().baseline()).is_ok(), "{}", id);
    }
    assert!(matches!(find_case("pump-999"), Err(TutorError::InvalidInput(_))));
}

#[test]
fn out_of_range_correction_factor_is_rejected_and_original_untouched() {
    let original = baseline();
    let snapshot = original.clone();
    let mut proposed = original.clone();
    proposed.correction_factor = 150.0;

    let err = evaluate(&original, &proposed, ScenarioTag::DawnPhenomenon, WeekIndex::FIRST)
        .unwrap_err();
    assert_eq!(
        err,
        TutorError::Validation {
            field: "correction_factor".to_string(),
            value: 150.0,
            min: 20.0,
            max: 100.0,
        }
    );
    assert!(err.is_validation());
    assert_eq!(original, snapshot);
}

#[test]
fn each_field_reports_its_own_bound() {
    let mut s = baseline();
    s.basal_profile[3] = 5.5;
    assert!(matches!(validate(&s), Err(TutorError::Validation { field, max, .. }) if field == "basal_profile[3]" && max == 5.0));

    let mut s = baseline();
    s.basal_profile[3] = -0.1;
    assert!(matches!(validate(&s), Err(TutorError::Validation { field, .. }) if field == "basal_profile[3]"));

    let mut s = baseline();
    s.basal_profile[10] = 0.85;
    assert!(matches!(validate(&s), Err(TutorError::OffGrid { field, .. }) if field == "basal_profile[10]"));

    let mut s = baseline();
    s.ic_ratios.insert(Meal::Lunch, 4.0);
    assert!(matches!(validate(&s), Err(TutorError::Validation { field, .. }) if field == "ic_ratios.lunch"));

    let mut s = baseline();
    s.target_glucose = 160.0;
    assert!(matches!(validate(&s), Err(TutorError::Validation { field, .. }) if field == "target_glucose"));

    let mut s = baseline();
    s.correction_factor = f64::NAN;
    assert!(matches!(validate(&s), Err(TutorError::Validation { field, .. }) if field == "correction_factor"));
}

#[test]
fn bounds_themselves_are_accepted() {
    let mut s = baseline();
    s.basal_profile = vec![0.0; 24];
    s.basal_profile[0] = 5.0;
    s.ic_ratios.insert(Meal::Breakfast, 5.0);
    s.ic_ratios.insert(Meal::Dinner, 30.0);
    s.correction_factor = 20.0;
    s.target_glucose = 150.0;
    assert!(validate(&s).is_ok());
}

#[test]
fn wrong_profile_length_is_a_configuration_mismatch() {
    let mut s = baseline();
    s.basal_profile.push(0.8);
    assert!(matches!(
        validate(&s),
        Err(TutorError::ConfigurationMismatch { expected: 24, actual: 25, .. })
    ));
}

#[test]
fn proposal_may_not_drop_a_meal_ratio() {
    let original = baseline();
    let mut proposed = original.clone();
    proposed.ic_ratios.remove(&Meal::Dinner);
    let err = evaluate(&original, &proposed, ScenarioTag::DawnPhenomenon, WeekIndex::FIRST)
        .unwrap_err();
    assert!(matches!(err, TutorError::InvalidInput(ref msg) if msg.contains("dinner")));
}

#[test]
fn maintenance_weeks_are_rejected() {
    let original = baseline();
    for w in 8..=11 {
        let err = evaluate(
            &original,
            &original,
            ScenarioTag::DawnPhenomenon,
            WeekIndex::new(w).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, TutorError::InvalidInput(_)), "week {}", w);
    }
}

#[test]
fn before_and_after_come_from_consecutive_weeks() {
    let original = baseline();
    let mut proposed = original.clone();
    for hour in 4..=7 {
        proposed.basal_profile[hour] += 0.2;
    }
    let week = WeekIndex::new(2).unwrap();
    let scenario = ScenarioTag::DawnPhenomenon;

    let result = evaluate(&original, &proposed, scenario, week).unwrap();
    assert_eq!(result.before_trace, generate(7, &original, scenario, week).unwrap());
    assert_eq!(result.after_trace, generate(7, &proposed, scenario, week.next()).unwrap());
    assert_eq!(
        result.verdict.delta_tir,
        result.after_metrics.time_in_range - result.before_metrics.time_in_range
    );
    assert_eq!(result.verdict, classify(result.verdict.delta_tir));
}

#[test]
fn evaluation_is_repeatable() {
    let original = baseline();
    let mut proposed = original.clone();
    proposed.correction_factor = 40.0;
    let a = evaluate(&original, &proposed, ScenarioTag::DawnPhenomenon, WeekIndex::FIRST).unwrap();
    let b = evaluate(&original, &proposed, ScenarioTag::DawnPhenomenon, WeekIndex::FIRST).unwrap();
    assert_eq!(a, b);
}
