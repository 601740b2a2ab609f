// Metrics engine: range partition, mean, GMI, CV and clinical bands.

use pump_therapy_tutor::metrics::*;
use pump_therapy_tutor::types::*;
use pump_therapy_tutor::{generate, TutorError};

fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() < tol,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn constant_trace_is_fully_in_range() {
    let trace = Trace::from_values(std::iter::repeat(120.0).take(2016)).unwrap();
    let m = summarize(&trace).unwrap();
    assert_eq!(m.time_in_range, 100.0);
    assert_eq!(m.time_below_70, 0.0);
    assert_eq!(m.time_above_180, 0.0);
    assert_close(m.mean_glucose, 120.0, 1e-9);
    assert_close(m.gmi, 6.1904, 1e-9);
    assert_close(m.cv, 0.0, 1e-9);
}

#[test]
fn mixed_values_split_into_three_bins() {
    let m = summarize_values(&[60.0, 100.0, 200.0, 120.0]).unwrap();
    assert_close(m.time_in_range, 50.0, 1e-9);
    assert_close(m.time_below_70, 25.0, 1e-9);
    assert_close(m.time_above_180, 25.0, 1e-9);
    assert_close(m.mean_glucose, 120.0, 1e-9);
    // sample sd = sqrt(10400 / 3)
    assert_close(m.cv, (10400.0_f64 / 3.0).sqrt() / 120.0 * 100.0, 1e-9);
}

#[test]
fn range_edges_are_in_range() {
    let m = summarize_values(&[70.0, 180.0, 69.9, 180.1]).unwrap();
    assert_close(m.time_in_range, 50.0, 1e-9);
    assert_close(m.time_below_70, 25.0, 1e-9);
    assert_close(m.time_above_180, 25.0, 1e-9);
}

#[test]
fn single_reading_has_zero_cv() {
    let m = summarize_values(&[150.0]).unwrap();
    assert_eq!(m.cv, 0.0);
    assert_eq!(m.time_in_range, 100.0);
}

#[test]
fn empty_trace_is_rejected() {
    let trace = Trace::from_values(Vec::new()).unwrap();
    assert!(matches!(summarize(&trace), Err(TutorError::InvalidInput(_))));
    assert!(matches!(summarize_values(&[]), Err(TutorError::InvalidInput(_))));
}

#[test]
fn non_finite_readings_are_rejected() {
    assert!(matches!(
        summarize_values(&[f64::NAN, 120.0]),
        Err(TutorError::InvalidInput(_))
    ));
    assert!(matches!(
        summarize_values(&[120.0, f64::INFINITY]),
        Err(TutorError::InvalidInput(_))
    ));
}

#[test]
fn out_of_range_reading_cannot_form_a_trace() {
    let err = Trace::from_values([120.0, 30.0]).unwrap_err();
    assert!(matches!(err, TutorError::Validation { ref field, .. } if field == "trace[1]"));
}

#[test]
fn generated_traces_partition_to_one_hundred() {
    let settings = TherapySettings {
        basal_profile: vec![0.8; 24],
        ic_ratios: Default::default(),
        correction_factor: 50.0,
        target_glucose: 110.0,
    };
    for scenario in ScenarioTag::ALL {
        let trace = generate(7, &settings, scenario, WeekIndex::FIRST).unwrap();
        let m = summarize(&trace).unwrap();
        assert_close(m.time_in_range + m.time_below_70 + m.time_above_180, 100.0, 1e-9);
        assert_close(m.gmi, gmi(m.mean_glucose), 1e-12);
    }
}

#[test]
fn bands_follow_clinical_targets() {
    assert_eq!(time_in_range_band(85.0), RangeBand::OnTarget);
    assert_eq!(time_in_range_band(70.0), RangeBand::Borderline);
    assert_eq!(time_in_range_band(50.0), RangeBand::OffTarget);
    assert_eq!(time_below_band(2.0), RangeBand::OnTarget);
    assert_eq!(time_below_band(4.0), RangeBand::Borderline);
    assert_eq!(time_below_band(10.0), RangeBand::OffTarget);
}

#[test]
fn deserialized_traces_are_checked_like_built_ones() {
    let trace = Trace::from_values([100.0, 120.0, 140.0]).unwrap();
    let json = serde_json::to_string(&trace).unwrap();
    let back: Trace = serde_json::from_str(&json).unwrap();
    assert_eq!(back, trace);

    let low = json.replace("100.0", "12.0");
    let err = serde_json::from_str::<Trace>(&low).unwrap_err();
    assert!(err.to_string().contains("trace[0]"), "{}", err);

    let mut gappy = Trace::from_values([100.0, 120.0]).unwrap().samples().to_vec();
    gappy[1].timestamp = Trace::timestamp_at(2);
    let json = serde_json::json!({ "samples": gappy }).to_string();
    assert!(serde_json::from_str::<Trace>(&json).is_err());
}
