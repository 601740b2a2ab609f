// Built-in patient cases: baseline pump settings and the issue each one has.

use crate::error::{TutorError, TutorResult};
use crate::types::{Meal, ScenarioTag, TherapySettings};

pub struct PatientCase {
    pub id: &'static str,
    pub name: &'static str,
    pub pump: &'static str,
    pub scenario: ScenarioTag,
    pub description: &'static str,
    pub learning_objectives: &'static [&'static str],
    basal_profile: [f64; 24],
    ic_ratios: [f64; 3],
    correction_factor: f64,
    target_glucose: f64,
}

impl PatientCase {
    /// Baseline ("original") settings the learner starts from.
    pub fn baseline(&self) -> TherapySettings {
        TherapySettings {
            basal_profile: self.basal_profile.to_vec(),
            ic_ratios: Meal::ALL.into_iter().zip(self.ic_ratios).collect(),
            correction_factor: self.correction_factor,
            target_glucose: self.target_glucose,
        }
    }
}

pub const CASES: &[PatientCase] = &[
    PatientCase {
        id: "pump-001",
        name: "Sarah Chen",
        pump: "Tandem t:slim X2",
        scenario: ScenarioTag::DawnPhenomenon,
        description: "Active professional with consistent dawn phenomenon requiring basal optimization",
        learning_objectives: &[
            "Recognize dawn phenomenon pattern in CGM data",
            "Calculate appropriate basal rate increases for early morning",
            "Monitor response to basal adjustments over time",
        ],
        basal_profile: [
            0.8, 0.6, 0.5, 0.5, 0.9, 1.2, 1.0, 0.8, 0.7, 0.7, 0.8, 0.9, 1.0, 0.8, 0.7, 0.6, 0.8,
            1.1, 1.0, 0.9, 0.8, 0.8, 0.8, 0.8,
        ],
        ic_ratios: [12.0, 15.0, 10.0],
        correction_factor: 50.0,
        target_glucose: 110.0,
    },
    PatientCase {
        id: "pump-002",
        name: "Miguel Rodriguez",
        pump: "Omnipod 5",
        scenario: ScenarioTag::AfternoonLows,
        description: "Marathon runner struggling with exercise-induced afternoon hypoglycemia",
        learning_objectives: &[
            "Identify exercise-related hypoglycemia patterns",
            "Implement temporary basal reductions for exercise",
            "Understand delayed post-exercise hypoglycemia risk",
        ],
        basal_profile: [
            0.9, 0.8, 0.7, 0.7, 0.8, 0.9, 1.1, 0.9, 0.8, 0.8, 0.9, 1.0, 1.2, 1.0, 0.6, 0.5, 0.8,
            1.0, 1.1, 1.0, 0.9, 0.9, 0.9, 0.9,
        ],
        ic_ratios: [10.0, 12.0, 8.0],
        correction_factor: 45.0,
        target_glucose: 120.0,
    },
    PatientCase {
        id: "pump-003",
        name: "Jennifer Park",
        pump: "Medtronic 780G",
        scenario: ScenarioTag::PostMealSpikes,
        description: "College student with irregular eating and persistent post-meal highs",
        learning_objectives: &[
            "Analyze post-prandial glucose patterns",
            "Adjust insulin-to-carb ratios appropriately",
            "Implement pre-bolusing strategies",
        ],
        basal_profile: [
            0.6, 0.5, 0.4, 0.4, 0.6, 0.8, 0.9, 0.7, 0.6, 0.7, 0.8, 0.9, 1.1, 1.3, 0.8, 0.7, 0.9,
            1.2, 1.0, 0.8, 0.7, 0.6, 0.6, 0.6,
        ],
        ic_ratios: [15.0, 18.0, 12.0],
        correction_factor: 60.0,
        target_glucose: 100.0,
    },
    PatientCase {
        id: "pump-004",
        name: "Robert Kim",
        pump: "Tandem t:slim X2",
        scenario: ScenarioTag::HypoglycemiaUnawareness,
        description: "Long-term T1D with hypoglycemia unawareness and frequent severe lows",
        learning_objectives: &[
            "Recognize hypoglycemia unawareness patterns",
            "Implement conservative glucose targets",
            "Balance glycemic control with safety",
        ],
        basal_profile: [
            1.1, 0.9, 0.8, 0.8, 1.0, 1.3, 1.2, 1.0, 0.9, 0.9, 1.0, 1.1, 1.2, 1.0, 0.7, 0.6, 0.9,
            1.2, 1.1, 1.0, 1.0, 1.0, 1.1, 1.1,
        ],
        ic_ratios: [8.0, 10.0, 7.0],
        correction_factor: 35.0,
        target_glucose: 120.0,
    },
];

pub fn find_case(id: &str) -> TutorResult<&'static PatientCase> {
    CASES
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| TutorError::invalid(format!("unknown patient case '{}'", id)))
}
