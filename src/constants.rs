// Constants: every number the generator, metrics and evaluator agree on.

// Trace shape
pub const SAMPLES_PER_DAY: usize = 288;
pub const SAMPLE_INTERVAL_MINUTES: i64 = 5;
pub const DEFAULT_TRACE_DAYS: usize = 7;
pub const HOURS_PER_DAY: usize = 24;

// Glucose bounds (mg/dL)
pub const GLUCOSE_FLOOR: f64 = 40.0;
pub const GLUCOSE_CEILING: f64 = 400.0;
pub const RANGE_LOW: f64 = 70.0;
pub const RANGE_HIGH: f64 = 180.0;

/// Diurnal bucket: inclusive hour window, mean, Gaussian sd.
pub struct DiurnalBucket {
    pub first_hour: u32,
    pub last_hour: u32,
    pub mean: f64,
    pub sd: f64,
}

pub const DIURNAL_BUCKETS: &[DiurnalBucket] = &[
    DiurnalBucket { first_hour: 6, last_hour: 8, mean: 140.0, sd: 15.0 },
    DiurnalBucket { first_hour: 12, last_hour: 14, mean: 160.0, sd: 20.0 },
    DiurnalBucket { first_hour: 18, last_hour: 20, mean: 150.0, sd: 18.0 },
    DiurnalBucket { first_hour: 2, last_hour: 4, mean: 95.0, sd: 10.0 },
];
pub const DEFAULT_BASELINE_MEAN: f64 = 120.0;
pub const DEFAULT_BASELINE_SD: f64 = 12.0;

// mg/dL lowered per U/hr of basal
pub const BASAL_EFFECT_PER_UNIT: f64 = 50.0;

// Scenario perturbations, active while week < PERTURBATION_WEEKS
pub const PERTURBATION_WEEKS: u8 = 4;
pub const DAWN_RISE: f64 = 40.0;
pub const DAWN_DECAY_PER_WEEK: f64 = 10.0;
pub const AFTERNOON_DROP: f64 = 30.0;
pub const AFTERNOON_DECAY_PER_WEEK: f64 = 7.0;
pub const MEAL_SPIKE: f64 = 80.0;
pub const MEAL_SPIKE_FLOOR: f64 = 20.0;
pub const MEAL_SPIKE_DECAY_PER_WEEK: f64 = 15.0;
pub const NOCTURNAL_DROP: f64 = 25.0;
pub const NOCTURNAL_DECAY_PER_WEEK: f64 = 6.0;
pub const UNAWARENESS_PROBABILITY: f64 = 0.05;
pub const UNAWARENESS_DROP: f64 = 40.0;

// Meals
pub const MEAL_CARBS_MEAN: f64 = 45.0;
pub const MEAL_CARBS_SD: f64 = 15.0;
pub const MEAL_RISE: f64 = 80.0;
pub const UNCONTROLLED_MEAL_RISE: f64 = 60.0;

// GMI = GMI_INTERCEPT + GMI_SLOPE * mean
pub const GMI_INTERCEPT: f64 = 3.31;
pub const GMI_SLOPE: f64 = 0.02392;

// Therapy setting ranges
pub const BASAL_MIN: f64 = 0.0;
pub const BASAL_MAX: f64 = 5.0;
pub const BASAL_STEP: f64 = 0.1;
pub const IC_RATIO_MIN: f64 = 5.0;
pub const IC_RATIO_MAX: f64 = 30.0;
pub const CORRECTION_FACTOR_MIN: f64 = 20.0;
pub const CORRECTION_FACTOR_MAX: f64 = 100.0;
pub const TARGET_GLUCOSE_MIN: f64 = 80.0;
pub const TARGET_GLUCOSE_MAX: f64 = 150.0;

// Week clock
pub const FINAL_WEEK: u8 = 11;
pub const ADJUSTMENT_WEEKS: u8 = 8;
pub const DEFAULT_SEED_BASE: u64 = 42;

// Verdict threshold on Δ time-in-range (percentage points)
pub const EXCELLENT_TIR_GAIN: f64 = 5.0;

// Clinical bands
pub const TIR_ON_TARGET: f64 = 70.0;
pub const TIR_BORDERLINE: f64 = 50.0;
pub const LOW_ON_TARGET: f64 = 4.0;
pub const LOW_BORDERLINE: f64 = 10.0;
