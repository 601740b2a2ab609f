// Types: therapy settings, scenarios, traces, metrics and verdicts.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{TutorError, TutorResult};

/// Meal slot an I:C ratio applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
}

impl Meal {
    pub const ALL: [Meal; 3] = [Meal::Breakfast, Meal::Lunch, Meal::Dinner];

    /// Meal whose bolus is given at the top of `hour`, if any.
    pub fn at_hour(hour: u32) -> Option<Meal> {
        match hour {
            7 => Some(Meal::Breakfast),
            12 => Some(Meal::Lunch),
            18 => Some(Meal::Dinner),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Dinner => "dinner",
        }
    }
}

impl FromStr for Meal {
    type Err = TutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Meal::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| TutorError::invalid(format!("unknown meal '{}'", s)))
    }
}

/// Unresolved clinical issue that perturbs the generated trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioTag {
    DawnPhenomenon,
    AfternoonLows,
    PostMealSpikes,
    NocturnalLows,
    HypoglycemiaUnawareness,
    #[default]
    None,
}

impl ScenarioTag {
    pub const ALL: [ScenarioTag; 6] = [
        ScenarioTag::DawnPhenomenon,
        ScenarioTag::AfternoonLows,
        ScenarioTag::PostMealSpikes,
        ScenarioTag::NocturnalLows,
        ScenarioTag::HypoglycemiaUnawareness,
        ScenarioTag::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioTag::DawnPhenomenon => "dawn_phenomenon",
            ScenarioTag::AfternoonLows => "afternoon_lows",
            ScenarioTag::PostMealSpikes => "post_meal_spikes",
            ScenarioTag::NocturnalLows => "nocturnal_lows",
            ScenarioTag::HypoglycemiaUnawareness => "hypoglycemia_unawareness",
            ScenarioTag::None => "none",
        }
    }
}

impl FromStr for ScenarioTag {
    type Err = TutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioTag::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TutorError::invalid(format!("unknown scenario '{}'", s)))
    }
}

/// Week of the 12-week journey, always within [0, 11].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct WeekIndex(u8);

impl WeekIndex {
    pub const FIRST: WeekIndex = WeekIndex(0);
    pub const LAST: WeekIndex = WeekIndex(FINAL_WEEK);

    pub fn new(week: u8) -> TutorResult<Self> {
        if week > FINAL_WEEK {
            return Err(TutorError::invalid(format!(
                "week {} is past the final week {}",
                week, FINAL_WEEK
            )));
        }
        Ok(WeekIndex(week))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Following week, saturating at the final week.
    pub fn next(self) -> WeekIndex {
        WeekIndex((self.0 + 1).min(FINAL_WEEK))
    }

    /// Preceding week, saturating at week 0.
    pub fn previous(self) -> WeekIndex {
        WeekIndex(self.0.saturating_sub(1))
    }

    pub fn is_last(self) -> bool {
        self.0 == FINAL_WEEK
    }

    pub fn allows_adjustment(self) -> bool {
        self.0 < ADJUSTMENT_WEEKS
    }
}

impl TryFrom<u8> for WeekIndex {
    type Error = TutorError;

    fn try_from(week: u8) -> Result<Self, Self::Error> {
        WeekIndex::new(week)
    }
}

impl From<WeekIndex> for u8 {
    fn from(week: WeekIndex) -> u8 {
        week.0
    }
}

/// Pump therapy settings a learner can adjust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapySettings {
    /// U/hr, one entry per hour of day.
    pub basal_profile: Vec<f64>,
    /// Grams of carbohydrate covered by one unit.
    #[serde(default)]
    pub ic_ratios: BTreeMap<Meal, f64>,
    /// mg/dL drop per unit.
    pub correction_factor: f64,
    pub target_glucose: f64,
}

impl TherapySettings {
    pub fn ic_ratio(&self, meal: Meal) -> Option<f64> {
        self.ic_ratios.get(&meal).copied()
    }

    pub fn has_ic_ratios(&self) -> bool {
        !self.ic_ratios.is_empty()
    }

    /// Basal rate at `hour`, or a mismatch error when the profile is short.
    pub fn basal_at(&self, hour: u32) -> TutorResult<f64> {
        self.basal_profile
            .get(hour as usize)
            .copied()
            .ok_or_else(|| self.profile_mismatch())
    }

    pub(crate) fn profile_mismatch(&self) -> TutorError {
        TutorError::ConfigurationMismatch {
            field: "basal_profile".to_string(),
            expected: HOURS_PER_DAY,
            actual: self.basal_profile.len(),
        }
    }
}

impl std::fmt::Display for TherapySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let basal: Vec<String> = self.basal_profile.iter().map(|r| format!("{:.1}", r)).collect();
        writeln!(f, "  basal_profile:     [{}] U/hr", basal.join(", "))?;
        for (meal, ratio) in &self.ic_ratios {
            writeln!(f, "  ic_ratio.{:<9} 1 U : {} g", meal.as_str(), ratio)?;
        }
        writeln!(f, "  correction_factor: {} mg/dL per U", self.correction_factor)?;
        write!(f, "  target_glucose:    {} mg/dL", self.target_glucose)
    }
}

/// One CGM reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlucoseSample {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Time-ascending glucose readings at a fixed 5-minute cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedTrace")]
pub struct Trace {
    samples: Vec<GlucoseSample>,
}

#[derive(Deserialize)]
struct UncheckedTrace {
    samples: Vec<GlucoseSample>,
}

impl TryFrom<UncheckedTrace> for Trace {
    type Error = TutorError;

    fn try_from(raw: UncheckedTrace) -> TutorResult<Self> {
        let step = Duration::minutes(SAMPLE_INTERVAL_MINUTES);
        for (i, sample) in raw.samples.iter().enumerate() {
            if !(GLUCOSE_FLOOR..=GLUCOSE_CEILING).contains(&sample.value) {
                return Err(TutorError::validation(
                    format!("trace[{}]", i),
                    sample.value,
                    GLUCOSE_FLOOR,
                    GLUCOSE_CEILING,
                ));
            }
            if i > 0 && sample.timestamp - raw.samples[i - 1].timestamp != step {
                return Err(TutorError::invalid(format!(
                    "trace[{}] breaks the {}-minute cadence",
                    i, SAMPLE_INTERVAL_MINUTES
                )));
            }
        }
        Ok(Trace {
            samples: raw.samples,
        })
    }
}

impl Trace {
    /// First timestamp of every trace: 2024-01-01T00:00.
    pub fn reference_start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap_or_default()
            .and_time(NaiveTime::MIN)
    }

    pub fn timestamp_at(index: usize) -> NaiveDateTime {
        Self::reference_start() + Duration::minutes(index as i64 * SAMPLE_INTERVAL_MINUTES)
    }

    /// Build a trace from raw values laid out from the reference instant.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> TutorResult<Self> {
        let mut samples = Vec::new();
        for (i, value) in values.into_iter().enumerate() {
            if !(GLUCOSE_FLOOR..=GLUCOSE_CEILING).contains(&value) {
                return Err(TutorError::validation(
                    format!("trace[{}]", i),
                    value,
                    GLUCOSE_FLOOR,
                    GLUCOSE_CEILING,
                ));
            }
            samples.push(GlucoseSample {
                timestamp: Self::timestamp_at(i),
                value,
            });
        }
        Ok(Trace { samples })
    }

    pub(crate) fn from_samples(samples: Vec<GlucoseSample>) -> Self {
        Trace { samples }
    }

    pub fn samples(&self) -> &[GlucoseSample] {
        &self.samples
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Summary statistics of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub time_in_range: f64,
    pub time_below_70: f64,
    pub time_above_180: f64,
    pub mean_glucose: f64,
    pub gmi: f64,
    pub cv: f64,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  time in range:   {:.1}%", self.time_in_range)?;
        writeln!(f, "  time below 70:   {:.1}%", self.time_below_70)?;
        writeln!(f, "  time above 180:  {:.1}%", self.time_above_180)?;
        writeln!(f, "  mean glucose:    {:.0} mg/dL", self.mean_glucose)?;
        writeln!(f, "  GMI (est. A1C):  {:.1}%", self.gmi)?;
        write!(f, "  CV:              {:.1}%", self.cv)
    }
}

/// Traffic-light reading of a metric against clinical targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeBand {
    OnTarget,
    Borderline,
    OffTarget,
}

/// Classification of an adjustment by its change in time in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Excellent,
    Good,
    NoneOrNegative,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentVerdict {
    pub outcome: Outcome,
    /// after.time_in_range - before.time_in_range, percentage points.
    pub delta_tir: f64,
}

impl AdjustmentVerdict {
    pub fn feedback(&self) -> String {
        match self.outcome {
            Outcome::Excellent => format!(
                "Excellent adjustment: time in range improved by {:.1}%.",
                self.delta_tir
            ),
            Outcome::Good => format!(
                "Good adjustment: time in range improved by {:.1}%. Consider additional fine-tuning.",
                self.delta_tir
            ),
            Outcome::NoneOrNegative => {
                "This adjustment may not improve glucose control. Review the patterns and consider different settings."
                    .to_string()
            }
        }
    }
}

/// Before/after comparison produced by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub before_trace: Trace,
    pub after_trace: Trace,
    pub before_metrics: MetricsSummary,
    pub after_metrics: MetricsSummary,
    pub verdict: AdjustmentVerdict,
}
