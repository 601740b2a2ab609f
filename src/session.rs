// Session: one learner's progress through a patient case.
// Every operation takes the session by reference and returns the next one;
// a failed operation leaves the caller's session as it was.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cases::PatientCase;
use crate::config::TutorConfig;
use crate::error::{TutorError, TutorResult};
use crate::evaluator::evaluate_with;
use crate::generator::generate_seeded;
use crate::metrics::summarize;
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LearningStats {
    pub adjustments_made: u32,
    pub successful_outcomes: u32,
    pub patients_completed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub case_id: String,
    pub scenario: ScenarioTag,
    /// Baseline settings of the case, never edited.
    pub original: TherapySettings,
    /// Settings currently programmed on the pump.
    pub working: TherapySettings,
    /// Working settings as they stood when the current week was entered;
    /// proposals are compared against these.
    pub week_baseline: TherapySettings,
    pub week: WeekIndex,
    pub adjustment_made: bool,
    pub journey_complete: bool,
    pub stats: LearningStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekTransition {
    Advanced(WeekIndex),
    Reviewed(WeekIndex),
    JourneyComplete,
    Unchanged,
}

impl std::fmt::Display for WeekTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeekTransition::Advanced(w) => write!(f, "Advanced(week {})", w.get() + 1),
            WeekTransition::Reviewed(w) => write!(f, "Reviewed(week {})", w.get() + 1),
            WeekTransition::JourneyComplete => write!(f, "JourneyComplete"),
            WeekTransition::Unchanged => write!(f, "Unchanged"),
        }
    }
}

/// What the learner sees for the current week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekView {
    pub week: WeekIndex,
    pub trace: Trace,
    pub metrics: MetricsSummary,
}

impl Session {
    pub fn new(case_id: impl Into<String>, scenario: ScenarioTag, original: TherapySettings) -> Self {
        Session {
            case_id: case_id.into(),
            scenario,
            working: original.clone(),
            week_baseline: original.clone(),
            original,
            week: WeekIndex::FIRST,
            adjustment_made: false,
            journey_complete: false,
            stats: LearningStats::default(),
        }
    }

    pub fn start(case: &PatientCase) -> Self {
        Self::new(case.id, case.scenario, case.baseline())
    }

    /// Weeks 8-11 only show the trace; no adjustments.
    pub fn in_maintenance(&self) -> bool {
        !self.week.allows_adjustment()
    }

    pub fn current_view(&self, config: &TutorConfig) -> TutorResult<WeekView> {
        let trace = generate_seeded(
            config.trace_days,
            &self.working,
            self.scenario,
            self.week,
            config.seed_base,
        )?;
        let metrics = summarize(&trace)?;
        Ok(WeekView {
            week: self.week,
            trace,
            metrics,
        })
    }

    /// Evaluate `proposed` against this week's baseline and, if it is valid,
    /// program it.
    pub fn propose(
        &self,
        proposed: TherapySettings,
        config: &TutorConfig,
    ) -> TutorResult<(Session, EvaluationResult)> {
        if self.in_maintenance() {
            return Err(TutorError::invalid(format!(
                "week {} is in the maintenance phase",
                self.week.get() + 1
            )));
        }
        let result = evaluate_with(
            &self.week_baseline,
            &proposed,
            self.scenario,
            self.week,
            config.trace_days,
            config.seed_base,
        )?;

        let mut stats = self.stats;
        stats.adjustments_made += 1;
        if result.verdict.outcome == Outcome::Excellent {
            stats.successful_outcomes += 1;
        }
        let next = Session {
            working: proposed,
            adjustment_made: true,
            stats,
            ..self.clone()
        };
        Ok((next, result))
    }

    pub fn advance(&self) -> (Session, WeekTransition) {
        if self.week.is_last() {
            return (self.clone(), WeekTransition::JourneyComplete);
        }
        let week = self.week.next();
        let mut stats = self.stats;
        let completes = week.is_last() && !self.journey_complete;
        if completes {
            stats.patients_completed += 1;
        }
        let transition = if week.is_last() {
            WeekTransition::JourneyComplete
        } else {
            WeekTransition::Advanced(week)
        };
        info!(case = %self.case_id, week = week.get(), %transition, "advanced week");
        let next = Session {
            week,
            week_baseline: self.working.clone(),
            adjustment_made: false,
            journey_complete: self.journey_complete || completes,
            stats,
            ..self.clone()
        };
        (next, transition)
    }

    pub fn review_previous(&self) -> (Session, WeekTransition) {
        if self.week == WeekIndex::FIRST {
            return (self.clone(), WeekTransition::Unchanged);
        }
        let week = self.week.previous();
        info!(case = %self.case_id, week = week.get(), "reviewing previous week");
        let next = Session {
            week,
            week_baseline: self.working.clone(),
            adjustment_made: false,
            ..self.clone()
        };
        (next, WeekTransition::Reviewed(week))
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  case:                {}", self.case_id)?;
        writeln!(f, "  scenario:            {}", self.scenario.as_str())?;
        writeln!(f, "  week:                {} of 12", self.week.get() + 1)?;
        writeln!(f, "  adjustment_made:     {}", self.adjustment_made)?;
        writeln!(f, "  journey_complete:    {}", self.journey_complete)?;
        writeln!(f, "  adjustments_made:    {}", self.stats.adjustments_made)?;
        writeln!(f, "  successful_outcomes: {}", self.stats.successful_outcomes)?;
        writeln!(f, "  working settings:")?;
        write!(f, "{}", self.working)
    }
}
