// Explorer: random learner walks over sessions.
// Each step picks one enabled action at random (advance, review, or a settings
// nudge) and checks every invariant on the resulting session and its traces.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};

use crate::cases::CASES;
use crate::config::TutorConfig;
use crate::constants::*;
use crate::invariants;
use crate::replay::{apply_action, SessionAction};
use crate::session::Session;
use crate::types::*;

#[derive(Debug, Clone, Copy)]
pub enum Move {
    Advance,
    ReviewPrevious,
    NudgeBasal,
    NudgeIcRatio,
    NudgeCorrectionFactor,
    NudgeTarget,
}

const ALL_MOVES: &[Move] = &[
    Move::Advance,
    Move::ReviewPrevious,
    Move::NudgeBasal,
    Move::NudgeIcRatio,
    Move::NudgeCorrectionFactor,
    Move::NudgeTarget,
];

const BASAL_NUDGES: &[f64] = &[-0.3, -0.2, -0.1, 0.1, 0.2, 0.3];
const RATIO_NUDGES: &[f64] = &[-3.0, -2.0, -1.0, 1.0, 2.0, 3.0];
const STEP_NUDGES: &[f64] = &[-10.0, -5.0, 5.0, 10.0];

fn round_to_basal_grid(rate: f64) -> f64 {
    (rate / BASAL_STEP).round() * BASAL_STEP
}

/// Working settings with one field nudged, kept inside its valid range.
fn nudged(settings: &TherapySettings, mv: Move, rng: &mut impl Rng) -> Option<TherapySettings> {
    let mut next = settings.clone();
    match mv {
        Move::NudgeBasal => {
            let hour = rng.gen_range(0..next.basal_profile.len().max(1));
            let delta = BASAL_NUDGES.choose(rng)?;
            let rate = next.basal_profile.get_mut(hour)?;
            *rate = round_to_basal_grid((*rate + delta).clamp(BASAL_MIN, BASAL_MAX));
        }
        Move::NudgeIcRatio => {
            let meal = *Meal::ALL.choose(rng)?;
            let delta = RATIO_NUDGES.choose(rng)?;
            let ratio = next.ic_ratios.get_mut(&meal)?;
            *ratio = (*ratio + delta).clamp(IC_RATIO_MIN, IC_RATIO_MAX);
        }
        Move::NudgeCorrectionFactor => {
            let delta = STEP_NUDGES.choose(rng)?;
            next.correction_factor = (next.correction_factor + delta)
                .clamp(CORRECTION_FACTOR_MIN, CORRECTION_FACTOR_MAX);
        }
        Move::NudgeTarget => {
            let delta = STEP_NUDGES.choose(rng)?;
            next.target_glucose =
                (next.target_glucose + delta).clamp(TARGET_GLUCOSE_MIN, TARGET_GLUCOSE_MAX);
        }
        Move::Advance | Move::ReviewPrevious => return None,
    }
    Some(next)
}

fn action_for(session: &Session, mv: Move, rng: &mut impl Rng) -> Option<SessionAction> {
    match mv {
        Move::Advance => Some(SessionAction::Advance),
        Move::ReviewPrevious => Some(SessionAction::ReviewPrevious),
        _ if session.in_maintenance() => None,
        _ => nudged(&session.working, mv, rng).map(SessionAction::Propose),
    }
}

/// Take one random enabled step. Returns the action taken and the new
/// session, or None when nothing could be applied.
pub fn step(
    session: &Session,
    config: &TutorConfig,
    rng: &mut impl Rng,
) -> Option<(SessionAction, Session)> {
    let mut moves: Vec<Move> = ALL_MOVES.to_vec();
    moves.shuffle(rng);

    for mv in moves {
        let Some(action) = action_for(session, mv, rng) else {
            continue;
        };
        if let Ok((next, _)) = apply_action(session, &action, config) {
            return Some((action, next));
        }
    }
    None
}

pub struct WalkResult {
    pub steps: usize,
    pub violation: Option<(&'static str, usize, Session)>,
    pub final_session: Session,
}

fn first_violation(session: &Session, config: &TutorConfig) -> Option<&'static str> {
    if let Err(name) = invariants::check_invariants(session) {
        return Some(name);
    }
    match session.current_view(config) {
        Ok(view) => invariants::check_trace(&view.trace).err(),
        Err(_) => Some("currentViewGenerates"),
    }
}

/// One walk of up to `max_steps` from the start of a random case.
pub fn run_walk(
    max_steps: usize,
    config: &TutorConfig,
    rng: &mut impl Rng,
    verbose: bool,
) -> WalkResult {
    let mut session = Session::start(&CASES[rng.gen_range(0..CASES.len())]);

    if verbose {
        println!("[Session 0] start");
        println!("{}\n", session);
    }

    if let Some(violated) = first_violation(&session, config) {
        return WalkResult {
            steps: 0,
            violation: Some((violated, 0, session.clone())),
            final_session: session,
        };
    }

    let mut taken = 0;
    for step_num in 1..=max_steps {
        let Some((action, next)) = step(&session, config, rng) else {
            break;
        };
        taken = step_num;

        if verbose {
            println!("[Session {}] {}", step_num, action);
            println!("{}\n", next);
        }

        session = next;

        if let Some(violated) = first_violation(&session, config) {
            if verbose {
                println!("!!! INVARIANT VIOLATION: {} at step {}", violated, step_num);
            }
            return WalkResult {
                steps: step_num,
                violation: Some((violated, step_num, session.clone())),
                final_session: session,
            };
        }
    }

    WalkResult {
        steps: taken,
        violation: None,
        final_session: session,
    }
}

pub struct ViolationInfo {
    pub invariant: &'static str,
    pub walk: usize,
    pub step: usize,
    pub session: Session,
}

/// Totals over every walk of one exploration run.
pub struct ExplorationResult {
    pub seed: u64,
    pub walks: usize,
    pub actions: usize,
    pub journeys_completed: usize,
    pub adjustments: u32,
    pub elapsed: std::time::Duration,
    pub violation: Option<ViolationInfo>,
}

/// Run up to `max_samples` learner walks of `max_steps` actions from one
/// seed, stopping at the first invariant violation.
pub fn run_exploration(
    max_steps: usize,
    max_samples: usize,
    seed: u64,
    config: &TutorConfig,
    verbose: bool,
) -> ExplorationResult {
    use rand::SeedableRng;
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let started = std::time::Instant::now();

    let mut result = ExplorationResult {
        seed,
        walks: 0,
        actions: 0,
        journeys_completed: 0,
        adjustments: 0,
        elapsed: std::time::Duration::ZERO,
        violation: None,
    };
    for walk in 0..max_samples {
        let outcome = run_walk(max_steps, config, &mut rng, verbose && walk == 0);
        result.walks += 1;
        result.actions += outcome.steps;
        result.adjustments += outcome.final_session.stats.adjustments_made;
        if outcome.final_session.journey_complete {
            result.journeys_completed += 1;
        }
        if let Some((invariant, step, session)) = outcome.violation {
            warn!(walk, step, invariant, case = %session.case_id, "invariant violated");
            result.violation = Some(ViolationInfo {
                invariant,
                walk,
                step,
                session,
            });
            break;
        }
    }
    result.elapsed = started.elapsed();
    info!(
        walks = result.walks,
        actions = result.actions,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "exploration finished"
    );
    result
}

impl std::fmt::Display for ExplorationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "walks: {}  actions: {}  adjustments: {}  journeys completed: {}",
            self.walks, self.actions, self.adjustments, self.journeys_completed
        )?;
        writeln!(f, "time:  {} ms", self.elapsed.as_millis())?;
        match &self.violation {
            None => writeln!(f, "every session and week trace held its invariants")?,
            Some(v) => {
                writeln!(
                    f,
                    "{} broke on walk {} after action {} (case {}, week {})",
                    v.invariant,
                    v.walk,
                    v.step,
                    v.session.case_id,
                    v.session.week.get() + 1
                )?;
                write!(f, "{}", v.session)?;
            }
        }
        write!(f, "rerun with --seed {}", self.seed)
    }
}
