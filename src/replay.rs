// Deterministic replay of labeled session actions.
// Given a sequence of SessionActions, applies each to a session and returns
// the resulting session sequence, checking invariants after every step.

use thiserror::Error;

use crate::config::TutorConfig;
use crate::error::{TutorError, TutorResult};
use crate::invariants;
use crate::session::{Session, WeekTransition};
use crate::types::*;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    Advance,
    ReviewPrevious,
    Propose(TherapySettings),
}

impl std::fmt::Display for SessionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionAction::Advance => write!(f, "Advance"),
            SessionAction::ReviewPrevious => write!(f, "ReviewPrevious"),
            SessionAction::Propose(settings) => write!(
                f,
                "Propose(cf={}, target={})",
                settings.correction_factor, settings.target_glucose
            ),
        }
    }
}

/// What a single action produced besides the next session.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Week(WeekTransition),
    Evaluated(AdjustmentVerdict),
}

pub fn apply_action(
    session: &Session,
    action: &SessionAction,
    config: &TutorConfig,
) -> TutorResult<(Session, ActionOutcome)> {
    match action {
        SessionAction::Advance => {
            let (next, t) = session.advance();
            Ok((next, ActionOutcome::Week(t)))
        }
        SessionAction::ReviewPrevious => {
            let (next, t) = session.review_previous();
            Ok((next, ActionOutcome::Week(t)))
        }
        SessionAction::Propose(settings) => {
            let (next, result) = session.propose(settings.clone(), config)?;
            Ok((next, ActionOutcome::Evaluated(result.verdict)))
        }
    }
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("action {index} ({action}) failed: {source}")]
    Action {
        index: usize,
        action: String,
        #[source]
        source: TutorError,
    },
    #[error("invariant '{invariant}' violated after action {index} ({action})")]
    Invariant {
        index: usize,
        action: String,
        invariant: &'static str,
    },
}

/// Replay `actions` from `init`, returning (outcome, session) per step.
pub fn replay_actions(
    init: Session,
    actions: &[SessionAction],
    config: &TutorConfig,
) -> Result<Vec<(ActionOutcome, Session)>, ReplayError> {
    let mut steps = Vec::with_capacity(actions.len());
    let mut session = init;

    for (index, action) in actions.iter().enumerate() {
        let (next, outcome) =
            apply_action(&session, action, config).map_err(|source| ReplayError::Action {
                index,
                action: action.to_string(),
                source,
            })?;

        invariants::check_invariants(&next).map_err(|invariant| ReplayError::Invariant {
            index,
            action: action.to_string(),
            invariant,
        })?;

        session = next;
        steps.push((outcome, session.clone()));
    }

    Ok(steps)
}
