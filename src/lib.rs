//! Insulin-pump teaching core: synthetic CGM traces, glucose metrics and
//! evaluation of learner adjustments over a 12-week journey.

pub mod cases;
pub mod config;
pub mod constants;
pub mod error;
pub mod evaluator;
pub mod explorer;
pub mod generator;
pub mod invariants;
pub mod metrics;
pub mod replay;
pub mod rng;
pub mod session;
pub mod types;

pub use error::{TutorError, TutorResult};
pub use evaluator::evaluate;
pub use generator::generate;
pub use metrics::summarize;
