//! Tabu Search (TS).
//!
//! A single-solution trajectory metaheuristic that uses memory structures
//! (the tabu list) to forbid recently visited moves, preventing cycling
//! and encouraging exploration of new regions of the search space.
//!
//! The engine is split along three seams:
//!
//! - [`TabuProblem`]: random feasible start and neighborhood enumeration
//! - [`CostEvaluator`]: batched, order-preserving scoring of candidates,
//!   either in-process ([`LocalEvaluator`]) or through an external tool
//! - [`TabuRunner`]: the driver loop with aspiration, tabu-list decay and
//!   stagnation restarts
//!
//! # References
//!
//! - Glover, F. (1989). "Tabu Search—Part I", *ORSA Journal on Computing* 1(3), 190-206.
//! - Glover, F. (1990). "Tabu Search—Part II", *ORSA Journal on Computing* 2(1), 4-32.

mod config;
mod runner;
mod tabu_list;
mod types;

pub use config::TabuConfig;
pub use runner::{SearchPhase, SearchState, StateOf, StepOutcome, TabuResult, TabuRunner};
pub use tabu_list::TabuList;
pub use types::{
    CostEvaluator, EvaluatedSolution, Evaluation, LocalEvaluator, Neighbor, TabuMove,
    TabuProblem,
};
