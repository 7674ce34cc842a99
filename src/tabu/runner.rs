//! Tabu Search execution engine.
//!
//! # Algorithm
//!
//! 1. Generate a random feasible initial solution (optionally evaluated)
//! 2. At each iteration:
//!    a. Sample the neighborhood of the current solution
//!    b. Evaluate every sampled candidate in one batch
//!    c. Walk the candidates by ascending cost and accept the first one that
//!       either beats the best cost of the current restart segment or whose
//!       move is not tabu
//!    d. Record the accepted move's tabu keys; if nothing was accepted,
//!       drop the oldest tabu entry instead
//!    e. Update the segment best and the global best
//!    f. Restart from a fresh random solution after too many accepted steps
//!       without segment improvement
//! 3. Terminate after the iteration budget; report the global best
//!
//! The acceptance walk in step 2c deliberately takes the *first* candidate
//! satisfying either condition. A cheaper tabu candidate that does not beat
//! the segment best is skipped in favour of the next non-tabu one.
//!
//! # Reference
//!
//! Glover, F. (1989). "Tabu Search—Part I", *ORSA Journal on Computing* 1(3), 190-206.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::config::TabuConfig;
use super::tabu_list::TabuList;
use super::types::{CostEvaluator, EvaluatedSolution, TabuMove, TabuProblem};
use crate::error::{Result, SearchError};

/// Phase of the search state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// Iterations remain.
    Running,
    /// Stagnation detected; the next transition draws a fresh solution.
    Reinitializing,
    /// The iteration budget is spent.
    Terminated,
}

/// What happened during one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A candidate was accepted.
    Accepted {
        /// Number of cheaper candidates skipped because they were tabu.
        rejected: usize,
        /// Whether the accepted candidate is a new global best.
        improved: bool,
    },
    /// Every sampled candidate was tabu and none beat the segment best.
    NoMove,
}

/// Complete mutable state of a search, threaded through [`TabuRunner::step`].
#[derive(Debug, Clone)]
pub struct SearchState<S, K, P> {
    /// Current phase.
    pub phase: SearchPhase,
    /// Last completed iteration (0 before the first one).
    pub iteration: usize,
    /// Solution the next neighborhood is drawn from.
    pub current: EvaluatedSolution<S, P>,
    /// Best solution since the last restart.
    pub best_run: EvaluatedSolution<S, P>,
    /// Best solution over the entire search.
    pub best: EvaluatedSolution<S, P>,
    /// Recently accepted move keys.
    pub tabu: TabuList<K>,
    /// Accepted steps since `best_run` last improved.
    pub n_unimproved: usize,
    /// Number of restarts performed.
    pub reinitializations: usize,
}

/// Shorthand for the state type of a problem/evaluator pair.
pub type StateOf<Pr, E> = SearchState<
    <Pr as TabuProblem>::Solution,
    <<Pr as TabuProblem>::Move as TabuMove>::Key,
    <E as CostEvaluator<<Pr as TabuProblem>::Solution>>::Payload,
>;

/// Result of a Tabu Search run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TabuResult<S, P> {
    /// Best solution found, with its cost, payload and iteration.
    pub best: EvaluatedSolution<S, P>,
    /// Total iterations executed.
    pub iterations: usize,
    /// Number of restarts performed.
    pub reinitializations: usize,
    /// Global best cost after each iteration.
    pub cost_history: Vec<f64>,
    /// Whether the run was stopped through the cancellation flag.
    pub cancelled: bool,
}

impl<S, P> TabuResult<S, P> {
    /// Cost of the best solution.
    pub fn best_cost(&self) -> f64 {
        self.best.cost
    }

    /// Iteration at which the best solution was found.
    pub fn best_iteration(&self) -> usize {
        self.best.iteration
    }
}

/// Tabu Search runner.
pub struct TabuRunner;

impl TabuRunner {
    /// Executes Tabu Search, seeding the random source from `config.seed`.
    pub fn run<Pr, E>(
        problem: &Pr,
        evaluator: &E,
        config: &TabuConfig,
    ) -> Result<TabuResult<Pr::Solution, E::Payload>>
    where
        Pr: TabuProblem,
        E: CostEvaluator<Pr::Solution>,
    {
        Self::run_with_cancel(problem, evaluator, config, None)
    }

    /// Executes Tabu Search with an optional cancellation flag, checked
    /// before every iteration.
    pub fn run_with_cancel<Pr, E>(
        problem: &Pr,
        evaluator: &E,
        config: &TabuConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<TabuResult<Pr::Solution, E::Payload>>
    where
        Pr: TabuProblem,
        E: CostEvaluator<Pr::Solution>,
    {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };
        Self::run_with_rng(problem, evaluator, config, &mut rng, cancel)
    }

    /// Executes Tabu Search drawing all randomness from `rng`.
    #[tracing::instrument(
        level = "debug",
        name = "Tabu Search",
        skip_all,
        fields(max_iterations = config.max_iterations, tenure = config.tabu_tenure)
    )]
    pub fn run_with_rng<Pr, E, R>(
        problem: &Pr,
        evaluator: &E,
        config: &TabuConfig,
        rng: &mut R,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<TabuResult<Pr::Solution, E::Payload>>
    where
        Pr: TabuProblem,
        E: CostEvaluator<Pr::Solution>,
        R: Rng,
    {
        let mut state = Self::initial_state(problem, evaluator, config, rng)?;
        let mut cost_history = Vec::with_capacity(config.max_iterations);
        let mut cancelled = false;

        while state.phase != SearchPhase::Terminated {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }

            let (next, _) = Self::step(problem, evaluator, config, state, rng)?;
            state = next;
            cost_history.push(state.best.cost);
            problem.on_iteration(state.iteration, state.current.cost, state.best.cost);
        }

        info!(
            best_cost = state.best.cost,
            best_iteration = state.best.iteration,
            iterations = state.iteration,
            "tabu search finished"
        );

        Ok(TabuResult {
            best: state.best,
            iterations: state.iteration,
            reinitializations: state.reinitializations,
            cost_history,
            cancelled,
        })
    }

    /// Builds the starting state: a random feasible solution, an empty tabu
    /// list and, if `config.evaluate_initial` is set, the start's cost as
    /// the first global best.
    pub fn initial_state<Pr, E, R>(
        problem: &Pr,
        evaluator: &E,
        config: &TabuConfig,
        rng: &mut R,
    ) -> Result<StateOf<Pr, E>>
    where
        Pr: TabuProblem,
        E: CostEvaluator<Pr::Solution>,
        R: Rng,
    {
        config.validate()?;

        let mut current = EvaluatedSolution::unevaluated(problem.initial_solution(rng), 0);
        if config.evaluate_initial {
            let mut evaluations = evaluator.evaluate_batch(0, &[&current.solution])?;
            if evaluations.len() != 1 {
                return Err(SearchError::ResultCountMismatch {
                    expected: 1,
                    actual: evaluations.len(),
                });
            }
            let evaluation = evaluations.swap_remove(0);
            current.cost = evaluation.cost;
            current.payload = Some(evaluation.payload);
            info!(cost = current.cost, "initial solution evaluated");
        }

        // The segment best always starts unevaluated; only the global best
        // takes the scored start.
        Ok(SearchState {
            phase: SearchPhase::Running,
            iteration: 0,
            best_run: EvaluatedSolution::unevaluated(current.solution.clone(), 0),
            best: current.clone(),
            current,
            tabu: TabuList::new(config.tabu_tenure),
            n_unimproved: 0,
            reinitializations: 0,
        })
    }

    /// Advances the state machine by one iteration.
    ///
    /// A state in [`SearchPhase::Reinitializing`] is first restarted from a
    /// fresh random solution. A [`SearchPhase::Terminated`] state is
    /// returned unchanged with [`StepOutcome::NoMove`].
    pub fn step<Pr, E, R>(
        problem: &Pr,
        evaluator: &E,
        config: &TabuConfig,
        mut state: StateOf<Pr, E>,
        rng: &mut R,
    ) -> Result<(StateOf<Pr, E>, StepOutcome)>
    where
        Pr: TabuProblem,
        E: CostEvaluator<Pr::Solution>,
        R: Rng,
    {
        match state.phase {
            SearchPhase::Terminated => return Ok((state, StepOutcome::NoMove)),
            SearchPhase::Reinitializing => state = Self::reinitialize(problem, state, rng),
            SearchPhase::Running => {}
        }

        let iteration = state.iteration + 1;
        let mut neighbors =
            problem.sample_neighbors(&state.current.solution, config.sample_size, rng);
        if neighbors.is_empty() {
            return Err(SearchError::EmptyNeighborhood);
        }

        let mut evaluations = {
            let candidates: Vec<&Pr::Solution> = neighbors.iter().map(|n| &n.solution).collect();
            evaluator.evaluate_batch(iteration, &candidates)?
        };
        if evaluations.len() != neighbors.len() {
            return Err(SearchError::ResultCountMismatch {
                expected: neighbors.len(),
                actual: evaluations.len(),
            });
        }

        // Stable: equal costs keep neighborhood order.
        let mut order: Vec<usize> = (0..neighbors.len()).collect();
        order.sort_by(|&a, &b| evaluations[a].cost.total_cmp(&evaluations[b].cost));

        let mut rejected = 0;
        let mut chosen = None;
        for &j in &order {
            let improves_run = evaluations[j].cost < state.best_run.cost;
            if improves_run || !state.tabu.is_tabu(&neighbors[j].mv.keys()) {
                chosen = Some(j);
                break;
            }
            rejected += 1;
        }

        let outcome = match chosen {
            Some(j) => {
                let neighbor = neighbors.swap_remove(j);
                let evaluation = evaluations.swap_remove(j);

                state.tabu.push(neighbor.mv.tabu_keys());
                state.current = EvaluatedSolution {
                    solution: neighbor.solution,
                    payload: Some(evaluation.payload),
                    cost: evaluation.cost,
                    iteration,
                };

                if state.current.cost < state.best_run.cost {
                    state.best_run = state.current.clone();
                    state.n_unimproved = 0;
                } else {
                    state.n_unimproved += 1;
                }

                let improved = state.current.cost < state.best.cost;
                if improved {
                    state.best = state.current.clone();
                    info!(iteration, cost = state.best.cost, "new best solution");
                }
                StepOutcome::Accepted { rejected, improved }
            }
            None => {
                warn!(
                    iteration,
                    rejected, "every sampled move is tabu, shrinking tabu list"
                );
                state.tabu.shrink();
                StepOutcome::NoMove
            }
        };

        debug!(
            iteration,
            rejected,
            current = state.current.cost,
            best = state.best.cost,
            "iteration done"
        );

        state.iteration = iteration;
        state.phase = if iteration >= config.max_iterations {
            SearchPhase::Terminated
        } else if config
            .max_unimproved
            .is_some_and(|limit| state.n_unimproved >= limit)
        {
            SearchPhase::Reinitializing
        } else {
            SearchPhase::Running
        };

        Ok((state, outcome))
    }

    /// Discards the current solution, segment best and tabu list, keeping
    /// only the global best.
    fn reinitialize<Pr, K, P, R>(
        problem: &Pr,
        mut state: SearchState<Pr::Solution, K, P>,
        rng: &mut R,
    ) -> SearchState<Pr::Solution, K, P>
    where
        Pr: TabuProblem,
        K: Eq + std::hash::Hash + Clone,
        P: Clone,
        R: Rng,
    {
        info!(
            iteration = state.iteration,
            unimproved = state.n_unimproved,
            "reinitializing search"
        );
        state.current =
            EvaluatedSolution::unevaluated(problem.initial_solution(rng), state.iteration);
        state.best_run = state.current.clone();
        state.n_unimproved = 0;
        state.tabu.clear();
        state.reinitializations += 1;
        state.phase = SearchPhase::Running;
        state
    }
}
