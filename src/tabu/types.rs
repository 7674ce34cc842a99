//! Core traits for Tabu Search problems and cost evaluators.

use std::fmt::Debug;
use std::hash::Hash;

use rand::Rng;
use rayon::prelude::*;

use crate::error::Result;

/// A reversible transformation between two feasible solutions.
///
/// Tabu status is tracked through *keys*: a move is tabu when any of its
/// [`keys`](TabuMove::keys) was recorded by a recently accepted move's
/// [`tabu_keys`](TabuMove::tabu_keys).
pub trait TabuMove: Clone + Send + Sync {
    /// Attribute identifying (part of) a move in the tabu list.
    type Key: Eq + Hash + Clone + Debug + Send + Sync;

    /// Keys checked against the tabu list before this move is accepted.
    fn keys(&self) -> Vec<Self::Key>;

    /// Keys recorded in the tabu list after this move is accepted.
    ///
    /// Usually the keys of the reverse move, so that stepping straight back
    /// is what gets forbidden.
    fn tabu_keys(&self) -> Vec<Self::Key>;
}

/// A candidate solution together with the move that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor<S, M> {
    /// The solution after applying `mv`.
    pub solution: S,
    /// The move leading to `solution`.
    pub mv: M,
}

/// Defines a combinatorial optimization problem for Tabu Search.
///
/// Users implement this trait to specify:
/// - How to create a random feasible solution
/// - How to enumerate the neighborhood of a solution
///
/// Cost evaluation is handled separately by a [`CostEvaluator`], so the same
/// problem can be scored in-process or by an external tool.
pub trait TabuProblem: Send + Sync {
    /// The solution type.
    type Solution: Clone + Send + Sync;

    /// The move type.
    type Move: TabuMove;

    /// Creates a random feasible solution.
    fn initial_solution<R: Rng>(&self, rng: &mut R) -> Self::Solution;

    /// Enumerates every feasible neighbor of `solution`, in a fixed order.
    fn neighbors(&self, solution: &Self::Solution) -> Vec<Neighbor<Self::Solution, Self::Move>>;

    /// Draws up to `sample_size` neighbors uniformly without replacement.
    ///
    /// `None`, or a size at least as large as the neighborhood, returns the
    /// whole neighborhood in generation order. Implementations whose
    /// neighborhood is index-addressable may override this to avoid
    /// materializing neighbors that are not drawn.
    fn sample_neighbors<R: Rng>(
        &self,
        solution: &Self::Solution,
        sample_size: Option<usize>,
        rng: &mut R,
    ) -> Vec<Neighbor<Self::Solution, Self::Move>> {
        let all = self.neighbors(solution);
        match sample_size {
            Some(k) if k < all.len() => {
                let picked = rand::seq::index::sample(rng, all.len(), k);
                let mut slots: Vec<Option<_>> = all.into_iter().map(Some).collect();
                picked.iter().filter_map(|i| slots[i].take()).collect()
            }
            _ => all,
        }
    }

    /// Called after each iteration with the current and best costs.
    ///
    /// Default implementation does nothing.
    fn on_iteration(&self, _iteration: usize, _current_cost: f64, _best_cost: f64) {}
}

/// Cost of one candidate plus whatever the evaluator produced alongside it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evaluation<P> {
    /// Scalar cost (lower is better).
    pub cost: f64,
    /// Auxiliary result, e.g. an inferred tree.
    pub payload: P,
}

/// Scores a batch of candidate solutions.
///
/// Implementations must be deterministic for identical input, must not
/// alter the candidates, and must return one [`Evaluation`] per candidate
/// in submission order. Any failure aborts the whole batch.
pub trait CostEvaluator<S> {
    /// Auxiliary result attached to each cost.
    type Payload: Clone + Send;

    /// Evaluates all `candidates` of batch number `batch`.
    ///
    /// `batch` is the search iteration that submitted the candidates
    /// (0 for the initial solution); evaluators that write artifacts use it
    /// to keep names unique across iterations.
    fn evaluate_batch(
        &self,
        batch: usize,
        candidates: &[&S],
    ) -> Result<Vec<Evaluation<Self::Payload>>>;
}

/// In-process evaluator wrapping a pure cost function.
///
/// # Examples
///
/// ```
/// use u_labelsearch::tabu::{CostEvaluator, LocalEvaluator};
///
/// let eval = LocalEvaluator::new(|x: &i32| (*x as f64).abs());
/// let costs = eval.evaluate_batch(1, &[&-3, &2]).unwrap();
/// assert_eq!(costs[0].cost, 3.0);
/// assert_eq!(costs[1].cost, 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct LocalEvaluator<F> {
    cost_fn: F,
    parallel: bool,
}

impl<F> LocalEvaluator<F> {
    /// Wraps `cost_fn`; candidates are scored sequentially.
    pub fn new(cost_fn: F) -> Self {
        Self {
            cost_fn,
            parallel: false,
        }
    }

    /// Scores candidates in parallel using rayon.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

impl<S, F> CostEvaluator<S> for LocalEvaluator<F>
where
    S: Sync,
    F: Fn(&S) -> f64 + Sync,
{
    type Payload = ();

    fn evaluate_batch(&self, _batch: usize, candidates: &[&S]) -> Result<Vec<Evaluation<()>>> {
        let score = |c: &&S| Evaluation {
            cost: (self.cost_fn)(*c),
            payload: (),
        };
        if self.parallel {
            Ok(candidates.par_iter().map(score).collect())
        } else {
            Ok(candidates.iter().map(score).collect())
        }
    }
}

/// A solution together with its evaluation and the iteration that found it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluatedSolution<S, P> {
    /// The solution.
    pub solution: S,
    /// Evaluator payload (None until the solution has been evaluated).
    pub payload: Option<P>,
    /// Cost (`+inf` until the solution has been evaluated).
    pub cost: f64,
    /// Iteration at which the solution was reached.
    pub iteration: usize,
}

impl<S, P> EvaluatedSolution<S, P> {
    /// Wraps a solution that has not been evaluated yet.
    pub fn unevaluated(solution: S, iteration: usize) -> Self {
        Self {
            solution,
            payload: None,
            cost: f64::INFINITY,
            iteration,
        }
    }
}
