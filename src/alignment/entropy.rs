//! Mean label entropy: the in-process cost of a cluster alignment.

use rayon::prelude::*;

use super::types::{MembershipTensor, Permutations};
use crate::error::Result;
use crate::tabu::{CostEvaluator, Evaluation};

/// Shannon entropy (natural log) of a non-negative count vector.
///
/// The vector is normalized to sum to one; zero entries contribute nothing.
/// An all-zero vector has entropy 0.
pub fn entropy(counts: &[f64]) -> f64 {
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|&&c| c > 0.0)
        .map(|&c| {
            let p = c / total;
            -p * p.ln()
        })
        .sum()
}

/// Mean over items of the entropy of each item's relabeled cluster sums.
///
/// Zero exactly when every run assigns every item to the same label after
/// relabeling (for hard 0/1 memberships).
pub fn mean_entropy(tensor: &MembershipTensor, perms: &[Vec<usize>]) -> f64 {
    let n = tensor.n_items();
    let total: f64 = (0..n)
        .map(|item| entropy(&tensor.permuted_row_sum(item, perms)))
        .sum();
    total / n as f64
}

/// Cost evaluator scoring label permutations by [`mean_entropy`].
#[derive(Debug, Clone)]
pub struct MeanEntropy<'a> {
    tensor: &'a MembershipTensor,
    parallel: bool,
}

impl<'a> MeanEntropy<'a> {
    /// Evaluator over `tensor`; candidates are scored sequentially.
    pub fn new(tensor: &'a MembershipTensor) -> Self {
        Self {
            tensor,
            parallel: false,
        }
    }

    /// Scores candidates in parallel using rayon.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

impl CostEvaluator<Permutations> for MeanEntropy<'_> {
    type Payload = ();

    fn evaluate_batch(
        &self,
        _batch: usize,
        candidates: &[&Permutations],
    ) -> Result<Vec<Evaluation<()>>> {
        let score = |perms: &&Permutations| Evaluation {
            cost: mean_entropy(self.tensor, perms),
            payload: (),
        };
        if self.parallel {
            Ok(candidates.par_iter().map(score).collect())
        } else {
            Ok(candidates.iter().map(score).collect())
        }
    }
}
