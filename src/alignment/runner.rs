//! Cluster alignment driver.

use rand::Rng;

use super::entropy::MeanEntropy;
use super::neighborhood::AlignmentProblem;
use super::types::{MembershipTensor, Permutations};
use crate::error::Result;
use crate::tabu::{TabuConfig, TabuRunner};

/// Outcome of a cluster alignment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlignmentResult {
    /// Best label permutation per run (0-based).
    pub permutations: Permutations,
    /// Q-matrix averaged over runs after relabeling.
    pub averaged: Vec<Vec<f64>>,
    /// Mean entropy of the best alignment.
    pub cost: f64,
    /// Iteration at which the best alignment was found.
    pub best_iteration: usize,
    /// Iterations executed.
    pub iterations: usize,
}

/// Default search settings for cluster alignment: 400 iterations, tenure
/// 10, full neighborhood.
pub fn default_config() -> TabuConfig {
    TabuConfig::default()
        .with_max_iterations(400)
        .with_tabu_tenure(10)
}

/// Aligns cluster labels across the runs of `tensor`.
///
/// # Examples
///
/// ```
/// use u_labelsearch::alignment::{run_alignment, MembershipTensor};
/// use u_labelsearch::tabu::TabuConfig;
///
/// let t = MembershipTensor::from_runs(vec![
///     vec![vec![1.0, 0.0], vec![0.0, 1.0]],
///     vec![vec![0.0, 1.0], vec![1.0, 0.0]],
/// ])
/// .unwrap();
/// let config = TabuConfig::default().with_max_iterations(10).with_seed(1);
/// let result = run_alignment(&t, &config).unwrap();
/// assert_eq!(result.cost, 0.0);
/// ```
pub fn run_alignment(tensor: &MembershipTensor, config: &TabuConfig) -> Result<AlignmentResult> {
    let problem = AlignmentProblem::new(tensor.n_runs(), tensor.n_clusters());
    let evaluator = MeanEntropy::new(tensor);
    let result = TabuRunner::run(&problem, &evaluator, config)?;
    Ok(finish(
        tensor,
        result.best.solution,
        result.best.cost,
        result.best.iteration,
        result.iterations,
    ))
}

/// Like [`run_alignment`], drawing randomness from `rng` and optionally
/// scoring candidates in parallel.
pub fn run_alignment_with_rng<R: Rng>(
    tensor: &MembershipTensor,
    config: &TabuConfig,
    parallel: bool,
    rng: &mut R,
) -> Result<AlignmentResult> {
    let problem = AlignmentProblem::new(tensor.n_runs(), tensor.n_clusters());
    let evaluator = MeanEntropy::new(tensor).with_parallel(parallel);
    let result = TabuRunner::run_with_rng(&problem, &evaluator, config, rng, None)?;
    Ok(finish(
        tensor,
        result.best.solution,
        result.best.cost,
        result.best.iteration,
        result.iterations,
    ))
}

fn finish(
    tensor: &MembershipTensor,
    permutations: Permutations,
    cost: f64,
    best_iteration: usize,
    iterations: usize,
) -> AlignmentResult {
    AlignmentResult {
        averaged: tensor.averaged(&permutations),
        permutations,
        cost,
        best_iteration,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::entropy::mean_entropy;
    use crate::error::SearchError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_alignment_single_item_three_clusters() {
        let t = MembershipTensor::from_runs(vec![
            vec![vec![0.9, 0.05, 0.05]],
            vec![vec![0.05, 0.9, 0.05]],
        ])
        .unwrap();
        let baseline = mean_entropy(&t, &[vec![0, 1, 2], vec![0, 1, 2]]);

        let config = TabuConfig::default()
            .with_max_iterations(10)
            .with_tabu_tenure(2)
            .with_seed(9);
        let result = run_alignment(&t, &config).unwrap();

        assert!(result.cost < baseline, "{} should be < {}", result.cost, baseline);
        // run 2's label 1 must end up in the same column as run 1's label 0
        let col0 = result.permutations[0].iter().position(|&c| c == 0).unwrap();
        assert_eq!(result.permutations[1][col0], 1);
        assert!((result.averaged[0][col0] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_alignment_recovers_shuffled_labels() {
        // Hard memberships of 6 items in 3 clusters, relabeled per run.
        let base = [0usize, 0, 1, 1, 2, 2];
        let relabel = [[0usize, 1, 2], [2, 0, 1], [1, 2, 0], [0, 2, 1]];
        let runs = relabel
            .iter()
            .map(|map| {
                base.iter()
                    .map(|&c| {
                        let mut row = vec![0.0; 3];
                        row[map[c]] = 1.0;
                        row
                    })
                    .collect()
            })
            .collect();
        let t = MembershipTensor::from_runs(runs).unwrap();

        let config = TabuConfig::default()
            .with_max_iterations(200)
            .with_tabu_tenure(3)
            .with_seed(2024);
        let mut rng = StdRng::seed_from_u64(2024);
        let result = run_alignment_with_rng(&t, &config, true, &mut rng).unwrap();

        assert!(result.cost.abs() < 1e-12, "expected perfect alignment, got {}", result.cost);
        for row in &result.averaged {
            assert!(row.iter().any(|&v| (v - 1.0).abs() < 1e-12));
        }
        assert!(result.best_iteration <= result.iterations);
    }

    #[test]
    fn test_alignment_single_cluster_is_fatal() {
        let t = MembershipTensor::from_runs(vec![vec![vec![1.0]], vec![vec![1.0]]]).unwrap();
        let err = run_alignment(&t, &default_config().with_seed(1)).unwrap_err();
        assert!(matches!(err, SearchError::EmptyNeighborhood));
    }
}
