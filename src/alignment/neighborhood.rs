//! Label-swap neighborhood for cluster alignment.

use rand::seq::SliceRandom;
use rand::Rng;

use super::types::{LabelSwap, Permutations};
use crate::tabu::{Neighbor, TabuProblem};

/// Cluster-alignment problem: find one label permutation per run so that
/// corresponding clusters carry the same label.
#[derive(Debug, Clone)]
pub struct AlignmentProblem {
    n_runs: usize,
    n_clusters: usize,
    pairs: Vec<(usize, usize)>,
}

impl AlignmentProblem {
    /// Creates the problem for `n_runs` runs of `n_clusters` clusters.
    pub fn new(n_runs: usize, n_clusters: usize) -> Self {
        let pairs = (0..n_clusters)
            .flat_map(|a| ((a + 1)..n_clusters).map(move |b| (a, b)))
            .collect();
        Self {
            n_runs,
            n_clusters,
            pairs,
        }
    }

    /// Number of label swaps available within one run.
    pub fn swaps_per_run(&self) -> usize {
        self.pairs.len()
    }

    /// Size of the complete neighborhood.
    pub fn neighborhood_size(&self) -> usize {
        self.n_runs * self.pairs.len()
    }

    /// Decodes a flat swap index.
    pub fn swap_at(&self, index: usize) -> LabelSwap {
        let per_run = self.pairs.len();
        let (a, b) = self.pairs[index % per_run];
        LabelSwap {
            run: index / per_run,
            a,
            b,
            index,
        }
    }

    fn neighbor_at(&self, perms: &Permutations, index: usize) -> Neighbor<Permutations, LabelSwap> {
        let mv = self.swap_at(index);
        Neighbor {
            solution: mv.apply(perms),
            mv,
        }
    }
}

impl TabuProblem for AlignmentProblem {
    type Solution = Permutations;
    type Move = LabelSwap;

    fn initial_solution<R: Rng>(&self, rng: &mut R) -> Permutations {
        (0..self.n_runs)
            .map(|_| {
                let mut perm: Vec<usize> = (0..self.n_clusters).collect();
                perm.shuffle(rng);
                perm
            })
            .collect()
    }

    fn neighbors(&self, perms: &Permutations) -> Vec<Neighbor<Permutations, LabelSwap>> {
        (0..self.neighborhood_size())
            .map(|i| self.neighbor_at(perms, i))
            .collect()
    }

    // Swaps are index-addressable: only drawn neighbors are built.
    fn sample_neighbors<R: Rng>(
        &self,
        perms: &Permutations,
        sample_size: Option<usize>,
        rng: &mut R,
    ) -> Vec<Neighbor<Permutations, LabelSwap>> {
        let max_size = self.neighborhood_size();
        match sample_size {
            Some(k) if k < max_size => rand::seq::index::sample(rng, max_size, k)
                .iter()
                .map(|i| self.neighbor_at(perms, i))
                .collect(),
            _ => self.neighbors(perms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn is_permutation(p: &[usize]) -> bool {
        let mut seen = vec![false; p.len()];
        p.iter().all(|&v| v < p.len() && !std::mem::replace(&mut seen[v], true))
    }

    #[test]
    fn test_neighborhood_is_exhaustive() {
        let problem = AlignmentProblem::new(3, 4);
        assert_eq!(problem.swaps_per_run(), 6);
        assert_eq!(problem.neighborhood_size(), 18);

        let perms = vec![vec![0, 1, 2, 3]; 3];
        let nb = problem.neighbors(&perms);
        assert_eq!(nb.len(), 18);
        for (i, n) in nb.iter().enumerate() {
            assert_eq!(n.mv.index, i);
            assert_ne!(n.solution, perms);
        }
        assert_eq!(nb[6].mv, LabelSwap { run: 1, a: 0, b: 1, index: 6 });
        assert_eq!(nb[17].mv, LabelSwap { run: 2, a: 2, b: 3, index: 17 });
    }

    #[test]
    fn test_sample_size_bounded_by_neighborhood() {
        let problem = AlignmentProblem::new(2, 3);
        let mut rng = StdRng::seed_from_u64(5);
        let perms = problem.initial_solution(&mut rng);

        assert_eq!(problem.sample_neighbors(&perms, Some(100), &mut rng).len(), 6);
        let sample = problem.sample_neighbors(&perms, Some(4), &mut rng);
        assert_eq!(sample.len(), 4);
        let mut idx: Vec<usize> = sample.iter().map(|n| n.mv.index).collect();
        idx.sort_unstable();
        idx.dedup();
        assert_eq!(idx.len(), 4);
    }

    #[test]
    fn test_single_cluster_has_no_neighbors() {
        let problem = AlignmentProblem::new(4, 1);
        assert!(problem.neighbors(&vec![vec![0]; 4]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_swaps_preserve_bijection_and_reverse(
            n_runs in 1usize..4,
            n_clusters in 2usize..6,
            seed in any::<u64>(),
        ) {
            let problem = AlignmentProblem::new(n_runs, n_clusters);
            let mut rng = StdRng::seed_from_u64(seed);
            let perms = problem.initial_solution(&mut rng);
            prop_assert!(perms.iter().all(|p| is_permutation(p)));

            for n in problem.neighbors(&perms) {
                prop_assert!(n.solution.iter().all(|p| is_permutation(p)));
                prop_assert_eq!(n.mv.reverse().apply(&n.solution), perms.clone());
            }
        }
    }
}
