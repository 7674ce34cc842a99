//! Feasible shift/swap neighborhood over allele partitions.

use rand::Rng;

use super::types::{AlleleMove, Assignment, PartitionMove};
use crate::error::{Result, SearchError};
use crate::tabu::{Neighbor, TabuProblem};

/// Alleles a parent group may hold per locus.
pub const GROUP_CAPACITY: usize = 2;

/// Partitioning of the alleles of one polyploid accession into
/// `ploidy / 2` pseudo-diploid parent groups, locus by locus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionProblem {
    ploidy: usize,
    n_alleles: Vec<usize>,
}

impl PartitionProblem {
    /// Creates the problem for `n_alleles[locus]` alleles per locus.
    ///
    /// Fails on odd ploidy or ploidy below 4 (nothing to partition), on an
    /// empty locus list, and on any locus holding more alleles than `ploidy`.
    pub fn new(ploidy: usize, n_alleles: Vec<usize>) -> Result<Self> {
        if ploidy < 4 || ploidy % 2 != 0 {
            return Err(SearchError::InvalidConfig(format!(
                "cannot handle ploidy level {ploidy}"
            )));
        }
        if n_alleles.is_empty() {
            return Err(SearchError::EmptyInput("no loci to partition".into()));
        }
        if let Some((locus, &n)) = n_alleles.iter().enumerate().find(|(_, &n)| n > ploidy) {
            return Err(SearchError::Infeasible {
                locus,
                alleles: n,
                capacity: ploidy,
            });
        }
        Ok(Self { ploidy, n_alleles })
    }

    /// Ploidy level.
    pub fn ploidy(&self) -> usize {
        self.ploidy
    }

    /// Number of parent groups.
    pub fn groups(&self) -> usize {
        self.ploidy / 2
    }

    /// Allele count per locus.
    pub fn n_alleles(&self) -> &[usize] {
        &self.n_alleles
    }

    /// Whether `assignment` matches the locus shape and respects group
    /// capacity.
    pub fn is_feasible(&self, assignment: &[Vec<usize>]) -> bool {
        assignment.len() == self.n_alleles.len()
            && assignment
                .iter()
                .zip(&self.n_alleles)
                .all(|(locus, &n)| locus.len() == n && self.locus_counts(locus).is_some())
    }

    fn locus_counts(&self, locus: &[usize]) -> Option<Vec<usize>> {
        let mut counts = vec![0; self.groups()];
        for &g in locus {
            let c = counts.get_mut(g)?;
            *c += 1;
            if *c > GROUP_CAPACITY {
                return None;
            }
        }
        Some(counts)
    }

    fn shifts(&self, assignment: &Assignment, out: &mut Vec<Neighbor<Assignment, PartitionMove>>) {
        for (i, locus) in assignment.iter().enumerate() {
            let mut counts = vec![0; self.groups()];
            for &g in locus {
                counts[g] += 1;
            }
            for (to, _) in counts.iter().enumerate().filter(|(_, &c)| c < GROUP_CAPACITY) {
                for (k, &from) in locus.iter().enumerate() {
                    if from == to {
                        continue;
                    }
                    let mv = PartitionMove::Shift(AlleleMove {
                        locus: i,
                        allele: k,
                        from,
                        to,
                    });
                    out.push(Neighbor {
                        solution: mv.apply(assignment),
                        mv,
                    });
                }
            }
        }
    }

    fn swaps(&self, assignment: &Assignment, out: &mut Vec<Neighbor<Assignment, PartitionMove>>) {
        for (i, locus) in assignment.iter().enumerate() {
            // Alleles grouped by occupied parent, parents ascending.
            let members: Vec<Vec<usize>> = (0..self.groups())
                .map(|g| (0..locus.len()).filter(|&k| locus[k] == g).collect::<Vec<_>>())
                .filter(|m| !m.is_empty())
                .collect();

            for (x, left) in members.iter().enumerate() {
                for right in &members[x + 1..] {
                    for &a in left {
                        for &b in right {
                            let mv = PartitionMove::Swap(
                                AlleleMove {
                                    locus: i,
                                    allele: a,
                                    from: locus[a],
                                    to: locus[b],
                                },
                                AlleleMove {
                                    locus: i,
                                    allele: b,
                                    from: locus[b],
                                    to: locus[a],
                                },
                            );
                            out.push(Neighbor {
                                solution: mv.apply(assignment),
                                mv,
                            });
                        }
                    }
                }
            }
        }
    }
}

impl TabuProblem for PartitionProblem {
    type Solution = Assignment;
    type Move = PartitionMove;

    /// Draws, for each locus, distinct slots among the `ploidy` available
    /// (two per group), so no group exceeds its capacity.
    fn initial_solution<R: Rng>(&self, rng: &mut R) -> Assignment {
        self.n_alleles
            .iter()
            .map(|&n| {
                rand::seq::index::sample(rng, self.ploidy, n)
                    .iter()
                    .map(|slot| slot / GROUP_CAPACITY)
                    .collect()
            })
            .collect()
    }

    /// All shifts first (locus, target group, allele order), then all swaps
    /// (locus, group pair, allele pair order).
    fn neighbors(&self, assignment: &Assignment) -> Vec<Neighbor<Assignment, PartitionMove>> {
        let mut out = Vec::new();
        self.shifts(assignment, &mut out);
        self.swaps(assignment, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_new_rejects_bad_input() {
        assert!(matches!(
            PartitionProblem::new(3, vec![2]),
            Err(SearchError::InvalidConfig(_))
        ));
        assert!(matches!(
            PartitionProblem::new(2, vec![2]),
            Err(SearchError::InvalidConfig(_))
        ));
        assert!(matches!(
            PartitionProblem::new(4, vec![]),
            Err(SearchError::EmptyInput(_))
        ));
        assert!(matches!(
            PartitionProblem::new(4, vec![4, 5, 3]),
            Err(SearchError::Infeasible {
                locus: 1,
                alleles: 5,
                capacity: 4
            })
        ));
    }

    #[test]
    fn test_initial_solution_fills_groups_evenly() {
        let problem = PartitionProblem::new(4, vec![4]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..200 {
            let s = problem.initial_solution(&mut rng);
            let zeros = s[0].iter().filter(|&&g| g == 0).count();
            let ones = s[0].iter().filter(|&&g| g == 1).count();
            assert_eq!((zeros, ones), (2, 2), "unbalanced start {:?}", s);
        }
    }

    #[test]
    fn test_neighborhood_of_full_locus_is_swaps_only() {
        let problem = PartitionProblem::new(4, vec![4, 4]).unwrap();
        let nb = problem.neighbors(&vec![vec![0, 1, 1, 0], vec![1, 1, 0, 0]]);
        // No group has spare capacity: 2 loci x (2 x 2) cross-group pairs.
        assert_eq!(nb.len(), 8);
        assert!(nb.iter().all(|n| matches!(n.mv, PartitionMove::Swap(..))));
        assert_eq!(nb[0].solution, vec![vec![1, 0, 1, 0], vec![1, 1, 0, 0]]);
        assert_eq!(
            nb[0].mv,
            PartitionMove::Swap(
                AlleleMove { locus: 0, allele: 0, from: 0, to: 1 },
                AlleleMove { locus: 0, allele: 1, from: 1, to: 0 },
            )
        );
    }

    #[test]
    fn test_neighborhood_with_spare_capacity_has_shifts() {
        let problem = PartitionProblem::new(6, vec![3]).unwrap();
        let nb = problem.neighbors(&vec![vec![0, 0, 1]]);
        let shifts: Vec<_> = nb
            .iter()
            .filter_map(|n| match n.mv {
                PartitionMove::Shift(m) => Some((m.allele, m.to)),
                PartitionMove::Swap(..) => None,
            })
            .collect();
        // group 1 (one allele) takes allele 0 or 1; group 2 (empty) takes any.
        assert_eq!(shifts, vec![(0, 1), (1, 1), (0, 2), (1, 2), (2, 2)]);
        assert_eq!(nb.len() - shifts.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_neighbors_feasible_and_reversible(
            half in 2usize..5,
            loci in prop::collection::vec(0usize..8, 1..4),
            seed in any::<u64>(),
        ) {
            let ploidy = 2 * half;
            let n_alleles: Vec<usize> = loci.iter().map(|&n| n % (ploidy + 1)).collect();
            let problem = PartitionProblem::new(ploidy, n_alleles).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let start = problem.initial_solution(&mut rng);
            prop_assert!(problem.is_feasible(&start));

            for n in problem.neighbors(&start) {
                prop_assert!(problem.is_feasible(&n.solution), "infeasible {:?}", n.solution);
                prop_assert_ne!(&n.solution, &start);
                prop_assert_eq!(n.mv.reverse().apply(&n.solution), start.clone());
            }
        }
    }
}
