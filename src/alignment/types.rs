//! Membership tensor and label-permutation moves.

use crate::error::{Result, SearchError};
use crate::tabu::TabuMove;

/// One label permutation per run: `perms[run][c]` is the original cluster
/// column that becomes column `c` after alignment.
pub type Permutations = Vec<Vec<usize>>;

/// Membership coefficients of `n_items` items in `n_clusters` clusters,
/// for each of `n_runs` independent clustering runs.
///
/// # Examples
///
/// ```
/// use u_labelsearch::alignment::MembershipTensor;
///
/// let t = MembershipTensor::from_runs(vec![
///     vec![vec![1.0, 0.0], vec![0.0, 1.0]],
///     vec![vec![0.0, 1.0], vec![1.0, 0.0]],
/// ])
/// .unwrap();
/// assert_eq!((t.n_items(), t.n_clusters(), t.n_runs()), (2, 2, 2));
/// assert_eq!(t.get(0, 1, 1), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MembershipTensor {
    n_items: usize,
    n_clusters: usize,
    n_runs: usize,
    // run-major, then item, then cluster
    data: Vec<f64>,
}

impl MembershipTensor {
    /// Stacks per-run Q-matrices (`runs[run][item][cluster]`).
    ///
    /// Every run must have the same number of items and every row the same
    /// number of clusters.
    pub fn from_runs(runs: Vec<Vec<Vec<f64>>>) -> Result<Self> {
        let n_runs = runs.len();
        let n_items = runs.first().map_or(0, |r| r.len());
        let n_clusters = runs
            .first()
            .and_then(|r| r.first())
            .map_or(0, |row| row.len());
        if n_runs == 0 || n_items == 0 || n_clusters == 0 {
            return Err(SearchError::EmptyInput(
                "membership tensor needs at least one run, item and cluster".into(),
            ));
        }

        let mut data = Vec::with_capacity(n_runs * n_items * n_clusters);
        for (k, run) in runs.into_iter().enumerate() {
            if run.len() != n_items {
                return Err(SearchError::DimensionMismatch {
                    expected: format!("{n_items} items in run {}", k + 1),
                    actual: format!("{} items", run.len()),
                });
            }
            for (i, row) in run.into_iter().enumerate() {
                if row.len() != n_clusters {
                    return Err(SearchError::DimensionMismatch {
                        expected: format!("{n_clusters} clusters in run {} item {}", k + 1, i + 1),
                        actual: format!("{} clusters", row.len()),
                    });
                }
                data.extend(row);
            }
        }

        Ok(Self {
            n_items,
            n_clusters,
            n_runs,
            data,
        })
    }

    /// Number of items (rows).
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of clusters (columns).
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Number of runs.
    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    /// Membership of `item` in `cluster` for `run`.
    #[inline]
    pub fn get(&self, item: usize, cluster: usize, run: usize) -> f64 {
        self.data[(run * self.n_items + item) * self.n_clusters + cluster]
    }

    /// Per-item cluster sums across runs after relabeling each run by
    /// `perms`.
    pub fn permuted_sums(&self, perms: &[Vec<usize>]) -> Vec<Vec<f64>> {
        (0..self.n_items)
            .map(|item| self.permuted_row_sum(item, perms))
            .collect()
    }

    /// Cluster sums of one item across runs after relabeling.
    pub(crate) fn permuted_row_sum(&self, item: usize, perms: &[Vec<usize>]) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_clusters];
        for (run, perm) in perms.iter().enumerate() {
            for (c, &src) in perm.iter().enumerate() {
                sums[c] += self.get(item, src, run);
            }
        }
        sums
    }

    /// Average Q-matrix across runs after relabeling by `perms`.
    pub fn averaged(&self, perms: &[Vec<usize>]) -> Vec<Vec<f64>> {
        let n = self.n_runs as f64;
        self.permuted_sums(perms)
            .into_iter()
            .map(|row| row.into_iter().map(|v| v / n).collect())
            .collect()
    }
}

/// Exchange of two cluster labels within one run.
///
/// `index` is the flat position of `(run, {a, b})` among all
/// `n_runs * C(n_clusters, 2)` swaps; it is the move's tabu key. A swap is
/// its own reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelSwap {
    /// Run whose permutation is changed.
    pub run: usize,
    /// First swapped position.
    pub a: usize,
    /// Second swapped position (`a < b`).
    pub b: usize,
    /// Flat swap index.
    pub index: usize,
}

impl LabelSwap {
    /// The move undoing this one.
    pub fn reverse(&self) -> Self {
        *self
    }

    /// Applies the swap, returning a new solution.
    pub fn apply(&self, perms: &[Vec<usize>]) -> Permutations {
        let mut out = perms.to_vec();
        out[self.run].swap(self.a, self.b);
        out
    }
}

impl TabuMove for LabelSwap {
    type Key = usize;

    fn keys(&self) -> Vec<usize> {
        vec![self.index]
    }

    fn tabu_keys(&self) -> Vec<usize> {
        vec![self.reverse().index]
    }
}
