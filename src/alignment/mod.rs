//! Cluster label alignment across clustering runs.
//!
//! Independent clustering runs of the same items label their clusters
//! arbitrarily. This module searches one label permutation per run so that
//! corresponding clusters share a label, minimizing the mean entropy of each
//! item's label counts across runs. Candidates are label swaps within a
//! single run; the cost is computed in-process.

mod entropy;
mod io;
mod neighborhood;
mod runner;
mod types;

pub use entropy::{entropy, mean_entropy, MeanEntropy};
pub use io::{
    format_indfile, format_permutations, format_q_matrix, membership_from_mappings,
    parse_indfile, parse_permutations, relabel_tree,
};
pub use neighborhood::AlignmentProblem;
pub use runner::{default_config, run_alignment, run_alignment_with_rng, AlignmentResult};
pub use types::{LabelSwap, MembershipTensor, Permutations};
