//! Tabu search over discrete label assignments.
//!
//! A generic tabu search engine plus two problem instances built on it:
//!
//! - **Tabu Search** ([`tabu`]): trajectory search over a problem-defined
//!   neighborhood with a short-term tabu list, aspiration, optional
//!   neighborhood sampling and restarts after stagnation. Candidate costs
//!   come from a pluggable [`tabu::CostEvaluator`], in-process or external.
//! - **Cluster alignment** ([`alignment`]): relabels clusters across
//!   independent clustering runs so that matching clusters share a label,
//!   minimizing mean per-item entropy.
//! - **Allele partitioning** ([`partition`]): splits the alleles of a
//!   polyploid accession into parent groups, scored by the number of extra
//!   lineages PhyloNet reports for each candidate mapping.

pub mod alignment;
pub mod error;
pub mod partition;
pub mod tabu;

pub use error::{Result, SearchError};
