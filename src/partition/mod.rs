//! Allele partitioning of polyploid accessions.
//!
//! The alleles a polyploid accession carries at each locus are split into
//! `ploidy / 2` parent groups of at most two alleles per locus. Each
//! candidate partition is written as an allele mapping and scored by
//! PhyloNet's minimize-deep-coalescence inference, run as external Java
//! processes; the number of extra lineages is the cost.
//!
//! # Example
//!
//! ```no_run
//! use u_labelsearch::partition::{
//!     run_partition, PartitionProblem, PhyloNetConfig, PhyloNetEvaluator,
//! };
//! use u_labelsearch::tabu::TabuConfig;
//!
//! let trees = vec!["((a1,h_m0),(h_m1,h_m2));".to_string()];
//! let blocks = vec![vec!["h_m0".into(), "h_m1".into(), "h_m2".into()]];
//! let config = PhyloNetConfig::new("PhyloNet.jar").with_max_procs(4);
//! let eval = PhyloNetEvaluator::new(config, "H", &trees, blocks, 4, "A:a1")?;
//! let problem = PartitionProblem::new(4, vec![3])?;
//!
//! let result = run_partition(&problem, &eval, &TabuConfig::default(), None)?;
//! print!("{}", result.report("Best allele partition"));
//! eval.cleanup()?;
//! # Ok::<(), u_labelsearch::SearchError>(())
//! ```

mod config;
mod mapping;
mod neighborhood;
mod phylonet;
mod runner;
mod types;

pub use config::PhyloNetConfig;
pub use mapping::{
    allele_partition, build_instruction, build_mapping, parse_allele_table, tree_ids, Accession,
    Species, MAX_GROUPS,
};
pub use neighborhood::{PartitionProblem, GROUP_CAPACITY};
pub use phylonet::{nexus_head, parse_output, PhyloNetEvaluator, PhyloNetRecord};
pub use runner::{run_partition, PartitionResult};
pub use types::{AlleleMove, Assignment, PartitionMove};
