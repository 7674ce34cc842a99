//! Error types for label search operations.
//!
//! Every condition listed here is fatal for the run that raised it. An
//! iteration that accepts no move is a normal outcome of the search and is
//! never reported as an error.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for label search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors raised by the search engine, its problem instances and its
/// cost evaluators.
#[derive(Error, Debug)]
pub enum SearchError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A locus holds more alleles than the parent groups can absorb.
    #[error("too many alleles at locus {locus}: {alleles} alleles for capacity {capacity}")]
    Infeasible {
        /// Zero-based locus index.
        locus: usize,
        /// Number of alleles found at the locus.
        alleles: usize,
        /// Maximum number of alleles the locus may hold.
        capacity: usize,
    },

    /// The current solution has no feasible neighbor.
    #[error("current solution has no feasible neighbor")]
    EmptyNeighborhood,

    /// Degenerate input (no runs, no items, empty mapping, ...).
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Shapes of input arrays disagree.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected shape description.
        expected: String,
        /// Shape actually found.
        actual: String,
    },

    /// A membership file line could not be parsed.
    #[error("line {line}: {reason}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// What went wrong.
        reason: String,
    },

    /// An external tool produced output that does not match the expected
    /// record layout.
    #[error("cannot parse tool output {file}: {reason}")]
    OracleParse {
        /// Output file that failed to parse.
        file: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// An external job exited unsuccessfully.
    #[error("external job for {file} failed with {status}")]
    ToolFailed {
        /// Input file of the failed job.
        file: PathBuf,
        /// Exit status description.
        status: String,
    },

    /// An evaluator returned a different number of results than candidates
    /// submitted.
    #[error("evaluator returned {actual} results for {expected} candidates")]
    ResultCountMismatch {
        /// Number of submitted candidates.
        expected: usize,
        /// Number of results returned.
        actual: usize,
    },

    /// More parent groups than the mapping format can name.
    #[error("maximal number of parent groups exceeded: {0} > 99")]
    TooManyGroups(usize),

    /// I/O failure while writing job inputs or reading job outputs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The worker pool for external jobs could not be created.
    #[error("cannot build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
