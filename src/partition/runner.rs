//! Allele partition driver and result reporting.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::neighborhood::PartitionProblem;
use super::phylonet::{PhyloNetEvaluator, PhyloNetRecord};
use super::types::Assignment;
use crate::error::Result;
use crate::tabu::{TabuConfig, TabuRunner};

/// Outcome of an allele partition search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartitionResult {
    /// Best assignment of alleles to parent groups.
    pub assignment: Assignment,
    /// Allele mapping of the best assignment.
    pub mapping: String,
    /// PhyloNet inference for the best assignment, if one was evaluated.
    pub record: Option<PhyloNetRecord>,
    /// Number of extra lineages of the best assignment.
    pub cost: f64,
    /// Iteration at which the best assignment was found.
    pub best_iteration: usize,
    /// Iterations executed.
    pub iterations: usize,
    /// Number of restarts performed.
    pub reinitializations: usize,
    /// Whether the search was cancelled.
    pub cancelled: bool,
}

impl PartitionResult {
    /// Human-readable summary under `title`.
    ///
    /// ```text
    /// <title>:
    /// <species tree>
    /// Allele mapping:
    /// <mapping>
    /// Total number of extra lineages: <n>
    /// ```
    pub fn report(&self, title: &str) -> String {
        let (tree, mapping) = match &self.record {
            Some(r) => (r.tree.as_str(), r.mapping.as_str()),
            None => ("", self.mapping.as_str()),
        };
        format!(
            "\n{title}:\n{tree}\nAllele mapping:\n{mapping}\nTotal number of extra lineages: {}\n",
            self.cost
        )
    }
}

/// Searches the allele partition with the least extra lineages.
///
/// `problem` must match the evaluator's ploidy and loci (see
/// [`PhyloNetEvaluator::problem`]). `cancel` is checked before every
/// iteration.
pub fn run_partition(
    problem: &PartitionProblem,
    evaluator: &PhyloNetEvaluator,
    config: &TabuConfig,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<PartitionResult> {
    evaluator.check_problem(problem)?;
    let result = TabuRunner::run_with_cancel(problem, evaluator, config, cancel)?;
    let mapping = evaluator.mapping_for(&result.best.solution)?;
    Ok(PartitionResult {
        mapping,
        record: result.best.payload,
        cost: result.best.cost,
        best_iteration: result.best.iteration,
        assignment: result.best.solution,
        iterations: result.iterations,
        reinitializations: result.reinitializations,
        cancelled: result.cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use crate::partition::PhyloNetConfig;
    use std::fs;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    const FAKE_PHYLONET: &str = r#"
for last; do :; done
while IFS= read -r line; do
  case "$line" in
    '<'*)
      case "$line" in
        *'___01:a_m0,b_m0,a_m1'*|*'___02:a_m0,b_m0,a_m1'*) d=0 ;;
        *'a_m0,b_m0'*) d=2 ;;
        *) d=5 ;;
      esac
      printf '\nInfer_ST_MDC (g0000001) -a %s\n(A,(H___01,H___02));\nTotal number of extra lineages:%s\n' "$line" "$d"
      ;;
  esac
done < "$last"
"#;

    fn evaluator(dir: &TempDir) -> PhyloNetEvaluator {
        let script = dir.path().join("phylonet.sh");
        fs::write(&script, FAKE_PHYLONET).unwrap();
        let config = PhyloNetConfig::new("PhyloNet.jar")
            .with_java("sh")
            .with_java_options(vec![script.display().to_string()])
            .with_working_directory(dir.path())
            .with_max_procs(3);
        let blocks = vec![
            ["a_m0", "b_m0", "c_m0"].iter().map(|s| s.to_string()).collect(),
            ["a_m1", "b_m1"].iter().map(|s| s.to_string()).collect(),
        ];
        let trees = vec!["((a1,a_m0),(b_m0,c_m0));".to_string()];
        PhyloNetEvaluator::new(config, "H", &trees, blocks, 4, "A:a1").unwrap()
    }

    #[test]
    fn test_run_partition_reaches_optimum() {
        let dir = TempDir::new().unwrap();
        let eval = evaluator(&dir);
        let problem = PartitionProblem::new(4, vec![3, 2]).unwrap();
        let config = TabuConfig::default()
            .with_max_iterations(30)
            .with_tabu_tenure(3)
            .with_max_unimproved(5)
            .with_seed(5);

        let result = run_partition(&problem, &eval, &config, None).unwrap();
        assert_eq!(result.cost, 0.0);
        assert!(problem.is_feasible(&result.assignment));
        let record = result.record.as_ref().unwrap();
        assert!(record.mapping.starts_with("A:a1;H___0"));
        assert!(result.mapping.contains("a_m0,b_m0,a_m1"));
        assert_eq!(result.iterations, 30);

        let report = result.report("Best partition");
        assert!(report.starts_with("\nBest partition:\n(A,(H___01,H___02));\nAllele mapping:\n"));
        assert!(report.ends_with("Total number of extra lineages: 0\n"));
        eval.cleanup().unwrap();
    }

    #[test]
    fn test_run_partition_rejects_foreign_problem() {
        let dir = TempDir::new().unwrap();
        let eval = evaluator(&dir);
        let problem = PartitionProblem::new(4, vec![3, 2, 2]).unwrap();
        let err = run_partition(&problem, &eval, &TabuConfig::default().with_seed(1), None)
            .unwrap_err();
        assert!(matches!(err, SearchError::DimensionMismatch { .. }), "{err}");
    }

    #[test]
    fn test_run_partition_cancelled_before_start() {
        let dir = TempDir::new().unwrap();
        let eval = evaluator(&dir);
        let problem = PartitionProblem::new(4, vec![3, 2]).unwrap();
        let cancel = Arc::new(AtomicBool::new(false));
        cancel.store(true, Ordering::Relaxed);

        let config = TabuConfig::default().with_seed(1);
        let result = run_partition(&problem, &eval, &config, Some(cancel)).unwrap();
        assert!(result.cancelled);
        assert_eq!(result.iterations, 0);
        assert!(result.record.is_none());
        assert_eq!(result.report("x"), format!("\nx:\n\nAllele mapping:\n{}\nTotal number of extra lineages: inf\n", result.mapping));
    }
}
