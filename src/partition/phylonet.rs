//! Partition scoring through external PhyloNet jobs.
//!
//! Each batch of candidate assignments becomes one PhyloNet instruction per
//! candidate. Instructions are split into chunk files that share a NEXUS
//! head listing the gene trees, the chunks run as separate Java processes on
//! a bounded worker pool, and the reported number of extra lineages of each
//! inferred species tree is the candidate's cost.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use tracing::debug;

use super::config::PhyloNetConfig;
use super::mapping::{allele_partition, build_instruction, build_mapping, tree_id, tree_ids};
use super::neighborhood::PartitionProblem;
use super::types::Assignment;
use crate::error::{Result, SearchError};
use crate::tabu::{CostEvaluator, Evaluation};

const NEXUS_TAIL: &str = "\n\nEND;\n";

/// One inference reported by PhyloNet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhyloNetRecord {
    /// Inferred species tree in Newick format, including the trailing `;`.
    pub tree: String,
    /// Allele mapping the tree was inferred under.
    pub mapping: String,
    /// Number of extra lineages of the tree.
    pub extra_lineages: u64,
}

#[derive(Debug)]
struct Job {
    input: PathBuf,
    output: PathBuf,
    records: usize,
}

/// [`CostEvaluator`] for allele partitions backed by PhyloNet.
pub struct PhyloNetEvaluator {
    config: PhyloNetConfig,
    name: String,
    blocks: Vec<Vec<String>>,
    ploidy: usize,
    base_mapping: String,
    tree_ids: String,
    head: String,
    pool: rayon::ThreadPool,
    artifacts: Mutex<Vec<PathBuf>>,
}

impl PhyloNetEvaluator {
    /// Prepares an evaluator and writes the shared NEXUS head.
    ///
    /// `name` prefixes both the parent groups in mappings and every file
    /// written. `gene_trees` are Newick strings; `blocks[locus]` lists the
    /// alleles of the partitioned accession at each locus in assignment
    /// order; `base_mapping` covers all other taxa (may be empty).
    pub fn new(
        config: PhyloNetConfig,
        name: impl Into<String>,
        gene_trees: &[String],
        blocks: Vec<Vec<String>>,
        ploidy: usize,
        base_mapping: impl Into<String>,
    ) -> Result<Self> {
        config.validate()?;
        if gene_trees.is_empty() {
            return Err(SearchError::EmptyInput("no gene trees".into()));
        }
        let name = name.into();
        fs::create_dir_all(&config.working_directory)?;

        let head = nexus_head(gene_trees);
        let head_path = config.working_directory.join(format!("{name}_head.nex"));
        fs::write(&head_path, &head)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_procs)
            .thread_name(|i| format!("phylonet-{i}"))
            .build()?;

        Ok(Self {
            tree_ids: tree_ids(gene_trees.len()),
            config,
            name,
            blocks,
            ploidy,
            base_mapping: base_mapping.into(),
            head,
            pool,
            artifacts: Mutex::new(vec![head_path]),
        })
    }

    /// Evaluator configuration.
    pub fn config(&self) -> &PhyloNetConfig {
        &self.config
    }

    /// Identifiers of all gene trees, as used in instructions.
    pub fn tree_ids(&self) -> &str {
        &self.tree_ids
    }

    /// Partition problem over this evaluator's loci and ploidy.
    pub fn problem(&self) -> Result<PartitionProblem> {
        PartitionProblem::new(self.ploidy, self.blocks.iter().map(Vec::len).collect())
    }

    /// Checks that `problem` has this evaluator's ploidy and allele counts.
    pub fn check_problem(&self, problem: &PartitionProblem) -> Result<()> {
        if problem.ploidy() != self.ploidy {
            return Err(SearchError::DimensionMismatch {
                expected: format!("ploidy {}", self.ploidy),
                actual: format!("ploidy {}", problem.ploidy()),
            });
        }
        let n_alleles: Vec<usize> = self.blocks.iter().map(Vec::len).collect();
        if problem.n_alleles() != n_alleles.as_slice() {
            return Err(SearchError::DimensionMismatch {
                expected: format!("alleles per locus {n_alleles:?}"),
                actual: format!("alleles per locus {:?}", problem.n_alleles()),
            });
        }
        Ok(())
    }

    /// Allele mapping of `assignment`, without the base mapping.
    pub fn mapping_for(&self, assignment: &[Vec<usize>]) -> Result<String> {
        let groups = allele_partition(assignment, &self.blocks, self.ploidy)?;
        build_mapping(&self.name, &groups)
    }

    /// PhyloNet instruction scoring `assignment` over all gene trees.
    pub fn instruction_for(&self, assignment: &[Vec<usize>]) -> Result<String> {
        let hyp = self.mapping_for(assignment)?;
        build_instruction(&self.config.command, &self.tree_ids, &self.base_mapping, &hyp)
    }

    /// Runs a single instruction outside the search, e.g. for a diploid
    /// only tree. Files are named `<name>_<step>`.
    pub fn evaluate_single(&self, step: &str, instruction: &str) -> Result<PhyloNetRecord> {
        let job = self.write_job(&format!("{}_{step}", self.name), &[instruction.to_string()])?;
        self.run_job(&job)?;
        read_records(&job)?
            .pop()
            .ok_or(SearchError::ResultCountMismatch {
                expected: 1,
                actual: 0,
            })
    }

    /// Removes every file this evaluator has written.
    pub fn cleanup(&self) -> Result<()> {
        let mut artifacts = self.artifacts.lock().unwrap_or_else(PoisonError::into_inner);
        for path in artifacts.drain(..) {
            match fs::remove_file(&path) {
                Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
        }
        Ok(())
    }

    fn write_job(&self, stem: &str, instructions: &[String]) -> Result<Job> {
        let dir = &self.config.working_directory;
        let job = Job {
            input: dir.join(format!("{stem}.nex")),
            output: dir.join(format!("{stem}.txt")),
            records: instructions.len(),
        };
        let mut text = String::with_capacity(self.head.len() + NEXUS_TAIL.len());
        text.push_str(&self.head);
        for instruction in instructions {
            text.push_str(instruction);
        }
        text.push_str(NEXUS_TAIL);
        fs::write(&job.input, text)?;

        let mut artifacts = self.artifacts.lock().unwrap_or_else(PoisonError::into_inner);
        artifacts.push(job.input.clone());
        artifacts.push(job.output.clone());
        Ok(job)
    }

    fn run_job(&self, job: &Job) -> Result<()> {
        let stdout = File::create(&job.output)?;
        let status = Command::new(&self.config.java)
            .args(&self.config.java_options)
            .arg("-jar")
            .arg(&self.config.jar_path)
            .arg(&job.input)
            .stdout(stdout)
            .status()?;
        if !status.success() {
            return Err(SearchError::ToolFailed {
                file: job.input.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

impl CostEvaluator<Assignment> for PhyloNetEvaluator {
    type Payload = PhyloNetRecord;

    fn evaluate_batch(
        &self,
        batch: usize,
        candidates: &[&Assignment],
    ) -> Result<Vec<Evaluation<PhyloNetRecord>>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let instructions = candidates
            .iter()
            .map(|a| self.instruction_for(a))
            .collect::<Result<Vec<_>>>()?;

        let chunk = (instructions.len() / self.config.max_procs).max(1);
        let jobs = instructions
            .chunks(chunk)
            .enumerate()
            .map(|(c, lines)| self.write_job(&format!("{}_it{batch}_stack{c}", self.name), lines))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            batch,
            jobs = jobs.len(),
            candidates = candidates.len(),
            "dispatching PhyloNet jobs"
        );
        self.pool
            .install(|| jobs.par_iter().try_for_each(|job| self.run_job(job)))?;

        let mut results = Vec::with_capacity(candidates.len());
        for job in &jobs {
            results.extend(read_records(job)?);
        }
        if results.len() != candidates.len() {
            return Err(SearchError::ResultCountMismatch {
                expected: candidates.len(),
                actual: results.len(),
            });
        }
        debug!(batch, "PhyloNet jobs finished");

        Ok(results
            .into_iter()
            .map(|record| Evaluation {
                cost: record.extra_lineages as f64,
                payload: record,
            })
            .collect())
    }
}

/// NEXUS preamble listing `gene_trees` as `g0000001`, `g0000002`, ... and
/// opening the PhyloNet block.
pub fn nexus_head(gene_trees: &[String]) -> String {
    let mut head = String::from("#NEXUS\n\nBEGIN TREES;\n\n");
    for (i, tree) in gene_trees.iter().enumerate() {
        head.push_str("Tree ");
        head.push_str(&tree_id(i + 1));
        head.push_str(" =\n");
        head.push_str(tree.trim_end());
        head.push('\n');
    }
    head.push_str("\nEND;\n\n\n\nBEGIN PhyloNet;\n\n");
    head
}

fn read_records(job: &Job) -> Result<Vec<PhyloNetRecord>> {
    let text = fs::read_to_string(&job.output)?;
    parse_output(&text, job.records, &job.output)
}

/// Parses `expected` four-line records from PhyloNet output.
///
/// Each record is a blank line, the echoed instruction holding the tree ids
/// in parentheses and the mapping in angle brackets, the species tree, and
/// `Total number of extra lineages:<n>`.
pub fn parse_output(text: &str, expected: usize, file: &Path) -> Result<Vec<PhyloNetRecord>> {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    if lines.len() % 4 != 0 {
        return Err(SearchError::OracleParse {
            file: file.to_path_buf(),
            reason: format!("{} lines do not form whole records", lines.len()),
        });
    }
    if lines.len() / 4 != expected {
        return Err(SearchError::ResultCountMismatch {
            expected,
            actual: lines.len() / 4,
        });
    }
    lines
        .chunks_exact(4)
        .enumerate()
        .map(|(i, record)| {
            parse_record(record).map_err(|reason| SearchError::OracleParse {
                file: file.to_path_buf(),
                reason: format!("record {}: {reason}", i + 1),
            })
        })
        .collect()
}

fn parse_record(lines: &[&str]) -> std::result::Result<PhyloNetRecord, String> {
    if !lines[0].trim().is_empty() {
        return Err(format!("expected blank separator, found {:?}", lines[0]));
    }
    if tree_id_list(lines[1]).is_none() {
        return Err(format!("no tree ids in {:?}", lines[1]));
    }
    let mapping = match (lines[1].find('<'), lines[1].rfind('>')) {
        (Some(start), Some(end)) if end > start + 1 => &lines[1][start + 1..end],
        _ => return Err(format!("no allele mapping in {:?}", lines[1])),
    };
    let tree = match lines[2].rfind(';') {
        Some(end) if lines[2].starts_with('(') => &lines[2][..=end],
        _ => return Err(format!("no species tree in {:?}", lines[2])),
    };
    let extra_lineages = lines[3]
        .split_once("Total number of extra lineages:")
        .and_then(|(_, n)| n.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite() && *n >= 0.0)
        .ok_or_else(|| format!("no number of extra lineages in {:?}", lines[3]))?;

    Ok(PhyloNetRecord {
        tree: tree.to_string(),
        mapping: mapping.to_string(),
        extra_lineages: extra_lineages as u64,
    })
}

/// Parenthesized run of tree ids (`g`, digits, commas, spaces).
fn tree_id_list(line: &str) -> Option<&str> {
    line.match_indices('(').find_map(|(pos, _)| {
        let rest = &line[pos + 1..];
        let end = rest.find(|c: char| !(c == 'g' || c == ',' || c == ' ' || c.is_ascii_digit()))?;
        rest[end..].starts_with(')').then(|| &rest[..end])
    })
}
