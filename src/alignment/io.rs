//! Membership file parsing and alignment output formatting.
//!
//! The input format is the CLUMPP-style membership listing: one line per
//! item, optional labels terminated by `:`, then the membership
//! coefficients. Runs are separated by blank lines.

use std::collections::BTreeMap;

use super::types::{MembershipTensor, Permutations};
use crate::error::{Result, SearchError};

/// Parses a membership file into a tensor.
///
/// Everything up to the last `:` on a line is ignored. A line with no
/// numbers ends the current run.
///
/// # Examples
///
/// ```
/// use u_labelsearch::alignment::parse_indfile;
///
/// let text = "1 1 (x) 1 : 0.9 0.1\n2 2 (x) 1 : 0.2 0.8\n\n\
///             1 1 (x) 1 : 0.1 0.9\n2 2 (x) 1 : 0.7 0.3\n";
/// let t = parse_indfile(text).unwrap();
/// assert_eq!((t.n_items(), t.n_clusters(), t.n_runs()), (2, 2, 2));
/// ```
pub fn parse_indfile(text: &str) -> Result<MembershipTensor> {
    let mut runs = Vec::new();
    let mut current: Vec<Vec<f64>> = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let values = match line.rfind(':') {
            Some(pos) => &line[pos + 1..],
            None => line,
        };
        let row = parse_row(values, i + 1)?;
        if row.is_empty() {
            if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(row);
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    MembershipTensor::from_runs(runs)
}

fn parse_row(values: &str, line: usize) -> Result<Vec<f64>> {
    values
        .split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| SearchError::Parse {
                line,
                reason: format!("invalid membership value {tok:?}"),
            })
        })
        .collect()
}

/// Renders permutations one run per line, 1-based, tab separated.
pub fn format_permutations(perms: &[Vec<usize>]) -> String {
    let mut out = String::new();
    for perm in perms {
        let line: Vec<String> = perm.iter().map(|c| (c + 1).to_string()).collect();
        out.push_str(&line.join("\t"));
        out.push('\n');
    }
    out
}

/// Renders a Q-matrix with six decimals, tab separated.
pub fn format_q_matrix(q: &[Vec<f64>]) -> String {
    let mut out = String::new();
    for row in q {
        let line: Vec<String> = row.iter().map(|v| format!("{v:.6}")).collect();
        out.push_str(&line.join("\t"));
        out.push('\n');
    }
    out
}

/// Renders a tensor as a membership file readable by [`parse_indfile`].
pub fn format_indfile(tensor: &MembershipTensor) -> String {
    let mut out = String::new();
    for run in 0..tensor.n_runs() {
        for item in 0..tensor.n_items() {
            out.push_str(&format!("{0} {0} (x) 1 :", item + 1));
            for cluster in 0..tensor.n_clusters() {
                out.push_str(&format!(" {}", tensor.get(item, cluster, run)));
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Parses permutations written by [`format_permutations`]: one run per
/// line, 1-based labels separated by whitespace. Blank lines are skipped.
pub fn parse_permutations(text: &str) -> Result<Permutations> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.split_whitespace()
                .map(|tok| match tok.parse::<usize>() {
                    Ok(label) if label > 0 => Ok(label - 1),
                    _ => Err(SearchError::Parse {
                        line: i + 1,
                        reason: format!("invalid cluster label {tok:?}"),
                    }),
                })
                .collect()
        })
        .collect()
}

/// Renames the parent groups `<taxon>___NN` of a species tree after an
/// alignment.
///
/// `perm[i]` is the 0-based group shown in aligned column `i`; group
/// `<taxon>___{perm[i] + 1:02}` becomes `<taxon>_P{i + 1}`.
///
/// # Examples
///
/// ```
/// use u_labelsearch::alignment::relabel_tree;
///
/// let tree = "(A,(H___01,H___02));";
/// assert_eq!(relabel_tree(tree, "H", &[1, 0]), "(A,(H_P2,H_P1));");
/// ```
pub fn relabel_tree(tree: &str, taxon: &str, perm: &[usize]) -> String {
    perm.iter()
        .enumerate()
        .fold(tree.to_string(), |tree, (i, &group)| {
            tree.replace(
                &format!("{taxon}___{:02}", group + 1),
                &format!("{taxon}_P{}", i + 1),
            )
        })
}

/// Converts inferred allele mappings into hard memberships.
///
/// Each line is one run's mapping string; the parent groups of `species`
/// are the entries named `<species>___NN:<allele>,...`. Groups are ordered
/// by name, alleles by name, and each allele becomes one item with a 1 in
/// its group's column.
pub fn membership_from_mappings(lines: &[&str], species: &str) -> Result<MembershipTensor> {
    let prefix = format!("{species}___");
    let mut per_run: Vec<BTreeMap<String, usize>> = Vec::new();
    let mut n_clusters = 0;

    for line in lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        let mut groups: Vec<&str> = line
            .split(';')
            .map(str::trim)
            .filter(|g| g.starts_with(&prefix))
            .collect();
        groups.sort_unstable();
        n_clusters = n_clusters.max(groups.len());

        let mut membership = BTreeMap::new();
        for (j, group) in groups.iter().enumerate() {
            let alleles = group.split_once(':').map_or("", |(_, a)| a);
            for allele in alleles.split(',').map(str::trim).filter(|a| !a.is_empty()) {
                membership.insert(allele.to_string(), j);
            }
        }
        per_run.push(membership);
    }

    if per_run.is_empty() || n_clusters == 0 {
        return Err(SearchError::EmptyInput(format!(
            "no parent groups of {species} in mappings"
        )));
    }

    let runs = per_run
        .into_iter()
        .map(|membership| {
            membership
                .into_values()
                .map(|j| {
                    let mut row = vec![0.0; n_clusters];
                    row[j] = 1.0;
                    row
                })
                .collect()
        })
        .collect();
    MembershipTensor::from_runs(runs)
}
