//! Accession/species entities and PhyloNet mapping strings.

use std::collections::BTreeSet;

use crate::error::{Result, SearchError};

/// Maximal number of parent groups a mapping can name (`___01` .. `___99`).
pub const MAX_GROUPS: usize = 99;

/// A sampled individual and the alleles sequenced from it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Accession {
    /// Accession name.
    pub name: String,
    /// Allele names.
    pub alleles: Vec<String>,
}

impl Accession {
    /// Creates an accession.
    pub fn new(name: impl Into<String>, alleles: Vec<String>) -> Self {
        Self {
            name: name.into(),
            alleles,
        }
    }
}

/// A species with its ploidy level and accessions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Species {
    /// Species name, also the prefix of its parent groups.
    pub name: String,
    /// Ploidy level.
    pub ploidy: usize,
    /// Accessions of the species.
    pub accessions: Vec<Accession>,
}

impl Species {
    /// Creates a species without accessions.
    pub fn new(name: impl Into<String>, ploidy: usize) -> Self {
        Self {
            name: name.into(),
            ploidy,
            accessions: Vec::new(),
        }
    }

    /// Adds an accession.
    pub fn with_accession(mut self, accession: Accession) -> Self {
        self.accessions.push(accession);
        self
    }

    /// All alleles of all accessions, sorted and deduplicated.
    pub fn alleles(&self) -> Vec<String> {
        self.accessions
            .iter()
            .flat_map(|a| a.alleles.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Mapping entry `name:allele,allele,...`, or `None` without alleles.
    pub fn mapping_entry(&self) -> Option<String> {
        let alleles = self.alleles();
        (!alleles.is_empty()).then(|| format!("{}:{}", self.name, alleles.join(",")))
    }
}

/// Parses a tab-separated allele table into species, in order of first
/// appearance.
///
/// Each line reads `accession<TAB>species<TAB>allele,allele,...<TAB>ploidy`.
/// Further accessions of a known species must repeat its ploidy. Blank lines
/// are skipped; a table without entries is an error.
///
/// # Examples
///
/// ```
/// use u_labelsearch::partition::parse_allele_table;
///
/// let species = parse_allele_table("A_1\tA\ta1\t2\nP_1\tP\tp1,p2,p3\t4\n").unwrap();
/// assert_eq!(species.len(), 2);
/// assert_eq!(species[1].ploidy, 4);
/// assert_eq!(species[1].accessions[0].alleles, ["p1", "p2", "p3"]);
/// ```
pub fn parse_allele_table(text: &str) -> Result<Vec<Species>> {
    let mut species: Vec<Species> = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let parse_err = |reason: String| SearchError::Parse { line: i + 1, reason };
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        let &[accession, name, alleles, ploidy] = fields.as_slice() else {
            return Err(parse_err(format!(
                "expected 4 tab-separated fields, found {}",
                fields.len()
            )));
        };
        let ploidy: usize = ploidy
            .parse()
            .map_err(|_| parse_err(format!("invalid ploidy {ploidy:?}")))?;
        if ploidy % 2 != 0 {
            return Err(parse_err(format!("cannot handle uneven ploidy {ploidy}")));
        }
        let alleles: Vec<String> = alleles
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(String::from)
            .collect();
        if accession.is_empty() || name.is_empty() || alleles.is_empty() || ploidy == 0 {
            return Err(parse_err("empty field".into()));
        }

        let accession = Accession::new(accession, alleles);
        match species.iter_mut().find(|s| s.name == name) {
            Some(sp) if sp.ploidy != ploidy => {
                return Err(parse_err(format!(
                    "conflicting ploidy levels within {name}: {} and {ploidy}",
                    sp.ploidy
                )));
            }
            Some(sp) => sp.accessions.push(accession),
            None => species.push(Species::new(name, ploidy).with_accession(accession)),
        }
    }

    if species.is_empty() {
        return Err(SearchError::EmptyInput("no valid allele table entries".into()));
    }
    Ok(species)
}

/// Joins the alleles of each parent group with `,`, locus by locus.
///
/// `blocks[locus][k]` names the allele whose group is
/// `assignment[locus][k]`. Groups with no alleles yield empty strings. An
/// assignment whose shape differs from `blocks`, or that names a group
/// beyond `ploidy / 2`, is a `DimensionMismatch`.
pub fn allele_partition(
    assignment: &[Vec<usize>],
    blocks: &[Vec<String>],
    ploidy: usize,
) -> Result<Vec<String>> {
    if assignment.len() != blocks.len() {
        return Err(SearchError::DimensionMismatch {
            expected: format!("{} loci", blocks.len()),
            actual: format!("{} loci", assignment.len()),
        });
    }
    let mut groups: Vec<Vec<&str>> = vec![Vec::new(); ploidy / 2];
    for (i, (locus, names)) in assignment.iter().zip(blocks).enumerate() {
        if locus.len() != names.len() {
            return Err(SearchError::DimensionMismatch {
                expected: format!("{} alleles at locus {i}", names.len()),
                actual: format!("{} alleles", locus.len()),
            });
        }
        for (&g, name) in locus.iter().zip(names) {
            let n_groups = groups.len();
            let group = groups.get_mut(g).ok_or_else(|| SearchError::DimensionMismatch {
                expected: format!("parent group below {n_groups} at locus {i}"),
                actual: format!("group {g}"),
            })?;
            group.push(name);
        }
    }
    Ok(groups.into_iter().map(|g| g.join(",")).collect())
}

/// Builds the mapping `<prefix>___01:<alleles>;<prefix>___02:...` over the
/// non-empty groups. Empty groups are dropped before numbering, so group
/// names are always contiguous.
pub fn build_mapping(prefix: &str, groups: &[String]) -> Result<String> {
    if groups.len() > MAX_GROUPS {
        return Err(SearchError::TooManyGroups(groups.len()));
    }
    Ok(groups
        .iter()
        .filter(|alleles| !alleles.is_empty())
        .enumerate()
        .map(|(j, alleles)| format!("{prefix}___{:02}:{alleles}", j + 1))
        .collect::<Vec<_>>()
        .join(";"))
}

/// Comma-separated tree identifiers `g0000001,...,gNNNNNNN`.
pub fn tree_ids(n_trees: usize) -> String {
    (1..=n_trees)
        .map(tree_id)
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn tree_id(i: usize) -> String {
    format!("g{i:07}")
}

/// One PhyloNet instruction line pair.
///
/// The mapping is the base mapping joined with the hypothesis mapping,
/// skipping whichever is empty. Both empty is an error.
///
/// # Examples
///
/// ```
/// use u_labelsearch::partition::build_instruction;
///
/// let line = build_instruction("Infer_ST_MDC", "g0000001", "A:a1", "P___01:p1").unwrap();
/// assert_eq!(line, "Infer_ST_MDC(g0000001) -a\n<A:a1;P___01:p1>;\n");
/// ```
pub fn build_instruction(
    command: &str,
    tree_ids: &str,
    base_mapping: &str,
    hyp_mapping: &str,
) -> Result<String> {
    let mapping = [base_mapping, hyp_mapping]
        .into_iter()
        .filter(|m| !m.is_empty())
        .collect::<Vec<_>>()
        .join(";");
    if mapping.is_empty() {
        return Err(SearchError::EmptyInput("allele mapping is empty".into()));
    }
    Ok(format!("{command}({tree_ids}) -a\n<{mapping}>;\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_species_alleles_sorted_unique() {
        let sp = Species::new("P", 4)
            .with_accession(Accession::new("P_2", names(&["p_c", "p_a"])))
            .with_accession(Accession::new("P_1", names(&["p_b", "p_a"])));
        assert_eq!(sp.alleles(), names(&["p_a", "p_b", "p_c"]));
        assert_eq!(sp.mapping_entry().unwrap(), "P:p_a,p_b,p_c");
        assert_eq!(Species::new("E", 2).mapping_entry(), None);
    }

    #[test]
    fn test_parse_allele_table() {
        let text = "A_1\tA\ta1\t2\n\
                    P_1\tP\tp1, p2,p3\t4\n\
                    \n\
                    P_2\tP\tp4,\t4\n";
        let species = parse_allele_table(text).unwrap();
        assert_eq!(species.len(), 2);
        assert_eq!(species[0].name, "A");
        assert_eq!(species[0].accessions[0].alleles, names(&["a1"]));
        assert_eq!(species[1].name, "P");
        assert_eq!(species[1].ploidy, 4);
        assert_eq!(species[1].accessions.len(), 2);
        assert_eq!(species[1].accessions[0].name, "P_1");
        assert_eq!(species[1].accessions[0].alleles, names(&["p1", "p2", "p3"]));
        assert_eq!(species[1].alleles(), names(&["p1", "p2", "p3", "p4"]));
    }

    #[test]
    fn test_parse_allele_table_errors() {
        let cases = [
            ("A_1\tA\ta1\n", 1),
            ("A_1\n", 1),
            ("A_1\tA\ta1\tx\n", 1),
            ("P_1\tP\tp1,p2,p3\t3\n", 1),
            ("A_1\tA\t , \t2\n", 1),
            ("A_1\t\ta1\t2\n", 1),
            ("A_1\tA\ta1\t0\n", 1),
            ("A_1\tA\ta1\t2\nA_2\tA\ta2\t4\n", 2),
        ];
        for (text, line) in cases {
            match parse_allele_table(text) {
                Err(SearchError::Parse { line: l, .. }) => assert_eq!(l, line, "{text:?}"),
                other => panic!("{text:?} should fail to parse, got {other:?}"),
            }
        }
        assert!(matches!(
            parse_allele_table("\n\n"),
            Err(SearchError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_allele_partition_and_mapping() {
        let blocks = vec![names(&["a_m0", "b_m0", "c_m0"]), names(&["a_m1", "b_m1"])];
        let assignment = vec![vec![0, 2, 0], vec![2, 0]];
        let groups = allele_partition(&assignment, &blocks, 6).unwrap();
        assert_eq!(groups, names(&["a_m0,c_m0,b_m1", "", "b_m0,a_m1"]));
        assert_eq!(
            build_mapping("P", &groups).unwrap(),
            "P___01:a_m0,c_m0,b_m1;P___02:b_m0,a_m1"
        );
    }

    #[test]
    fn test_allele_partition_rejects_mismatched_shape() {
        let blocks = vec![names(&["a", "b", "c"])];
        for assignment in [vec![vec![0, 1, 0, 1]], vec![vec![0, 1]], vec![vec![0, 0, 1], vec![1]]] {
            assert!(matches!(
                allele_partition(&assignment, &blocks, 4),
                Err(SearchError::DimensionMismatch { .. })
            ));
        }
        assert!(matches!(
            allele_partition(&[vec![2, 2, 1]], &blocks, 4),
            Err(SearchError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_build_mapping_numbers_nonempty_groups_contiguously() {
        let groups = names(&["", "a", "", "b", "c"]);
        assert_eq!(build_mapping("P", &groups).unwrap(), "P___01:a;P___02:b;P___03:c");
        assert_eq!(build_mapping("P", &names(&["", ""])).unwrap(), "");
    }

    #[test]
    fn test_build_mapping_group_limit() {
        let groups = vec!["x".to_string(); MAX_GROUPS + 1];
        assert!(matches!(
            build_mapping("P", &groups),
            Err(SearchError::TooManyGroups(100))
        ));
        assert!(build_mapping("P", &groups[..MAX_GROUPS]).unwrap().ends_with("P___99:x"));
    }

    #[test]
    fn test_tree_ids() {
        assert_eq!(tree_ids(3), "g0000001,g0000002,g0000003");
        assert_eq!(tree_ids(0), "");
    }

    #[test]
    fn test_build_instruction_skips_empty_parts() {
        assert_eq!(
            build_instruction("Infer_ST_MDC", "g0000001,g0000002", "", "P___01:x").unwrap(),
            "Infer_ST_MDC(g0000001,g0000002) -a\n<P___01:x>;\n"
        );
        assert!(matches!(
            build_instruction("Infer_ST_MDC", "g0000001", "", ""),
            Err(SearchError::EmptyInput(_))
        ));
    }
}
