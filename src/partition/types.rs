//! Allele-to-parent assignments and reassignment moves.

use crate::tabu::TabuMove;

/// Parent-group index of every allele, one vector per locus.
pub type Assignment = Vec<Vec<usize>>;

/// Reassignment of one allele at one locus from one parent group to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlleleMove {
    /// Locus (block) index.
    pub locus: usize,
    /// Allele index within the locus.
    pub allele: usize,
    /// Group the allele leaves.
    pub from: usize,
    /// Group the allele joins.
    pub to: usize,
}

impl AlleleMove {
    /// The same allele moved back.
    pub fn reverse(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            ..*self
        }
    }

    /// Tabu attribute of the assignment this move creates.
    pub fn target(&self) -> (usize, usize, usize) {
        (self.locus, self.allele, self.to)
    }
}

/// A feasible step in the partition neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PartitionMove {
    /// One allele joins a group with spare capacity.
    Shift(AlleleMove),
    /// Two alleles of the same locus exchange groups.
    Swap(AlleleMove, AlleleMove),
}

impl PartitionMove {
    /// Component allele moves.
    pub fn parts(&self) -> Vec<AlleleMove> {
        match *self {
            Self::Shift(m) => vec![m],
            Self::Swap(a, b) => vec![a, b],
        }
    }

    /// The move undoing this one.
    pub fn reverse(&self) -> Self {
        match *self {
            Self::Shift(m) => Self::Shift(m.reverse()),
            Self::Swap(a, b) => Self::Swap(a.reverse(), b.reverse()),
        }
    }

    /// Applies the move, returning a new assignment.
    pub fn apply(&self, assignment: &[Vec<usize>]) -> Assignment {
        let mut out = assignment.to_vec();
        for m in self.parts() {
            out[m.locus][m.allele] = m.to;
        }
        out
    }
}

impl TabuMove for PartitionMove {
    type Key = (usize, usize, usize);

    fn keys(&self) -> Vec<Self::Key> {
        self.parts().iter().map(AlleleMove::target).collect()
    }

    fn tabu_keys(&self) -> Vec<Self::Key> {
        self.reverse().keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(locus: usize, allele: usize, from: usize, to: usize) -> AlleleMove {
        AlleleMove {
            locus,
            allele,
            from,
            to,
        }
    }

    #[test]
    fn test_reverse_swaps_from_and_to() {
        let m = mv(1, 2, 0, 3);
        assert_eq!(m.reverse(), mv(1, 2, 3, 0));
        assert_eq!(m.reverse().reverse(), m);
    }

    #[test]
    fn test_apply_then_reverse_restores() {
        let start = vec![vec![0, 1, 1, 0], vec![1, 1, 0, 0]];
        let swap = PartitionMove::Swap(mv(0, 0, 0, 1), mv(0, 1, 1, 0));
        let moved = swap.apply(&start);
        assert_eq!(moved, vec![vec![1, 0, 1, 0], vec![1, 1, 0, 0]]);
        assert_eq!(swap.reverse().apply(&moved), start);

        let shift = PartitionMove::Shift(mv(1, 3, 0, 2));
        let moved = shift.apply(&start);
        assert_eq!(moved[1], vec![1, 1, 0, 2]);
        assert_eq!(shift.reverse().apply(&moved), start);
    }

    #[test]
    fn test_tabu_keys_forbid_moving_back() {
        let shift = PartitionMove::Shift(mv(0, 2, 1, 0));
        assert_eq!(shift.keys(), vec![(0, 2, 0)]);
        assert_eq!(shift.tabu_keys(), vec![(0, 2, 1)]);
        // Moving allele 2 back to group 1 hits the recorded key.
        let back = PartitionMove::Shift(mv(0, 2, 0, 1));
        assert_eq!(back.keys(), shift.tabu_keys());
    }
}
