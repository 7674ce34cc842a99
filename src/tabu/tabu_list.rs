//! Bounded short-term memory of recently accepted moves.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// FIFO list of move-key entries, most recent first.
///
/// Each accepted step contributes one entry (the keys of one move, or of a
/// matched pair of moves). Once `tenure` entries are held, pushing a new
/// entry evicts the oldest one. Lookup is backed by a key multiset so that
/// membership tests do not scan the whole list.
///
/// # Examples
///
/// ```
/// use u_labelsearch::tabu::TabuList;
///
/// let mut list = TabuList::new(2);
/// list.push(vec![1]);
/// list.push(vec![2]);
/// list.push(vec![3]);
/// assert!(!list.is_tabu(&[1]));
/// assert!(list.is_tabu(&[2, 9]));
/// ```
#[derive(Debug, Clone)]
pub struct TabuList<K> {
    entries: VecDeque<Vec<K>>,
    counts: HashMap<K, usize>,
    tenure: usize,
}

impl<K: Eq + Hash + Clone> TabuList<K> {
    /// Creates an empty list holding at most `tenure` entries.
    pub fn new(tenure: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(tenure + 1),
            counts: HashMap::new(),
            tenure,
        }
    }

    /// Maximum number of retained entries.
    pub fn tenure(&self) -> usize {
        self.tenure
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list holds no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records `entry` as the most recent one, evicting the oldest entries
    /// beyond the tenure.
    pub fn push(&mut self, entry: Vec<K>) {
        for key in &entry {
            *self.counts.entry(key.clone()).or_insert(0) += 1;
        }
        self.entries.push_front(entry);
        while self.entries.len() > self.tenure {
            self.shrink();
        }
    }

    /// Drops the oldest entry, if any.
    pub fn shrink(&mut self) {
        if let Some(old) = self.entries.pop_back() {
            for key in &old {
                if let Some(n) = self.counts.get_mut(key) {
                    *n -= 1;
                    if *n == 0 {
                        self.counts.remove(key);
                    }
                }
            }
        }
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.counts.clear();
    }

    /// Returns true if any of `keys` appears in a retained entry.
    pub fn is_tabu(&self, keys: &[K]) -> bool {
        keys.iter().any(|k| self.counts.contains_key(k))
    }

    /// Iterates over retained entries, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &Vec<K>> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_evicts_oldest() {
        let mut list = TabuList::new(3);
        for k in 0..5 {
            list.push(vec![k]);
        }
        assert_eq!(list.len(), 3);
        let order: Vec<i32> = list.iter().map(|e| e[0]).collect();
        assert_eq!(order, vec![4, 3, 2], "most recent entry must come first");
        assert!(!list.is_tabu(&[0]));
        assert!(!list.is_tabu(&[1]));
        assert!(list.is_tabu(&[2]));
    }

    #[test]
    fn test_shrink_releases_keys() {
        let mut list = TabuList::new(4);
        list.push(vec![(0, 1, 2), (0, 3, 1)]);
        list.push(vec![(1, 0, 0)]);
        assert!(list.is_tabu(&[(0, 3, 1)]));

        list.shrink();
        assert_eq!(list.len(), 1);
        assert!(!list.is_tabu(&[(0, 1, 2)]));
        assert!(!list.is_tabu(&[(0, 3, 1)]));
        assert!(list.is_tabu(&[(1, 0, 0)]));

        list.shrink();
        list.shrink();
        assert!(list.is_empty());
        assert!(!list.is_tabu(&[(1, 0, 0)]));
    }

    #[test]
    fn test_duplicate_keys_across_entries() {
        let mut list = TabuList::new(2);
        list.push(vec![7]);
        list.push(vec![7]);
        list.shrink();
        assert!(list.is_tabu(&[7]), "key still held by the newer entry");
        list.shrink();
        assert!(!list.is_tabu(&[7]));
    }

    #[test]
    fn test_clear() {
        let mut list = TabuList::new(2);
        list.push(vec![1, 2]);
        list.clear();
        assert!(list.is_empty());
        assert!(!list.is_tabu(&[1, 2]));
    }

    proptest! {
        #[test]
        fn prop_is_tabu_matches_retained_entries(
            tenure in 1usize..6,
            ops in prop::collection::vec(prop::option::of(prop::collection::vec(0u8..10, 1..3)), 0..40),
            key in 0u8..10,
        ) {
            let mut list = TabuList::new(tenure);
            let mut model: VecDeque<Vec<u8>> = VecDeque::new();
            for op in ops {
                match op {
                    Some(entry) => {
                        list.push(entry.clone());
                        model.push_front(entry);
                        model.truncate(tenure);
                    }
                    None => {
                        list.shrink();
                        model.pop_back();
                    }
                }
                let expected = model.iter().any(|e| e.contains(&key));
                prop_assert_eq!(list.is_tabu(&[key]), expected);
                prop_assert!(list.len() <= tenure);
            }
        }
    }
}
