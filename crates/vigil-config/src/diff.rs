//! Generic configuration set diffing.
//!
//! A reconfiguration cycle runs one diff per entity kind: keys only in the
//! new collection are `added`, keys only in the old are `removed`, keys in
//! both whose values differ by deep equality are `modified`. Diffing is
//! purely functional and never fails.

use std::collections::{BTreeMap, BTreeSet};

/// The outcome of diffing two keyed configuration collections.
///
/// `added`, `modified` and `unchanged` carry values from the new collection;
/// `removed` carries values from the old one. The four sets are disjoint by
/// key and together cover every key of `old ∪ new`.
#[derive(Debug, Clone)]
pub struct Difference<T> {
    /// Objects present only in the new collection.
    pub added: Vec<T>,
    /// Objects present only in the old collection.
    pub removed: Vec<T>,
    /// Objects present in both whose values differ.
    pub modified: Vec<T>,
    /// Objects present in both with equal values.
    pub unchanged: Vec<T>,
}

impl<T> Default for Difference<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            modified: Vec::new(),
            unchanged: Vec::new(),
        }
    }
}

impl<T> Difference<T> {
    /// Returns true if nothing was added, removed or modified.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Number of objects that require applier work.
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

/// Diffs two keyed maps of configuration objects.
pub fn diff_keyed<K, T>(old: &BTreeMap<K, T>, new: &BTreeMap<K, T>) -> Difference<T>
where
    K: Ord,
    T: PartialEq + Clone,
{
    let mut diff = Difference::default();

    for (key, new_value) in new {
        match old.get(key) {
            None => diff.added.push(new_value.clone()),
            Some(old_value) if old_value != new_value => diff.modified.push(new_value.clone()),
            Some(_) => diff.unchanged.push(new_value.clone()),
        }
    }
    for (key, old_value) in old {
        if !new.contains_key(key) {
            diff.removed.push(old_value.clone());
        }
    }

    diff
}

/// Diffs two self-keyed ordered sets (entities whose identity is their
/// content, such as dependencies). `modified` is empty by construction.
pub fn diff_set<T>(old: &BTreeSet<T>, new: &BTreeSet<T>) -> Difference<T>
where
    T: Ord + Clone,
{
    let mut diff = Difference::default();
    for value in new {
        if old.contains(value) {
            diff.unchanged.push(value.clone());
        } else {
            diff.added.push(value.clone());
        }
    }
    for value in old {
        if !new.contains(value) {
            diff.removed.push(value.clone());
        }
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, i32)]) -> BTreeMap<String, i32> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn classifies_added_removed_modified_unchanged() {
        let old = map(&[("a", 1), ("b", 2), ("c", 3)]);
        let new = map(&[("b", 2), ("c", 30), ("d", 4)]);

        let diff = diff_keyed(&old, &new);
        assert_eq!(diff.added, vec![4]);
        assert_eq!(diff.removed, vec![1]);
        assert_eq!(diff.modified, vec![30]);
        assert_eq!(diff.unchanged, vec![2]);
        assert_eq!(diff.change_count(), 3);
    }

    #[test]
    fn partitions_the_key_union() {
        let old = map(&[("a", 1), ("b", 2), ("c", 3), ("e", 5)]);
        let new = map(&[("b", 2), ("c", 30), ("d", 4), ("e", 5)]);
        let diff = diff_keyed(&old, &new);

        let total =
            diff.added.len() + diff.removed.len() + diff.modified.len() + diff.unchanged.len();
        let union: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
        assert_eq!(total, union.len());
    }

    #[test]
    fn empty_against_empty() {
        let old: BTreeMap<String, i32> = BTreeMap::new();
        let diff = diff_keyed(&old, &old);
        assert!(diff.is_empty());
        assert!(diff.unchanged.is_empty());
    }

    #[test]
    fn set_diff_has_no_modified() {
        let old: BTreeSet<i32> = [1, 2, 3].into_iter().collect();
        let new: BTreeSet<i32> = [2, 3, 4].into_iter().collect();
        let diff = diff_set(&old, &new);
        assert_eq!(diff.added, vec![4]);
        assert_eq!(diff.removed, vec![1]);
        assert!(diff.modified.is_empty());
        assert_eq!(diff.unchanged, vec![2, 3]);
    }
}
