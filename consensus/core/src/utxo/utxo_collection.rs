use crate::tx::*;
use itertools::Itertools;
use std::collections::HashMap;

pub type UtxoCollection = HashMap<TransactionOutpoint, UtxoEntry>;

pub trait UtxoCollectionExtensions {
    /// Checks if the `outpoint` key exists with an entry that holds `entry.block_blue_score == blue_score`
    fn contains_with_blue_score(&self, outpoint: &TransactionOutpoint, blue_score: u64) -> bool;

    /// Adds all entries from `other` to `self`.
    /// Note that this means that values from `other` might override values of `self`.
    fn add_many(&mut self, other: &Self);

    /// Removes all elements in `other` from `self`. Equivalent to `self - other` in set theory.
    fn remove_many(&mut self, other: &Self);

    /// Returns whether the intersection between the two collections is not empty.
    fn intersects(&self, other: &Self) -> bool;

    /// Returns the first outpoint found in both collections for which
    /// `rule(outpoint, self_entry, other_entry)` holds
    fn intersects_with_rule<F>(&self, other: &Self, rule: F) -> Option<TransactionOutpoint>
    where
        F: Fn(&TransactionOutpoint, &UtxoEntry, &UtxoEntry) -> bool;

    /// Returns the entries sorted by outpoint
    fn to_sorted_vec(&self) -> Vec<(&TransactionOutpoint, &UtxoEntry)>;

    /// Renders the collection in outpoint order, so equal collections always render equally
    fn render(&self) -> String;
}

impl UtxoCollectionExtensions for UtxoCollection {
    fn contains_with_blue_score(&self, outpoint: &TransactionOutpoint, blue_score: u64) -> bool {
        if let Some(entry) = self.get(outpoint) { entry.block_blue_score == blue_score } else { false }
    }

    fn add_many(&mut self, other: &Self) {
        for (k, v) in other.iter() {
            self.insert(*k, v.clone());
        }
    }

    fn remove_many(&mut self, other: &Self) {
        for k in other.keys() {
            self.remove(k);
        }
    }

    fn intersects(&self, other: &Self) -> bool {
        // We prefer iterating over the smaller set
        let (keys, other) = if self.len() <= other.len() { (self.keys(), other) } else { (other.keys(), self) };

        for k in keys {
            if other.contains_key(k) {
                return true;
            }
        }
        false
    }

    fn intersects_with_rule<F>(&self, other: &Self, rule: F) -> Option<TransactionOutpoint>
    where
        F: Fn(&TransactionOutpoint, &UtxoEntry, &UtxoEntry) -> bool,
    {
        self.iter().find_map(|(outpoint, entry)| match other.get(outpoint) {
            Some(other_entry) if rule(outpoint, entry, other_entry) => Some(*outpoint),
            _ => None,
        })
    }

    fn to_sorted_vec(&self) -> Vec<(&TransactionOutpoint, &UtxoEntry)> {
        self.iter().sorted_by_key(|(outpoint, _)| **outpoint).collect()
    }

    fn render(&self) -> String {
        let items = self
            .to_sorted_vec()
            .into_iter()
            .map(|(outpoint, entry)| format!("{} => {}, blue_score: {}", outpoint, entry.amount, entry.block_blue_score))
            .join(", ");
        format!("[ {} ]", items)
    }
}
