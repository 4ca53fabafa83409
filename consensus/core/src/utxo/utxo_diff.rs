use super::{
    utxo_collection::*,
    utxo_error::{UtxoAlgebraError, UtxoResult},
};
use crate::tx::{TransactionOutpoint, UtxoEntry, VerifiableTransaction};
use serde::{Deserialize, Serialize};
use std::{collections::hash_map::Entry::Vacant, fmt::Display};

pub trait ImmutableUtxoDiff {
    fn added(&self) -> &UtxoCollection;
    fn removed(&self) -> &UtxoCollection;
}

/// The delta between two UTXO states: applying `remove` and then `add` to some base
/// state yields the new state. An outpoint may appear in both collections only with
/// different blue scores, in which case it is an acceptance update of that output
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoDiff {
    pub add: UtxoCollection,
    pub remove: UtxoCollection,
}

impl<T: ImmutableUtxoDiff> ImmutableUtxoDiff for &T {
    fn added(&self) -> &UtxoCollection {
        (*self).added()
    }
    fn removed(&self) -> &UtxoCollection {
        (*self).removed()
    }
}

impl ImmutableUtxoDiff for UtxoDiff {
    fn added(&self) -> &UtxoCollection {
        &self.add
    }

    fn removed(&self) -> &UtxoCollection {
        &self.remove
    }
}

pub struct ReversedUtxoDiff<'a> {
    inner: &'a UtxoDiff,
}

impl<'a> ReversedUtxoDiff<'a> {
    pub fn new(inner: &'a UtxoDiff) -> Self {
        Self { inner }
    }
}

impl ImmutableUtxoDiff for ReversedUtxoDiff<'_> {
    fn added(&self) -> &UtxoCollection {
        &self.inner.remove // Reverse inner
    }

    fn removed(&self) -> &UtxoCollection {
        &self.inner.add // Reverse inner
    }
}

impl Display for UtxoDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "add: {}; remove: {}", self.add.render(), self.remove.render())
    }
}

impl UtxoDiff {
    pub fn new(add: UtxoCollection, remove: UtxoCollection) -> Self {
        Self { add, remove }
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    pub fn as_reversed(&self) -> impl ImmutableUtxoDiff + '_ {
        ReversedUtxoDiff::new(self)
    }

    pub fn to_reversed(self) -> Self {
        Self::new(self.remove, self.add)
    }

    pub fn with_diff(&self, other: &impl ImmutableUtxoDiff) -> UtxoResult<UtxoDiff> {
        let mut clone = self.clone();
        clone.with_diff_in_place(other)?;
        Ok(clone)
    }

    /// Applies the provided diff to this diff in-place. This is equal to if the
    /// first diff, and then the second diff were applied to the same base UTXO set.
    /// On error `self` is left untouched
    pub fn with_diff_in_place(&mut self, other: &impl ImmutableUtxoDiff) -> UtxoResult<()> {
        if let Some(offending_outpoint) =
            other.removed().intersects_with_rule(&self.remove, |outpoint, entry_to_remove, _existing_entry| {
                !self.add.contains_with_blue_score(outpoint, entry_to_remove.block_blue_score)
            })
        {
            return Err(UtxoAlgebraError::DuplicateRemovePoint(offending_outpoint));
        }

        if let Some(offending_outpoint) = other.added().intersects_with_rule(&self.add, |outpoint, _entry_to_add, existing_entry| {
            !other.removed().contains_with_blue_score(outpoint, existing_entry.block_blue_score)
        }) {
            return Err(UtxoAlgebraError::DuplicateAddPoint(offending_outpoint));
        }

        let mut intersection = UtxoCollection::new();

        // If does not exist neither in `add` nor in `remove` - add to `remove`
        intersection_with_remainder_having_blue_score_in_place(other.removed(), &self.add, &mut intersection, &mut self.remove);
        // If already exists in `add` with the same blue score - remove from `add`
        self.add.remove_many(&intersection);

        intersection.clear();

        // If does not exist neither in `add` nor in `remove`, or exists in `remove' with different blue score - add to 'add'
        intersection_with_remainder_having_blue_score_in_place(other.added(), &self.remove, &mut intersection, &mut self.add);
        // If already exists in `remove` with the same blue score - remove from `remove`
        self.remove.remove_many(&intersection);

        Ok(())
    }

    /// Returns a new UTXO diff with the difference between this diff and another
    /// Assumes that:
    /// Both diffs are from the same base
    /// If an outpoint exists in both diffs, its underlying values would be the same
    ///
    /// diff_from follows a set of rules represented by the following 3 by 3 table:
    ///
    /// ```text
    ///          |           |   this    |           |
    /// ---------+-----------+-----------+-----------+-----------
    ///          |           |   add     |   remove  |   None
    /// ---------+-----------+-----------+-----------+-----------
    /// other    |   add     |   -       |   X       |   add
    /// ---------+-----------+-----------+-----------+-----------
    ///          |   remove  |   X       |   -       |   remove
    /// ---------+-----------+-----------+-----------+-----------
    ///          |   None    |   remove  |   add     |   -
    ///
    /// Key:
    /// -         Don't add anything to the result
    /// X         Return an error
    /// add       Add the UTXO into the add collection of the result
    /// remove    Add the UTXO into the remove collection of the result
    /// ```
    ///
    /// The blue score acts as an extra dimension: an outpoint in `add` of both diffs with
    /// different blue scores yields an update (removed at this blue score, added at the other's),
    /// and the X cells are tolerated when a companion entry proves an acceptance update.
    ///
    /// Examples:
    /// 1. This diff contains a UTXO in add, and the other diff contains it in remove
    ///    diff_from results in an error
    /// 2. This diff contains a UTXO in remove, and the other diff does not contain it
    ///    diff_from results in the UTXO being added to add
    pub fn diff_from(&self, other: &impl ImmutableUtxoDiff) -> UtxoResult<UtxoDiff> {
        // Check that NOT(entries with unequal blue scores AND utxo is in self.add and/or other.remove) -> Error
        let rule_not_added_output_removed_with_blue_score =
            |outpoint: &TransactionOutpoint, this_entry: &UtxoEntry, other_entry: &UtxoEntry| {
                !(other_entry.block_blue_score != this_entry.block_blue_score
                    && (self.add.contains_with_blue_score(outpoint, other_entry.block_blue_score)
                        || other.removed().contains_with_blue_score(outpoint, this_entry.block_blue_score)))
            };

        if let Some(offending_outpoint) = self.remove.intersects_with_rule(other.added(), rule_not_added_output_removed_with_blue_score)
        {
            return Err(UtxoAlgebraError::DiffIntersectionPoint(offending_outpoint, "both in self.remove and in other.add"));
        }

        // Check that NOT(entries with unequal blue score AND utxo is in self.remove and/or other.add) -> Error
        let rule_not_removed_output_added_with_blue_score =
            |outpoint: &TransactionOutpoint, this_entry: &UtxoEntry, other_entry: &UtxoEntry| {
                !(other_entry.block_blue_score != this_entry.block_blue_score
                    && (self.remove.contains_with_blue_score(outpoint, other_entry.block_blue_score)
                        || other.added().contains_with_blue_score(outpoint, this_entry.block_blue_score)))
            };

        if let Some(offending_outpoint) = self.add.intersects_with_rule(other.removed(), rule_not_removed_output_added_with_blue_score)
        {
            return Err(UtxoAlgebraError::DiffIntersectionPoint(offending_outpoint, "both in self.add and in other.remove"));
        }

        // If we have the same entry in self.remove and other.remove
        // and existing entry is with different blue score -> Error
        if let Some(offending_outpoint) = self.remove.intersects_with_rule(other.removed(), |_outpoint, this_entry, other_entry| {
            other_entry.block_blue_score != this_entry.block_blue_score
        }) {
            return Err(UtxoAlgebraError::DiffIntersectionPoint(
                offending_outpoint,
                "both in self.remove and other.remove with different blue scores, with no corresponding entry in self.add",
            ));
        }

        let mut result = UtxoDiff::default();

        // All utxos in self.add:
        // If they are not in other.add - should be added in result.remove
        let mut in_both_to_add = UtxoCollection::new();
        subtraction_with_remainder_having_blue_score_in_place(&self.add, other.added(), &mut result.remove, &mut in_both_to_add);
        // If they are in other.remove - base utxo-set is not the same
        if in_both_to_add.intersects(&self.remove) != in_both_to_add.intersects(other.removed()) {
            return Err(UtxoAlgebraError::General(
                "diff_from: outpoint both in self.add, other.add, and only one of self.remove and other.remove",
            ));
        }

        // All utxos in other.remove:
        // If they are not in self.remove - should be added in result.remove
        subtraction_having_blue_score_in_place(other.removed(), &self.remove, &mut result.remove);

        // All utxos in self.remove:
        // If they are not in other.remove - should be added in result.add
        subtraction_having_blue_score_in_place(&self.remove, other.removed(), &mut result.add);

        // All utxos in other.add:
        // If they are not in self.add - should be added in result.add
        subtraction_having_blue_score_in_place(other.added(), &self.add, &mut result.add);

        Ok(result)
    }

    /// Records the spending of all populated inputs and the creation of all outputs of `transaction`,
    /// accepted at `block_blue_score`. On error the diff may be partially updated, so callers
    /// needing atomicity should apply the transaction to a clone
    pub fn add_transaction(&mut self, transaction: &impl VerifiableTransaction, block_blue_score: u64) -> UtxoResult<()> {
        for (input, entry) in transaction.populated_inputs() {
            self.remove_entry(&input.previous_outpoint, entry)?;
        }

        let is_coinbase = transaction.is_coinbase();
        let tx_id = transaction.id();

        for (i, output) in transaction.outputs().iter().enumerate() {
            let outpoint = TransactionOutpoint::new(tx_id, i as u32);
            let entry = UtxoEntry::new(output.value, output.script_public_key.clone(), block_blue_score, is_coinbase);
            self.add_entry(outpoint, entry)?;
        }
        Ok(())
    }

    /// Marks `outpoint` as spent. Cancels a matching pending add, and fails if the
    /// outpoint is already marked as removed
    pub fn remove_entry(&mut self, outpoint: &TransactionOutpoint, entry: &UtxoEntry) -> UtxoResult<()> {
        if self.add.contains_with_blue_score(outpoint, entry.block_blue_score) {
            self.add.remove(outpoint);
        } else if let Vacant(e) = self.remove.entry(*outpoint) {
            e.insert(entry.clone());
        } else {
            return Err(UtxoAlgebraError::DoubleRemoveCall(*outpoint));
        }
        Ok(())
    }

    /// Marks `outpoint` as created. Cancels a matching pending remove, and fails if the
    /// outpoint is already marked as added
    pub fn add_entry(&mut self, outpoint: TransactionOutpoint, entry: UtxoEntry) -> UtxoResult<()> {
        if self.remove.contains_with_blue_score(&outpoint, entry.block_blue_score) {
            self.remove.remove(&outpoint);
        } else if let Vacant(e) = self.add.entry(outpoint) {
            e.insert(entry);
        } else {
            return Err(UtxoAlgebraError::DoubleAddCall(outpoint));
        }
        Ok(())
    }
}

/// Splits `collection` into entries found in `other` with the same blue score (`result_intersection`)
/// and all the rest (`result_remainder`)
fn intersection_with_remainder_having_blue_score_in_place(
    collection: &UtxoCollection,
    other: &UtxoCollection,
    result_intersection: &mut UtxoCollection,
    result_remainder: &mut UtxoCollection,
) {
    for (outpoint, entry) in collection.iter() {
        if other.contains_with_blue_score(outpoint, entry.block_blue_score) {
            result_intersection.insert(*outpoint, entry.clone());
        } else {
            result_remainder.insert(*outpoint, entry.clone());
        }
    }
}

/// Splits `collection` into entries missing from `other` at the same blue score (`result_subtraction`)
/// and entries present there (`result_remainder`)
fn subtraction_with_remainder_having_blue_score_in_place(
    collection: &UtxoCollection,
    other: &UtxoCollection,
    result_subtraction: &mut UtxoCollection,
    result_remainder: &mut UtxoCollection,
) {
    for (outpoint, entry) in collection.iter() {
        if !other.contains_with_blue_score(outpoint, entry.block_blue_score) {
            result_subtraction.insert(*outpoint, entry.clone());
        } else {
            result_remainder.insert(*outpoint, entry.clone());
        }
    }
}

/// Inserts into `result` all entries of `collection` missing from `other` at the same blue score
fn subtraction_having_blue_score_in_place(collection: &UtxoCollection, other: &UtxoCollection, result: &mut UtxoCollection) {
    for (outpoint, entry) in collection.iter() {
        if !other.contains_with_blue_score(outpoint, entry.block_blue_score) {
            result.insert(*outpoint, entry.clone());
        }
    }
}
