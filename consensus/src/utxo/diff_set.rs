use std::sync::Arc;

use crate::{
    errors::{UtxoSetError, UtxoSetResult},
    utxo::{full_set::FullUtxoSet, set::UtxoSet},
};
use utxodag_consensus_core::{
    tx::{PopulatedTransaction, Transaction, TransactionOutpoint, UtxoEntry},
    utxo::utxo_diff::UtxoDiff,
};
use utxodag_core::{debug, trace};

/// A UTXO set expressed as a diff on top of a shared full set (its base). The base is only
/// read, until the diff is explicitly melded into it.
pub struct DiffUtxoSet {
    base: Arc<FullUtxoSet>,
    diff: UtxoDiff,
}

impl DiffUtxoSet {
    pub fn new(base: Arc<FullUtxoSet>, diff: UtxoDiff) -> Self {
        Self { base, diff }
    }

    pub fn base(&self) -> &Arc<FullUtxoSet> {
        &self.base
    }

    pub fn diff(&self) -> &UtxoDiff {
        &self.diff
    }

    pub fn get(&self, outpoint: &TransactionOutpoint) -> UtxoSetResult<Option<UtxoEntry>> {
        if let Some(removed) = self.diff.remove.get(outpoint) {
            // An add at another blue score is a re-acceptance of the removed output
            return Ok(self.diff.add.get(outpoint).filter(|added| added.block_blue_score != removed.block_blue_score).cloned());
        }
        if let Some(entry) = self.base.get(outpoint)? {
            return Ok(Some(entry));
        }
        Ok(self.diff.add.get(outpoint).cloned())
    }

    pub fn contains(&self, outpoint: &TransactionOutpoint) -> UtxoSetResult<bool> {
        Ok(self.get(outpoint)?.is_some())
    }

    /// Applies `transaction` to the diff at `block_blue_score`. Returns `false` if any input is
    /// missing from this set. The diff is left untouched unless the transaction is fully applied
    pub fn add_transaction(&mut self, transaction: &Transaction, block_blue_score: u64) -> UtxoSetResult<bool> {
        let mut entries = Vec::with_capacity(transaction.inputs.len());
        for input in transaction.inputs.iter() {
            match self.get(&input.previous_outpoint)? {
                Some(entry) => entries.push(entry),
                None => {
                    trace!("Transaction {} spends missing outpoint {}", transaction.id(), input.previous_outpoint);
                    return Ok(false);
                }
            }
        }
        let mut tx_diff = UtxoDiff::default();
        tx_diff.add_transaction(&PopulatedTransaction::new(transaction, entries), block_blue_score)?;
        self.diff.with_diff_in_place(&tx_diff)?;
        Ok(true)
    }

    /// Returns the diff leading from this set to `other`. Both must share the same base instance
    pub fn diff_from(&self, other: &UtxoSet) -> UtxoSetResult<UtxoDiff> {
        match other {
            UtxoSet::Full(_) => Err(UtxoSetError::DiffSetDiffFromFullSet),
            UtxoSet::Diff(other) if Arc::ptr_eq(&self.base, &other.base) => Ok(self.diff.diff_from(&other.diff)?),
            UtxoSet::Diff(_) => Err(UtxoSetError::DifferentBase),
        }
    }

    /// Returns a new diff set over the same base, with `diff` composed on top of this diff
    pub fn with_diff(&self, diff: &UtxoDiff) -> UtxoSetResult<DiffUtxoSet> {
        Ok(Self::new(Arc::clone(&self.base), self.diff.with_diff(diff)?))
    }

    /// Writes the diff into the base set and resets this set to an empty diff. Returns the melded
    /// diff. Fails without writing anything if a removed outpoint is missing from the base
    pub fn meld_to_base(&mut self) -> UtxoSetResult<UtxoDiff> {
        for outpoint in self.diff.remove.keys() {
            if !self.base.contains(outpoint)? {
                return Err(UtxoSetError::MissingBaseOutpoint(*outpoint));
            }
        }
        self.base.write_diff(&self.diff)?;
        debug!("Melded a diff of {} added and {} removed entries into its base", self.diff.add.len(), self.diff.remove.len());
        Ok(std::mem::take(&mut self.diff))
    }

    /// A copy sharing the same base and owning a deep copy of the diff
    pub fn clone_without_base(&self) -> Self {
        Self::new(Arc::clone(&self.base), self.diff.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utxo::tests_util::*;
    use utxodag_consensus_core::utxo::utxo_error::UtxoAlgebraError;
    use utxodag_database::{
        create_temp_db,
        prelude::{CachePolicy, ConnBuilder, EvictionPolicy},
    };

    fn base(db: Arc<utxodag_database::prelude::DB>) -> Arc<FullUtxoSet> {
        let set = FullUtxoSet::new(db, CachePolicy::Tracked { max_size: 1 << 20, eviction: EvictionPolicy::Clear });
        set.add(outpoint(1, 0), entry(10, 0)).unwrap();
        set.add(outpoint(1, 1), entry(11, 0)).unwrap();
        set.add(outpoint(1, 2), entry(12, 0)).unwrap();
        Arc::new(set)
    }

    #[test]
    fn test_containment_transfer() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let base = base(db);

        let mut diff = UtxoDiff::default();
        diff.add.insert(outpoint(2, 0), entry(20, 1));
        diff.remove.insert(outpoint(1, 0), entry(10, 0));
        // Re-acceptance of (1, 1) at a new blue score
        diff.remove.insert(outpoint(1, 1), entry(11, 0));
        diff.add.insert(outpoint(1, 1), entry(11, 3));

        let set = base.with_diff(&diff);
        assert_eq!(set.get(&outpoint(2, 0)).unwrap(), Some(entry(20, 1)));
        assert_eq!(set.get(&outpoint(1, 0)).unwrap(), None);
        assert_eq!(set.get(&outpoint(1, 1)).unwrap(), Some(entry(11, 3)));
        assert_eq!(set.get(&outpoint(1, 2)).unwrap(), base.get(&outpoint(1, 2)).unwrap());
        assert_eq!(set.get(&outpoint(9, 9)).unwrap(), None);

        // The base is not modified
        assert_eq!(base.get(&outpoint(1, 0)).unwrap(), Some(entry(10, 0)));
        assert_eq!(base.get(&outpoint(2, 0)).unwrap(), None);
    }

    #[test]
    fn test_meld_to_base() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let base = base(db);

        let mut set = base.with_diff(&UtxoDiff::default());
        let tx = spend(&[outpoint(1, 0), outpoint(1, 2)], &[7, 15]);
        assert!(set.add_transaction(&tx, 4).unwrap());
        let cb = coinbase(50, 1);
        assert!(set.add_transaction(&cb, 4).unwrap());

        let probes = [
            outpoint(1, 0),
            outpoint(1, 1),
            outpoint(1, 2),
            TransactionOutpoint::new(tx.id(), 0),
            TransactionOutpoint::new(tx.id(), 1),
            TransactionOutpoint::new(cb.id(), 0),
        ];
        let before = probes.iter().map(|o| set.get(o).unwrap()).collect::<Vec<_>>();

        let melded = set.meld_to_base().unwrap();
        assert_eq!(melded.remove.len(), 2);
        assert_eq!(melded.add.len(), 3);
        assert!(set.diff().is_empty());

        let after = probes.iter().map(|o| base.get(o).unwrap()).collect::<Vec<_>>();
        assert_eq!(before, after);
    }

    #[test]
    fn test_meld_missing_base_outpoint() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let base = base(db);

        let mut diff = UtxoDiff::default();
        diff.add.insert(outpoint(2, 0), entry(20, 1));
        diff.remove.insert(outpoint(7, 7), entry(1, 0));
        let mut set = base.with_diff(&diff);

        assert!(matches!(set.meld_to_base(), Err(UtxoSetError::MissingBaseOutpoint(o)) if o == outpoint(7, 7)));
        // Nothing was written and the diff is kept
        assert_eq!(base.get(&outpoint(2, 0)).unwrap(), None);
        assert_eq!(set.diff(), &diff);
    }

    #[test]
    fn test_add_transaction_chains_within_diff() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let base = base(db);
        let mut set = base.with_diff(&UtxoDiff::default());

        let first = spend(&[outpoint(1, 0)], &[10]);
        assert!(set.add_transaction(&first, 2).unwrap());
        // Spending an output created within the diff cancels it out of the diff
        let second = spend(&[TransactionOutpoint::new(first.id(), 0)], &[10]);
        assert!(set.add_transaction(&second, 2).unwrap());
        assert!(!set.diff().add.contains_key(&TransactionOutpoint::new(first.id(), 0)));
        assert!(set.diff().add.contains_key(&TransactionOutpoint::new(second.id(), 0)));

        // Double spend is rejected without touching the diff
        let snapshot = set.diff().clone();
        assert!(!set.add_transaction(&spend(&[outpoint(1, 0)], &[3]), 2).unwrap());
        assert_eq!(set.diff(), &snapshot);
    }

    #[test]
    fn test_diff_from_and_with_diff() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let base = base(db.clone());
        let other_base = Arc::new(FullUtxoSet::new(db, CachePolicy::Empty));

        let mut d1 = UtxoDiff::default();
        d1.add.insert(outpoint(2, 0), entry(20, 1));
        let mut d2 = UtxoDiff::default();
        d2.remove.insert(outpoint(1, 0), entry(10, 0));

        let s1 = base.with_diff(&d1);
        let s2 = base.with_diff(&d2);
        let delta = s1.diff_from(&UtxoSet::Diff(s2.clone_without_base())).unwrap();
        assert_eq!(s1.with_diff(&delta).unwrap().diff(), &d2);

        assert!(matches!(s1.diff_from(&UtxoSet::Full(base.clone())), Err(UtxoSetError::DiffSetDiffFromFullSet)));
        let foreign = UtxoSet::Diff(other_base.with_diff(&d2));
        assert!(matches!(s1.diff_from(&foreign), Err(UtxoSetError::DifferentBase)));

        // Conflicting same blue score add/remove
        let mut d3 = UtxoDiff::default();
        d3.remove.insert(outpoint(2, 0), entry(20, 1));
        let s3 = UtxoSet::Diff(base.with_diff(&d3));
        assert!(matches!(s1.diff_from(&s3), Err(UtxoSetError::Algebra(UtxoAlgebraError::DiffIntersectionPoint(..)))));
    }

    #[test]
    fn test_clone_without_base() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let base = base(db);
        let original = base.with_diff(&UtxoDiff::default());
        let mut clone = original.clone_without_base();
        assert!(Arc::ptr_eq(original.base(), clone.base()));

        assert!(clone.add_transaction(&coinbase(1, 2), 0).unwrap());
        assert!(original.diff().is_empty());
        assert!(!clone.diff().is_empty());
    }
}
