use std::sync::Arc;

use crate::{
    errors::{UtxoSetError, UtxoSetResult},
    model::stores::utxo_set::{DbUtxoSetStore, UtxoSetStore, UtxoSetStoreReader},
    utxo::{diff_set::DiffUtxoSet, set::UtxoSet},
};
use parking_lot::RwLock;
use rocksdb::WriteBatch;
use utxodag_consensus_core::{
    tx::{PopulatedTransaction, Transaction, TransactionOutpoint, UtxoEntry},
    utxo::utxo_diff::{ImmutableUtxoDiff, UtxoDiff},
};
use utxodag_core::trace;
use utxodag_database::prelude::{BatchDbWriter, Cache, CachePolicy, DB, DirectDbWriter, StoreError, StoreResult, StoreResultExtensions};

/// A materialized UTXO set: the persisted set with a bounded in-memory cache in front of it.
/// Mutations are written through to storage, so the cache may be dropped at any time.
pub struct FullUtxoSet {
    store: DbUtxoSetStore,
    cache: Cache<TransactionOutpoint, UtxoEntry>,
    // Faulting a storage read into the cache holds the read side, storage mutations the write side
    storage_lock: RwLock<()>,
}

impl FullUtxoSet {
    pub fn new(db: Arc<DB>, cache_policy: CachePolicy) -> Self {
        Self { store: DbUtxoSetStore::new(db), cache: Cache::new(cache_policy), storage_lock: RwLock::new(()) }
    }

    pub fn get(&self, outpoint: &TransactionOutpoint) -> UtxoSetResult<Option<UtxoEntry>> {
        if let Some(entry) = self.cache.get(outpoint) {
            return Ok(Some(entry));
        }
        let _guard = self.storage_lock.read();
        let entry = self.store.get(outpoint).optional()?;
        if let Some(entry) = &entry {
            self.cache.insert(*outpoint, entry.clone());
        }
        Ok(entry)
    }

    pub fn contains(&self, outpoint: &TransactionOutpoint) -> UtxoSetResult<bool> {
        if self.cache.contains_key(outpoint) {
            return Ok(true);
        }
        Ok(self.store.has(outpoint)?)
    }

    pub fn add(&self, outpoint: TransactionOutpoint, entry: UtxoEntry) -> UtxoSetResult<()> {
        let _guard = self.storage_lock.write();
        self.store.insert(DirectDbWriter::new(self.store.db()), &outpoint, &entry)?;
        self.cache.insert(outpoint, entry);
        Ok(())
    }

    pub fn remove(&self, outpoint: &TransactionOutpoint) -> UtxoSetResult<()> {
        let _guard = self.storage_lock.write();
        self.store.delete(DirectDbWriter::new(self.store.db()), outpoint)?;
        self.cache.remove(outpoint);
        Ok(())
    }

    /// Spends the inputs of `transaction` and adds its outputs at `block_blue_score`. Returns
    /// `false` and leaves the set untouched if any input is missing from the set
    pub fn add_transaction(&self, transaction: &Transaction, block_blue_score: u64) -> UtxoSetResult<bool> {
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
        let mut diff = UtxoDiff::default();
        diff.add_transaction(&PopulatedTransaction::new(transaction, entries), block_blue_score)?;
        self.write_diff(&diff)?;
        Ok(true)
    }

    /// Returns the diff of `other` relative to this set, which must be its base
    pub fn diff_from(self: &Arc<Self>, other: &UtxoSet) -> UtxoSetResult<UtxoDiff> {
        match other {
            UtxoSet::Full(_) => Err(UtxoSetError::FullSetDiffFrom),
            UtxoSet::Diff(diff_set) if Arc::ptr_eq(diff_set.base(), self) => Ok(diff_set.diff().clone()),
            UtxoSet::Diff(_) => Err(UtxoSetError::NotBaseOfOther),
        }
    }

    /// Returns a diff set on top of this set. The full set itself is not modified
    pub fn with_diff(self: &Arc<Self>, diff: &UtxoDiff) -> DiffUtxoSet {
        DiffUtxoSet::new(Arc::clone(self), diff.clone())
    }

    /// Commits `diff` in a single storage write and then mirrors it into the cache
    pub(crate) fn write_diff(&self, diff: &impl ImmutableUtxoDiff) -> UtxoSetResult<()> {
        let mut batch = WriteBatch::default();
        self.store.write_diff(BatchDbWriter::new(&mut batch), diff)?;
        let _guard = self.storage_lock.write();
        self.store.db().write(batch).map_err(StoreError::DbError)?;
        self.cache.remove_many(&mut diff.removed().keys().copied());
        self.cache.insert_many(&mut diff.added().iter().map(|(outpoint, entry)| (*outpoint, entry.clone())));
        Ok(())
    }

    /// A cursor over the persisted set in outpoint key order
    pub fn iterator(&self) -> impl Iterator<Item = StoreResult<(TransactionOutpoint, UtxoEntry)>> + '_ {
        self.store.iterator()
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    pub fn cached_bytes(&self) -> usize {
        self.cache.tracked_size()
    }
}
