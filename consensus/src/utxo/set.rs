use std::sync::Arc;

use crate::{
    errors::{UtxoSetError, UtxoSetResult},
    utxo::{diff_set::DiffUtxoSet, full_set::FullUtxoSet},
};
use utxodag_consensus_core::{
    tx::{Transaction, TransactionOutpoint, UtxoEntry},
    utxo::utxo_diff::UtxoDiff,
};

/// The UTXO state as of some block: either a materialized full set or a diff over one
pub enum UtxoSet {
    Full(Arc<FullUtxoSet>),
    Diff(DiffUtxoSet),
}

impl UtxoSet {
    pub fn get(&self, outpoint: &TransactionOutpoint) -> UtxoSetResult<Option<UtxoEntry>> {
        match self {
            UtxoSet::Full(set) => set.get(outpoint),
            UtxoSet::Diff(set) => set.get(outpoint),
        }
    }

    pub fn contains(&self, outpoint: &TransactionOutpoint) -> UtxoSetResult<bool> {
        match self {
            UtxoSet::Full(set) => set.contains(outpoint),
            UtxoSet::Diff(set) => set.contains(outpoint),
        }
    }

    pub fn add_transaction(&mut self, transaction: &Transaction, block_blue_score: u64) -> UtxoSetResult<bool> {
        match self {
            UtxoSet::Full(set) => set.add_transaction(transaction, block_blue_score),
            UtxoSet::Diff(set) => set.add_transaction(transaction, block_blue_score),
        }
    }

    pub fn diff_from(&self, other: &UtxoSet) -> UtxoSetResult<UtxoDiff> {
        match self {
            UtxoSet::Full(set) => set.diff_from(other),
            UtxoSet::Diff(set) => set.diff_from(other),
        }
    }

    pub fn with_diff(&self, diff: &UtxoDiff) -> UtxoSetResult<DiffUtxoSet> {
        match self {
            UtxoSet::Full(set) => Ok(set.with_diff(diff)),
            UtxoSet::Diff(set) => set.with_diff(diff),
        }
    }

    /// Returns a diff set over this set with `transactions` applied in order at `block_blue_score`.
    /// A transaction with missing inputs fails the whole operation, unless `ignore_double_spends`
    /// is set in which case it is skipped
    pub fn with_transactions(
        &self,
        transactions: &[Transaction],
        block_blue_score: u64,
        ignore_double_spends: bool,
    ) -> UtxoSetResult<DiffUtxoSet> {
        let mut diff_set = self.with_diff(&UtxoDiff::default())?;
        for transaction in transactions {
            let accepted = diff_set.add_transaction(transaction, block_blue_score)?;
            if !accepted && !ignore_double_spends {
                return Err(UtxoSetError::TransactionNotAccepted(transaction.id()));
            }
        }
        Ok(diff_set)
    }
}

impl From<Arc<FullUtxoSet>> for UtxoSet {
    fn from(set: Arc<FullUtxoSet>) -> Self {
        UtxoSet::Full(set)
    }
}

impl From<DiffUtxoSet> for UtxoSet {
    fn from(set: DiffUtxoSet) -> Self {
        UtxoSet::Diff(set)
    }
}
