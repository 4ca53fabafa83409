use std::sync::Arc;

use super::{DB, codec_to_store_error};
use utxodag_consensus_core::{
    codec::utxo::{utxo_diff_data_from_bytes, utxo_diff_data_to_bytes},
    utxo::utxo_diff_data::UtxoDiffData,
};
use utxodag_database::{
    prelude::{DbAccess, DbWriter, StoreError, StoreResult},
    registry::DatabaseStorePrefixes,
};
use utxodag_hashes::Hash;

/// Store for holding the per-block diff data: the UTXO difference of a block relative to
/// its diff child, along with that child (if assigned). Records are overwritten whenever
/// the diff or the diff child of a block changes.
pub trait UtxoDiffsStoreReader {
    fn get(&self, hash: Hash) -> StoreResult<UtxoDiffData>;
    fn has(&self, hash: Hash) -> StoreResult<bool>;
}

pub trait UtxoDiffsStore: UtxoDiffsStoreReader {
    fn insert(&self, writer: impl DbWriter, hash: Hash, data: &UtxoDiffData) -> StoreResult<()>;
    fn delete(&self, writer: impl DbWriter, hash: Hash) -> StoreResult<()>;
}

/// A DB implementation of `UtxoDiffsStore`. In-memory retention is handled by the diff store
/// built on top of it.
#[derive(Clone)]
pub struct DbUtxoDiffsStore {
    db: Arc<DB>,
    access: DbAccess,
}

impl DbUtxoDiffsStore {
    pub fn new(db: Arc<DB>) -> Self {
        Self { db: Arc::clone(&db), access: DbAccess::new(db, DatabaseStorePrefixes::UtxoDiffs.into()) }
    }

    pub fn db(&self) -> &Arc<DB> {
        &self.db
    }

    /// A cursor over all persisted records in block hash order
    pub fn iterator(&self) -> impl Iterator<Item = StoreResult<(Hash, UtxoDiffData)>> + '_ {
        self.access.iterator().map(|iter_result| {
            let (key, value) = iter_result?;
            let hash = Hash::try_from_slice(&key)
                .ok_or_else(|| StoreError::DataInconsistency(format!("utxo diff key of unexpected length {}", key.len())))?;
            Ok((hash, utxo_diff_data_from_bytes(&value).map_err(codec_to_store_error)?))
        })
    }
}

impl UtxoDiffsStoreReader for DbUtxoDiffsStore {
    fn get(&self, hash: Hash) -> StoreResult<UtxoDiffData> {
        self.access.read(hash.as_bytes(), |bytes| utxo_diff_data_from_bytes(bytes).map_err(codec_to_store_error))
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        self.access.has(hash.as_bytes())
    }
}

impl UtxoDiffsStore for DbUtxoDiffsStore {
    fn insert(&self, writer: impl DbWriter, hash: Hash, data: &UtxoDiffData) -> StoreResult<()> {
        let bytes = utxo_diff_data_to_bytes(data).map_err(codec_to_store_error)?;
        self.access.write(writer, hash.as_bytes(), bytes)
    }

    fn delete(&self, writer: impl DbWriter, hash: Hash) -> StoreResult<()> {
        self.access.delete(writer, hash.as_bytes())
    }
}
