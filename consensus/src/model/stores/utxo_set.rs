use super::codec_to_store_error;
use std::sync::Arc;
use utxodag_consensus_core::{
    codec::utxo::{outpoint_from_key, outpoint_key, utxo_entry_from_bytes, utxo_entry_to_bytes},
    tx::{TransactionOutpoint, UtxoEntry},
    utxo::utxo_diff::ImmutableUtxoDiff,
};
use utxodag_database::{
    prelude::{BatchDbWriter, DB, DbAccess, DbWriter, StoreResult},
    registry::DatabaseStorePrefixes,
};

pub trait UtxoSetStoreReader {
    fn get(&self, outpoint: &TransactionOutpoint) -> StoreResult<UtxoEntry>;
    fn has(&self, outpoint: &TransactionOutpoint) -> StoreResult<bool>;
}

pub trait UtxoSetStore: UtxoSetStoreReader {
    /// Updates the store according to the UTXO diff -- deleting removed entries and then adding
    /// added entries, so an outpoint present in both ends up holding the added entry
    fn write_diff(&self, writer: impl DbWriter, utxo_diff: &impl ImmutableUtxoDiff) -> StoreResult<()>;
    fn insert(&self, writer: impl DbWriter, outpoint: &TransactionOutpoint, entry: &UtxoEntry) -> StoreResult<()>;
    fn delete(&self, writer: impl DbWriter, outpoint: &TransactionOutpoint) -> StoreResult<()>;
}

/// A DB implementation of the UTXO set store. Keys are outpoint keys and values are
/// serialized UTXO entries. Caching is the responsibility of the set built on top.
#[derive(Clone)]
pub struct DbUtxoSetStore {
    db: Arc<DB>,
    access: DbAccess,
}

impl DbUtxoSetStore {
    pub fn new(db: Arc<DB>) -> Self {
        Self::with_prefix(db, DatabaseStorePrefixes::VirtualUtxoset.into())
    }

    pub fn with_prefix(db: Arc<DB>, prefix: Vec<u8>) -> Self {
        Self { db: Arc::clone(&db), access: DbAccess::new(db, prefix) }
    }

    pub fn db(&self) -> &Arc<DB> {
        &self.db
    }

    /// A cursor over all UTXOs in outpoint key order
    pub fn iterator(&self) -> impl Iterator<Item = StoreResult<(TransactionOutpoint, UtxoEntry)>> + '_ {
        self.access.iterator().map(|iter_result| {
            let (key, value) = iter_result?;
            let outpoint = outpoint_from_key(&key).map_err(codec_to_store_error)?;
            let entry = utxo_entry_from_bytes(&value).map_err(codec_to_store_error)?;
            Ok((outpoint, entry))
        })
    }

    /// Clear the store completely in a single atomic write
    pub fn clear(&self) -> StoreResult<()> {
        let mut batch = rocksdb::WriteBatch::default();
        self.access.delete_all(BatchDbWriter::new(&mut batch))?;
        self.db.write(batch)?;
        Ok(())
    }
}

impl UtxoSetStoreReader for DbUtxoSetStore {
    fn get(&self, outpoint: &TransactionOutpoint) -> StoreResult<UtxoEntry> {
        self.access.read(outpoint_key(outpoint), |bytes| utxo_entry_from_bytes(bytes).map_err(codec_to_store_error))
    }

    fn has(&self, outpoint: &TransactionOutpoint) -> StoreResult<bool> {
        self.access.has(outpoint_key(outpoint))
    }
}

impl UtxoSetStore for DbUtxoSetStore {
    fn write_diff(&self, mut writer: impl DbWriter, utxo_diff: &impl ImmutableUtxoDiff) -> StoreResult<()> {
        for outpoint in utxo_diff.removed().keys() {
            self.access.delete(&mut writer, outpoint_key(outpoint))?;
        }
        for (outpoint, entry) in utxo_diff.added().iter() {
            self.insert(&mut writer, outpoint, entry)?;
        }
        Ok(())
    }

    fn insert(&self, writer: impl DbWriter, outpoint: &TransactionOutpoint, entry: &UtxoEntry) -> StoreResult<()> {
        let bytes = utxo_entry_to_bytes(entry).map_err(codec_to_store_error)?;
        self.access.write(writer, outpoint_key(outpoint), bytes)
    }

    fn delete(&self, writer: impl DbWriter, outpoint: &TransactionOutpoint) -> StoreResult<()> {
        self.access.delete(writer, outpoint_key(outpoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utxodag_consensus_core::{
        tx::{ScriptPublicKey, TransactionId},
        utxo::utxo_diff::UtxoDiff,
    };
    use utxodag_database::{
        create_temp_db,
        prelude::{ConnBuilder, DirectDbWriter, StoreError, StoreResultExtensions},
    };

    fn outpoint(word: u64, index: u32) -> TransactionOutpoint {
        TransactionOutpoint::new(TransactionId::from_u64_word(word), index)
    }

    fn entry(amount: u64, blue_score: u64) -> UtxoEntry {
        UtxoEntry::new(amount, ScriptPublicKey::default(), blue_score, false)
    }

    #[test]
    fn test_write_diff_and_iterate() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let store = DbUtxoSetStore::new(db.clone());

        store.insert(DirectDbWriter::new(&db), &outpoint(1, 0), &entry(10, 0)).unwrap();
        store.insert(DirectDbWriter::new(&db), &outpoint(1, 1), &entry(11, 0)).unwrap();
        assert!(store.has(&outpoint(1, 0)).unwrap());
        assert_eq!(store.get(&outpoint(1, 1)).unwrap(), entry(11, 0));
        assert!(store.get(&outpoint(9, 9)).optional().unwrap().is_none());

        // Update one entry, spend another and create a new one
        let mut diff = UtxoDiff::default();
        diff.remove.insert(outpoint(1, 0), entry(10, 0));
        diff.add.insert(outpoint(1, 0), entry(10, 4));
        diff.remove.insert(outpoint(1, 1), entry(11, 0));
        diff.add.insert(outpoint(2, 256), entry(20, 4));
        let mut batch = rocksdb::WriteBatch::default();
        store.write_diff(BatchDbWriter::new(&mut batch), &diff).unwrap();
        db.write(batch).unwrap();

        let all = store.iterator().collect::<StoreResult<Vec<_>>>().unwrap();
        assert_eq!(all, vec![(outpoint(1, 0), entry(10, 4)), (outpoint(2, 256), entry(20, 4))]);

        store.clear().unwrap();
        assert_eq!(store.iterator().count(), 0);
    }

    #[test]
    fn test_corrupted_record() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let store = DbUtxoSetStore::new(db.clone());
        let access = DbAccess::new(db.clone(), DatabaseStorePrefixes::VirtualUtxoset.into());
        access.write(DirectDbWriter::new(&db), outpoint_key(&outpoint(1, 0)), [1, 2, 3]).unwrap();
        assert!(matches!(store.get(&outpoint(1, 0)), Err(StoreError::CodecError(_))));
    }
}
