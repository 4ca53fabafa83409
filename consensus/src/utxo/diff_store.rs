use std::{
    collections::{HashMap, HashSet, hash_map::Entry},
    sync::Arc,
};

use crate::{
    errors::UtxoSetResult,
    model::stores::{
        blue_scores::BlueScoreStoreReader,
        utxo_diffs::{DbUtxoDiffsStore, UtxoDiffsStore, UtxoDiffsStoreReader},
    },
};
use rocksdb::WriteBatch;
use utxodag_consensus_core::{
    config::params::Params,
    utxo::{utxo_diff::UtxoDiff, utxo_diff_data::UtxoDiffData},
};
use utxodag_core::{debug, trace};
use utxodag_database::{
    prelude::{BatchDbWriter, DB, DbKey, DbWriter, StoreError, StoreResultExtensions},
    registry::DatabaseStorePrefixes,
};
use utxodag_hashes::Hash;
use utxodag_utils::sync::priority::PriorityRwLock;

#[derive(Default)]
struct Inner {
    loaded: HashMap<Hash, UtxoDiffData>,
    dirty: HashSet<Hash>,
}

/// Keeps, per block, the diff leading from its UTXO state towards the state of its diff child.
/// Records of blocks near the virtual are kept in memory while all records persist in storage.
///
/// Validation-path calls take the high-priority side of the lock, while removals and window
/// trimming queue behind them on the low-priority side.
pub struct UtxoDiffStore {
    db_store: DbUtxoDiffsStore,
    blue_scores: Arc<dyn BlueScoreStoreReader + Send + Sync>,
    params: Params,
    inner: PriorityRwLock<Inner>,
}

impl UtxoDiffStore {
    pub fn new(db: Arc<DB>, blue_scores: Arc<dyn BlueScoreStoreReader + Send + Sync>, params: &Params) -> Self {
        Self { db_store: DbUtxoDiffsStore::new(db), blue_scores, params: params.clone(), inner: Default::default() }
    }

    /// Sets the diff of `block`, keeping its diff child if one was assigned
    pub fn set_diff(&self, block: Hash, diff: UtxoDiff) -> UtxoSetResult<()> {
        let mut inner = self.inner.high_priority_write();
        match self.load(&mut inner, block)? {
            Some(data) => data.diff = diff,
            None => {
                inner.loaded.insert(block, UtxoDiffData::new(diff, None));
            }
        }
        inner.dirty.insert(block);
        Ok(())
    }

    /// Assigns the diff child of `block`, which must already have a recorded diff
    pub fn set_diff_child(&self, block: Hash, diff_child: Hash) -> UtxoSetResult<()> {
        let mut inner = self.inner.high_priority_write();
        let data = self.load(&mut inner, block)?.ok_or_else(|| Self::not_found(block))?;
        data.diff_child = Some(diff_child);
        inner.dirty.insert(block);
        Ok(())
    }

    pub fn diff_by_block(&self, block: Hash) -> UtxoSetResult<UtxoDiff> {
        Ok(self.diff_data(block)?.diff)
    }

    pub fn diff_child_by_block(&self, block: Hash) -> UtxoSetResult<Option<Hash>> {
        Ok(self.diff_data(block)?.diff_child)
    }

    pub fn diff_data(&self, block: Hash) -> UtxoSetResult<UtxoDiffData> {
        if let Some(data) = self.inner.high_priority_read().loaded.get(&block) {
            return Ok(data.clone());
        }
        let mut inner = self.inner.high_priority_write();
        Ok(self.load(&mut inner, block)?.ok_or_else(|| Self::not_found(block))?.clone())
    }

    pub fn has_diff_data(&self, block: Hash) -> UtxoSetResult<bool> {
        if self.inner.high_priority_read().loaded.contains_key(&block) {
            return Ok(true);
        }
        Ok(self.db_store.has(block)?)
    }

    /// Deletes the records of `blocks` from storage and then from memory
    pub fn remove_blocks_diff_data(&self, blocks: &[Hash]) -> UtxoSetResult<()> {
        self.remove_blocks_with(blocks, |blocks| {
            let mut batch = WriteBatch::default();
            let mut writer = BatchDbWriter::new(&mut batch);
            for block in blocks {
                self.db_store.delete(&mut writer, *block)?;
            }
            self.db_store.db().write(batch).map_err(StoreError::DbError)?;
            Ok(())
        })
    }

    /// Runs `delete` over `blocks` under the low-priority lock and unloads the records only once it succeeded
    fn remove_blocks_with(&self, blocks: &[Hash], delete: impl FnOnce(&[Hash]) -> UtxoSetResult<()>) -> UtxoSetResult<()> {
        let mut inner = self.inner.low_priority_write();
        delete(blocks)?;
        for block in blocks {
            inner.loaded.remove(block);
            inner.dirty.remove(block);
        }
        trace!("Removed diff data of {} blocks", blocks.len());
        Ok(())
    }

    /// Writes every dirty record through `writer`. Dirty marks are kept until
    /// [`Self::clear_dirty_entries`] is called once the write was committed. Blocks must not
    /// be removed between this call and that commit
    pub fn flush_to_storage(&self, mut writer: impl DbWriter) -> UtxoSetResult<()> {
        let inner = self.inner.high_priority_read();
        for block in inner.dirty.iter() {
            let data = inner
                .loaded
                .get(block)
                .ok_or_else(|| StoreError::DataInconsistency(format!("dirty diff data of {block} is not loaded")))?;
            self.db_store.insert(&mut writer, *block, data)?;
        }
        debug!("Flushed {} diff data records", inner.dirty.len());
        Ok(())
    }

    pub fn clear_dirty_entries(&self) {
        self.inner.high_priority_write().dirty.clear();
    }

    /// Unloads records whose block blue score fell out of the keep-loaded window behind
    /// `virtual_blue_score`. Records of `virtual_parents` and unflushed records stay loaded
    pub fn clear_old_entries(&self, virtual_blue_score: u64, virtual_parents: &[Hash]) -> UtxoSetResult<()> {
        let mut inner = self.inner.low_priority_write();
        let mut evicted = Vec::new();
        for block in inner.loaded.keys() {
            if virtual_parents.contains(block) || inner.dirty.contains(block) {
                continue;
            }
            if !self.params.is_within_loaded_window(self.blue_scores.get_blue_score(*block)?, virtual_blue_score) {
                evicted.push(*block);
            }
        }
        for block in evicted.iter() {
            inner.loaded.remove(block);
        }
        trace!("Unloaded {} diff data records behind virtual blue score {}", evicted.len(), virtual_blue_score);
        Ok(())
    }

    pub fn loaded_count(&self) -> usize {
        self.inner.high_priority_read().loaded.len()
    }

    /// Returns the record of `block`, loading it from storage if it is not in memory. Storage is
    /// read under the caller's write guard so a concurrent removal or unload cannot interleave
    fn load<'a>(&self, inner: &'a mut Inner, block: Hash) -> UtxoSetResult<Option<&'a mut UtxoDiffData>> {
        match inner.loaded.entry(block) {
            Entry::Occupied(e) => Ok(Some(e.into_mut())),
            Entry::Vacant(e) => match self.db_store.get(block).optional()? {
                Some(data) => {
                    trace!("Loaded diff data of {} from storage", block);
                    Ok(Some(e.insert(data)))
                }
                None => Ok(None),
            },
        }
    }

    fn not_found(block: Hash) -> StoreError {
        StoreError::KeyNotFound(DbKey::new(&[DatabaseStorePrefixes::UtxoDiffs as u8], block.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::UtxoSetError, model::stores::blue_scores::MemoryBlueScoreStore, utxo::tests_util::*};
    use std::thread;
    use utxodag_database::{
        create_temp_db,
        prelude::{ConnBuilder, DirectDbWriter},
    };

    fn block(word: u64) -> Hash {
        Hash::from_u64_word(word)
    }

    fn diff_adding(word: u64) -> UtxoDiff {
        let mut diff = UtxoDiff::default();
        diff.add.insert(outpoint(word, 0), entry(word, word));
        diff
    }

    fn flush(store: &UtxoDiffStore, db: &Arc<DB>) {
        let mut batch = WriteBatch::default();
        store.flush_to_storage(BatchDbWriter::new(&mut batch)).unwrap();
        db.write(batch).unwrap();
        store.clear_dirty_entries();
    }

    #[test]
    fn test_set_flush_and_reload() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let blue_scores = Arc::new(MemoryBlueScoreStore::new());
        let store = UtxoDiffStore::new(db.clone(), blue_scores.clone(), &Params::default());

        // A diff child can only be assigned to a block with a recorded diff
        assert!(matches!(store.set_diff_child(block(1), block(2)), Err(UtxoSetError::Store(StoreError::KeyNotFound(_)))));
        assert!(matches!(store.diff_by_block(block(1)), Err(UtxoSetError::Store(StoreError::KeyNotFound(_)))));

        store.set_diff(block(1), diff_adding(1)).unwrap();
        store.set_diff_child(block(1), block(2)).unwrap();
        store.set_diff(block(2), diff_adding(2)).unwrap();
        assert!(!DbUtxoDiffsStore::new(db.clone()).has(block(1)).unwrap());
        flush(&store, &db);

        // A fresh store reads the records back from storage
        let reloaded = UtxoDiffStore::new(db.clone(), blue_scores, &Params::default());
        assert_eq!(reloaded.loaded_count(), 0);
        assert!(reloaded.has_diff_data(block(1)).unwrap());
        assert_eq!(reloaded.diff_by_block(block(1)).unwrap(), diff_adding(1));
        assert_eq!(reloaded.diff_child_by_block(block(1)).unwrap(), Some(block(2)));
        assert_eq!(reloaded.diff_child_by_block(block(2)).unwrap(), None);
        assert_eq!(reloaded.loaded_count(), 2);

        // Replacing the diff keeps the persisted diff child
        let reloaded = UtxoDiffStore::new(db.clone(), Arc::new(MemoryBlueScoreStore::new()), &Params::default());
        reloaded.set_diff(block(1), diff_adding(3)).unwrap();
        assert_eq!(reloaded.diff_data(block(1)).unwrap(), UtxoDiffData::new(diff_adding(3), Some(block(2))));
    }

    #[test]
    fn test_remove_blocks_diff_data() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let store = UtxoDiffStore::new(db.clone(), Arc::new(MemoryBlueScoreStore::new()), &Params::default());
        for i in 1..=3 {
            store.set_diff(block(i), diff_adding(i)).unwrap();
        }
        flush(&store, &db);

        store.remove_blocks_diff_data(&[block(1), block(2)]).unwrap();
        assert!(!store.has_diff_data(block(1)).unwrap());
        assert!(!store.has_diff_data(block(2)).unwrap());
        assert!(store.has_diff_data(block(3)).unwrap());
        assert_eq!(store.loaded_count(), 1);

        // Removed records are not resurrected by a later flush
        store.set_diff(block(4), diff_adding(4)).unwrap();
        flush(&store, &db);
        let on_disk = DbUtxoDiffsStore::new(db.clone()).iterator().map(|r| r.unwrap().0).collect::<HashSet<_>>();
        assert_eq!(on_disk, HashSet::from([block(3), block(4)]));
    }

    #[test]
    fn test_clear_old_entries() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let blue_scores = Arc::new(MemoryBlueScoreStore::new());
        let store = UtxoDiffStore::new(db.clone(), blue_scores.clone(), &Params::default());
        for (i, blue_score) in [(1, 10), (2, 99), (3, 100), (4, 150)] {
            blue_scores.insert(block(i), blue_score);
            store.set_diff(block(i), diff_adding(i)).unwrap();
        }

        // Unflushed records are never unloaded
        store.clear_old_entries(200, &[]).unwrap();
        assert_eq!(store.loaded_count(), 4);

        flush(&store, &db);
        store.clear_old_entries(200, &[block(1)]).unwrap();
        assert_eq!(store.loaded_count(), 3);
        assert!(store.has_diff_data(block(2)).unwrap(), "unloaded records remain in storage");

        // Unloaded records are transparently loaded again
        assert_eq!(store.diff_by_block(block(2)).unwrap(), diff_adding(2));
        assert_eq!(store.loaded_count(), 4);

        // Blue score lookups of loaded blocks must succeed
        store.set_diff(block(9), diff_adding(9)).unwrap();
        flush(&store, &db);
        assert!(matches!(store.clear_old_entries(200, &[]), Err(UtxoSetError::Store(StoreError::KeyNotFound(_)))));
        assert_eq!(store.loaded_count(), 5);
    }

    #[test]
    fn test_concurrent_validation_and_trimming() {
        const BLOCKS: u64 = 200;
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let blue_scores = Arc::new(MemoryBlueScoreStore::new());
        let params = Params { max_blue_score_difference_to_keep_loaded: 10, ..Default::default() };
        let store = Arc::new(UtxoDiffStore::new(db.clone(), blue_scores.clone(), &params));
        for i in 0..BLOCKS {
            blue_scores.insert(block(i), i);
        }

        let writer = {
            let store = store.clone();
            let db = db.clone();
            thread::spawn(move || {
                for i in 0..BLOCKS {
                    store.set_diff(block(i), diff_adding(i)).unwrap();
                    if i > 0 {
                        store.set_diff_child(block(i - 1), block(i)).unwrap();
                    }
                    if i % 10 == 9 {
                        let mut batch = WriteBatch::default();
                        store.flush_to_storage(BatchDbWriter::new(&mut batch)).unwrap();
                        db.write(batch).unwrap();
                        store.clear_dirty_entries();
                    }
                }
            })
        };
        let trimmer = {
            let store = store.clone();
            thread::spawn(move || {
                for virtual_blue_score in 0..BLOCKS {
                    store.clear_old_entries(virtual_blue_score, &[]).unwrap();
                }
            })
        };
        writer.join().unwrap();
        trimmer.join().unwrap();

        store.flush_to_storage(DirectDbWriter::new(&db)).unwrap();
        store.clear_dirty_entries();
        for i in 0..BLOCKS {
            let expected_child = if i + 1 < BLOCKS { Some(block(i + 1)) } else { None };
            assert_eq!(store.diff_data(block(i)).unwrap(), UtxoDiffData::new(diff_adding(i), expected_child));
        }
    }

    #[test]
    fn test_failed_removal_keeps_records() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let store = UtxoDiffStore::new(db.clone(), Arc::new(MemoryBlueScoreStore::new()), &Params::default());
        store.set_diff(block(1), diff_adding(1)).unwrap();
        flush(&store, &db);
        store.set_diff_child(block(1), block(2)).unwrap();

        let result = store.remove_blocks_with(&[block(1)], |_| Err(StoreError::DataInconsistency("write rejected".to_string()).into()));
        assert!(matches!(result, Err(UtxoSetError::Store(StoreError::DataInconsistency(_)))));

        // The unflushed diff child is still loaded and dirty
        assert_eq!(store.loaded_count(), 1);
        flush(&store, &db);
        assert_eq!(DbUtxoDiffsStore::new(db.clone()).get(block(1)).unwrap(), UtxoDiffData::new(diff_adding(1), Some(block(2))));
    }

    #[test]
    fn test_concurrent_removal_is_never_undone() {
        const BLOCKS: u64 = 200;
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let blue_scores = Arc::new(MemoryBlueScoreStore::new());
        let params = Params { max_blue_score_difference_to_keep_loaded: 10, ..Default::default() };
        let store = Arc::new(UtxoDiffStore::new(db.clone(), blue_scores.clone(), &params));
        for i in 0..BLOCKS {
            blue_scores.insert(block(i), i);
            store.set_diff(block(i), diff_adding(i)).unwrap();
        }
        flush(&store, &db);
        store.clear_old_entries(BLOCKS + 100, &[]).unwrap();
        assert_eq!(store.loaded_count(), 0);

        // Odd blocks are linked to their successor while even blocks are removed
        let linker = {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..BLOCKS {
                    match store.set_diff_child(block(i), block(i + 1)) {
                        Ok(()) => {}
                        Err(UtxoSetError::Store(StoreError::KeyNotFound(_))) if i % 2 == 0 => {}
                        Err(err) => panic!("linking block {i} failed: {err}"),
                    }
                }
            })
        };
        let remover = {
            let store = store.clone();
            thread::spawn(move || {
                for i in (0..BLOCKS).step_by(2) {
                    store.remove_blocks_diff_data(&[block(i)]).unwrap();
                }
            })
        };
        let reader = {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..BLOCKS {
                    match store.diff_data(block(i)) {
                        Ok(_) => {}
                        Err(UtxoSetError::Store(StoreError::KeyNotFound(_))) if i % 2 == 0 => {}
                        Err(err) => panic!("reading block {i} failed: {err}"),
                    }
                    store.clear_old_entries(i, &[]).unwrap();
                }
            })
        };
        linker.join().unwrap();
        remover.join().unwrap();
        reader.join().unwrap();
        flush(&store, &db);

        for i in 0..BLOCKS {
            if i % 2 == 0 {
                assert!(!store.has_diff_data(block(i)).unwrap(), "removed block {i} was brought back");
            } else {
                assert_eq!(store.diff_data(block(i)).unwrap(), UtxoDiffData::new(diff_adding(i), Some(block(i + 1))));
            }
        }
        let on_disk = DbUtxoDiffsStore::new(db.clone()).iterator().map(|r| r.unwrap().0).collect::<HashSet<_>>();
        assert_eq!(on_disk, (1..BLOCKS).step_by(2).map(block).collect::<HashSet<_>>());
    }
}
