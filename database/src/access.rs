use crate::{db::DB, errors::StoreError};

use super::prelude::{DbKey, DbWriter, StoreResult};
use rocksdb::{Direction, IteratorMode, ReadOptions};
use std::sync::Arc;

/// A concurrent DB store access over raw bytes, scoped to a single store prefix. Stores
/// built on top of it own the (de)serialization of their keys and values.
#[derive(Clone)]
pub struct DbAccess {
    db: Arc<DB>,

    // DB bucket/path
    prefix: Vec<u8>,
}

pub type KeyDataResult = Result<(Box<[u8]>, Box<[u8]>), StoreError>;

impl DbAccess {
    pub fn new(db: Arc<DB>, prefix: Vec<u8>) -> Self {
        Self { db, prefix }
    }

    pub fn has(&self, key: impl AsRef<[u8]>) -> StoreResult<bool> {
        Ok(self.db.get_pinned(DbKey::new(&self.prefix, key))?.is_some())
    }

    /// Reads the value stored under `key` and passes it to `deserialize`
    pub fn read<T, F>(&self, key: impl AsRef<[u8]>, deserialize: F) -> StoreResult<T>
    where
        F: FnOnce(&[u8]) -> StoreResult<T>,
    {
        let db_key = DbKey::new(&self.prefix, key);
        if let Some(slice) = self.db.get_pinned(&db_key)? { deserialize(&slice) } else { Err(StoreError::KeyNotFound(db_key)) }
    }

    pub fn write(&self, mut writer: impl DbWriter, key: impl AsRef<[u8]>, data: impl AsRef<[u8]>) -> StoreResult<()> {
        writer.put(DbKey::new(&self.prefix, key), data)?;
        Ok(())
    }

    pub fn delete(&self, mut writer: impl DbWriter, key: impl AsRef<[u8]>) -> StoreResult<()> {
        writer.delete(DbKey::new(&self.prefix, key))?;
        Ok(())
    }

    /// A cursor over all entries of this store in ascending key order. Yielded keys are
    /// stripped of the store prefix
    pub fn iterator(&self) -> impl Iterator<Item = KeyDataResult> + '_ {
        let prefix_key = DbKey::prefix_only(&self.prefix);
        let prefix_len = prefix_key.prefix_len();
        let mut read_opts = ReadOptions::default();
        read_opts.set_iterate_range(rocksdb::PrefixRange(prefix_key.as_ref()));
        self.db.iterator_opt(IteratorMode::From(prefix_key.as_ref(), Direction::Forward), read_opts).map(move |iter_result| {
            match iter_result {
                Ok((key, data_bytes)) => Ok((key[prefix_len..].into(), data_bytes)),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Deletes all entries of this store through the provided writer
    pub fn delete_all(&self, mut writer: impl DbWriter) -> StoreResult<()> {
        for item in self.iterator() {
            let (key, _) = item?;
            writer.delete(DbKey::new(&self.prefix, key))?;
        }
        Ok(())
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }
}
