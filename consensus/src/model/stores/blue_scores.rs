use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use utxodag_database::{
    prelude::{DB, DbAccess, DbKey, DbWriter, StoreError, StoreResult},
    registry::DatabaseStorePrefixes,
};
use utxodag_hashes::Hash;

/// Read access to the blue score of known blocks. The diff store consults it when deciding
/// which records fall out of the loaded window.
pub trait BlueScoreStoreReader {
    fn get_blue_score(&self, hash: Hash) -> StoreResult<u64>;
}

pub trait BlueScoreStore: BlueScoreStoreReader {
    fn insert(&self, writer: impl DbWriter, hash: Hash, blue_score: u64) -> StoreResult<()>;
}

/// A DB implementation of `BlueScoreStore`, values are little-endian u64. This is append only
#[derive(Clone)]
pub struct DbBlueScoresStore {
    access: DbAccess,
}

impl DbBlueScoresStore {
    pub fn new(db: Arc<DB>) -> Self {
        Self { access: DbAccess::new(db, DatabaseStorePrefixes::BlueScores.into()) }
    }
}

impl BlueScoreStoreReader for DbBlueScoresStore {
    fn get_blue_score(&self, hash: Hash) -> StoreResult<u64> {
        self.access.read(hash.as_bytes(), |bytes| {
            let array: [u8; 8] =
                bytes.try_into().map_err(|_| StoreError::DataInconsistency(format!("blue score of unexpected length {}", bytes.len())))?;
            Ok(u64::from_le_bytes(array))
        })
    }
}

impl BlueScoreStore for DbBlueScoresStore {
    fn insert(&self, writer: impl DbWriter, hash: Hash, blue_score: u64) -> StoreResult<()> {
        if self.access.has(hash.as_bytes())? {
            return Err(StoreError::KeyAlreadyExists(hash.to_string()));
        }
        self.access.write(writer, hash.as_bytes(), blue_score.to_le_bytes())
    }
}

/// An in-memory blue score map, used where block metadata lives outside the database
#[derive(Default)]
pub struct MemoryBlueScoreStore {
    map: RwLock<HashMap<Hash, u64>>,
}

impl MemoryBlueScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, hash: Hash, blue_score: u64) {
        self.map.write().insert(hash, blue_score);
    }
}

impl BlueScoreStoreReader for MemoryBlueScoreStore {
    fn get_blue_score(&self, hash: Hash) -> StoreResult<u64> {
        self.map
            .read()
            .get(&hash)
            .copied()
            .ok_or_else(|| StoreError::KeyNotFound(DbKey::new(DatabaseStorePrefixes::BlueScores.as_ref(), hash.as_bytes())))
    }
}
