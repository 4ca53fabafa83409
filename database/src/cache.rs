use indexmap::IndexMap;
use log::debug;
use parking_lot::RwLock;
use rand::Rng;
use std::{collections::hash_map::RandomState, hash::BuildHasher, sync::Arc};
use utxodag_utils::mem_size::MemSizeEstimator;

/// What to do once a tracked cache crosses its size bound
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Wipe the whole cache and start over
    #[default]
    Clear,
    /// Drop random entries until the cache fits its bound again
    Random,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CachePolicy {
    /// No caching at all
    Empty,
    /// Bounded by item count, evicting random entries
    Count(usize),
    /// Bounded by the estimated deep byte size of the cached data
    Tracked { max_size: usize, eviction: EvictionPolicy },
}

impl CachePolicy {
    fn is_empty(&self) -> bool {
        matches!(self, CachePolicy::Empty | CachePolicy::Count(0) | CachePolicy::Tracked { max_size: 0, .. })
    }
}

struct Inner<TKey, TData, S = RandomState>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync + MemSizeEstimator,
{
    // We use IndexMap and not HashMap because it makes it cheaper to remove a random element when the cache is full.
    map: IndexMap<TKey, TData, S>,
    tracked_size: usize,
}

impl<TKey, TData, S> Inner<TKey, TData, S>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync + MemSizeEstimator,
    S: BuildHasher + Default,
{
    fn new(prealloc: usize) -> Self {
        Self { map: IndexMap::with_capacity_and_hasher(prealloc, S::default()), tracked_size: 0 }
    }

    fn clear(&mut self) {
        self.map.clear();
        self.tracked_size = 0;
    }
}

/// A concurrent in-memory cache with a pluggable bound and eviction policy. Cloning
/// the cache yields another handle to the same underlying data.
#[derive(Clone)]
pub struct Cache<TKey, TData, S = RandomState>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync + MemSizeEstimator,
{
    inner: Arc<RwLock<Inner<TKey, TData, S>>>,
    policy: CachePolicy,
}

impl<TKey, TData, S> Cache<TKey, TData, S>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync + MemSizeEstimator,
    S: BuildHasher + Default,
{
    pub fn new(policy: CachePolicy) -> Self {
        let prealloc = match policy {
            // Use `size + 1` for not triggering a realloc if new element exactly overflows capacity
            CachePolicy::Count(max_items) => max_items + 1,
            CachePolicy::Empty | CachePolicy::Tracked { .. } => 0,
        };
        Self { inner: Arc::new(RwLock::new(Inner::new(prealloc))), policy }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn get(&self, key: &TKey) -> Option<TData> {
        self.inner.read().map.get(key).cloned()
    }

    pub fn contains_key(&self, key: &TKey) -> bool {
        self.inner.read().map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().map.is_empty()
    }

    /// The current estimated byte size of the cached data. Always zero for non-tracked policies
    pub fn tracked_size(&self) -> usize {
        self.inner.read().tracked_size
    }

    fn insert_impl(&self, inner: &mut Inner<TKey, TData, S>, key: TKey, data: TData) {
        match self.policy {
            CachePolicy::Empty => {}
            CachePolicy::Count(max_items) => {
                if inner.map.len() == max_items && !inner.map.contains_key(&key) {
                    inner.map.swap_remove_index(rand::thread_rng().gen_range(0..max_items));
                }
                inner.map.insert(key, data);
            }
            CachePolicy::Tracked { max_size, eviction } => {
                inner.tracked_size += data.estimate_mem_bytes();
                if let Some(removed) = inner.map.insert(key, data) {
                    inner.tracked_size = inner.tracked_size.saturating_sub(removed.estimate_mem_bytes());
                }
                if inner.tracked_size <= max_size {
                    return;
                }
                match eviction {
                    EvictionPolicy::Clear => {
                        debug!("Cache size estimate {} crossed the bound of {} bytes, clearing {} entries", inner.tracked_size, max_size, inner.map.len());
                        inner.clear();
                    }
                    EvictionPolicy::Random => {
                        while inner.tracked_size > max_size {
                            let index = rand::thread_rng().gen_range(0..inner.map.len());
                            if let Some((_, v)) = inner.map.swap_remove_index(index) {
                                inner.tracked_size = inner.tracked_size.saturating_sub(v.estimate_mem_bytes());
                            }
                        }
                    }
                }
            }
        }
    }

    pub fn insert(&self, key: TKey, data: TData) {
        if self.policy.is_empty() {
            return;
        }
        let mut write_guard = self.inner.write();
        self.insert_impl(&mut write_guard, key, data);
    }

    pub fn insert_many(&self, iter: &mut impl Iterator<Item = (TKey, TData)>) {
        if self.policy.is_empty() {
            return;
        }
        let mut write_guard = self.inner.write();
        for (key, data) in iter {
            self.insert_impl(&mut write_guard, key, data);
        }
    }

    fn remove_impl(&self, inner: &mut Inner<TKey, TData, S>, key: &TKey) -> Option<TData> {
        let data = inner.map.swap_remove(key)?;
        if let CachePolicy::Tracked { .. } = self.policy {
            inner.tracked_size = inner.tracked_size.saturating_sub(data.estimate_mem_bytes());
        }
        Some(data)
    }

    pub fn remove(&self, key: &TKey) -> Option<TData> {
        if self.policy.is_empty() {
            return None;
        }
        let mut write_guard = self.inner.write();
        self.remove_impl(&mut write_guard, key)
    }

    pub fn remove_many(&self, key_iter: &mut impl Iterator<Item = TKey>) {
        if self.policy.is_empty() {
            return;
        }
        let mut write_guard = self.inner.write();
        for key in key_iter {
            self.remove_impl(&mut write_guard, &key);
        }
    }

    pub fn remove_all(&self) {
        if self.policy.is_empty() {
            return;
        }
        self.inner.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Blob(usize);

    impl MemSizeEstimator for Blob {
        fn estimate_mem_bytes(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn test_tracked_clear_wipes_everything() {
        let cache: Cache<u32, Blob> = Cache::new(CachePolicy::Tracked { max_size: 100, eviction: EvictionPolicy::Clear });
        for i in 0..4 {
            cache.insert(i, Blob(25));
        }
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.tracked_size(), 100);

        // Overwriting an entry replaces its tracked size
        cache.insert(0, Blob(20));
        assert_eq!(cache.tracked_size(), 95);

        cache.insert(9, Blob(6));
        assert!(cache.is_empty());
        assert_eq!(cache.tracked_size(), 0);

        cache.insert(1, Blob(10));
        assert_eq!(cache.remove(&1).map(|b| b.0), Some(10));
        assert_eq!(cache.tracked_size(), 0);
    }

    #[test]
    fn test_tracked_random_stays_bounded() {
        let cache: Cache<u32, Blob> = Cache::new(CachePolicy::Tracked { max_size: 100, eviction: EvictionPolicy::Random });
        for i in 0..50 {
            cache.insert(i, Blob(10));
            assert!(cache.tracked_size() <= 100);
        }
        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn test_count_and_empty_policies() {
        let cache: Cache<u32, u64> = Cache::new(CachePolicy::Count(3));
        cache.insert_many(&mut (0..10).map(|i| (i, i as u64)));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.tracked_size(), 0);
        cache.remove_all();
        assert!(cache.is_empty());

        let cache: Cache<u32, u64> = Cache::new(CachePolicy::Empty);
        cache.insert(1, 1);
        assert!(!cache.contains_key(&1));
        assert_eq!(cache.get(&1), None);
    }
}
