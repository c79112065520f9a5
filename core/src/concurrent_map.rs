//! Key-sharded map with one lock per shard.
//!
//! Keys are integers and land in shard `key mod shard_count`, so workers touching
//! different documents (or terms) rarely contend. Handles returned by
//! [`ConcurrentMap::access`] and [`ConcurrentMap::get`] hold the shard lock for as
//! long as they live; nothing written through them is visible to other threads
//! before the handle is dropped.

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::BTreeMap;

mod sealed {
    pub trait Sealed {}
}

/// Integer keys usable in a [`ConcurrentMap`].
pub trait ShardKey: sealed::Sealed + Copy + Ord {
    fn shard_index(&self, shard_count: usize) -> usize;
}

macro_rules! impl_shard_key {
    ($($t:ty),*) => {$(
        impl sealed::Sealed for $t {}
        impl ShardKey for $t {
            #[inline]
            fn shard_index(&self, shard_count: usize) -> usize {
                (*self as i128).rem_euclid(shard_count as i128) as usize
            }
        }
    )*};
}

impl_shard_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

pub struct ConcurrentMap<K, V> {
    shards: Vec<RwLock<BTreeMap<K, V>>>,
}

impl<K: ShardKey, V> ConcurrentMap<K, V> {
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        Self { shards: (0..shard_count).map(|_| RwLock::new(BTreeMap::new())).collect() }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, key: &K) -> &RwLock<BTreeMap<K, V>> {
        &self.shards[key.shard_index(self.shards.len())]
    }

    /// Exclusive handle to the value under `key`, inserting a default first if absent.
    pub fn access(&self, key: K) -> MappedRwLockWriteGuard<'_, V>
    where
        V: Default,
    {
        RwLockWriteGuard::map(self.shard(&key).write(), |map| map.entry(key).or_default())
    }

    /// Shared handle to the value under `key`.
    pub fn get(&self, key: &K) -> Option<MappedRwLockReadGuard<'_, V>> {
        RwLockReadGuard::try_map(self.shard(key).read(), |map| map.get(key)).ok()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.shard(key).read().contains_key(key)
    }

    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.shard(&key).write().insert(key, value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.shard(key).write().remove(key)
    }

    /// Run `f` on the value under `key` and drop the entry when `f` returns true.
    /// Both steps happen under one acquisition of the shard lock.
    pub fn update_or_evict<F>(&self, key: &K, f: F) -> bool
    where
        F: FnOnce(&mut V) -> bool,
    {
        let mut shard = self.shard(key).write();
        let evict = match shard.get_mut(key) {
            Some(value) => f(value),
            None => return false,
        };
        if evict {
            shard.remove(key);
        }
        evict
    }

    /// Locks shards one at a time in index order.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move every entry into one ordered map, locking shards in index order.
    pub fn drain(&self) -> BTreeMap<K, V> {
        let mut merged = BTreeMap::new();
        for shard in &self.shards {
            let mut guard = shard.write();
            merged.append(&mut *guard);
        }
        merged
    }
}
