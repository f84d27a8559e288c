//! Bounded LRU caches for parsed entities.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use wordnet_types::Pos;

/// Address of a cached entity: where its line starts in a file, or the
/// normalized text it was looked up by.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum CacheKey {
    ByOffset { pos: Pos, offset: usize },
    ByKey { text: String, pos: Pos },
}

/// Fixed-capacity map evicting the least recently used entry.
///
/// Values come back by clone, so callers store cheap handles (`Arc<_>`).
/// A capacity of zero disables the cache entirely.
pub struct EntityCache<V> {
    inner: Option<Mutex<LruCache<CacheKey, V>>>,
}

impl<V: Clone> EntityCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        self.inner.as_ref()?.lock().get(key).cloned()
    }

    pub fn put(&self, key: CacheKey, value: V) {
        if let Some(inner) = &self.inner {
            inner.lock().put(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner
            .as_ref()
            .map_or(0, |inner| inner.lock().cap().get())
    }
}
