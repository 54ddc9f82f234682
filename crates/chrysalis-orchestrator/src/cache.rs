//! Translation cache
//!
//! Bounded LRU keyed by the content hash of the source document plus the
//! target framework. Eviction is deterministic: least recently used first.

use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};

use chrysalis_core::errors::Result;
use chrysalis_core::identifiers::FrameworkTag;
use chrysalis_core::model::{CanonicalAgent, NativeAgent};
use chrysalis_core::util::canonical_json_bytes;

/// Cache key: content hash of the source document plus the target
pub type CacheKey = (String, FrameworkTag);

/// Compute the cache key for a source/target pair
pub fn cache_key(source: &NativeAgent, target: &FrameworkTag) -> Result<CacheKey> {
    let bytes = canonical_json_bytes(&source.document)?;
    Ok((blake3::hash(&bytes).to_hex().to_string(), target.clone()))
}

/// Cached output of one translation
#[derive(Debug, Clone)]
pub struct CachedTranslation {
    /// The translated native agent
    pub output: NativeAgent,
    /// The canonical intermediate
    pub canonical: CanonicalAgent,
    /// Fidelity of the translation
    pub fidelity_score: f64,
    /// Warnings raised by the translation
    pub warnings: Vec<String>,
}

/// Hit/miss counters plus current size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that missed
    pub misses: u64,
    /// Entries currently cached
    pub entries: usize,
}

struct CacheInner {
    map: BTreeMap<CacheKey, CachedTranslation>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

/// Bounded LRU translation cache
pub struct TranslationCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl TranslationCache {
    /// Cache holding up to `capacity` translations
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner {
                map: BTreeMap::new(),
                order: VecDeque::new(),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Look up a translation, refreshing its recency on hit
    pub fn get(&self, key: &CacheKey) -> Option<CachedTranslation> {
        let mut inner = self.inner.lock();
        match inner.map.get(key).cloned() {
            Some(entry) => {
                inner.hits += 1;
                inner.order.retain(|k| k != key);
                inner.order.push_back(key.clone());
                Some(entry)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert a translation, evicting the least recently used on overflow
    pub fn insert(&self, key: CacheKey, value: CachedTranslation) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.map.insert(key.clone(), value).is_none() {
            inner.order.push_back(key);
        } else {
            inner.order.retain(|k| k != &key);
            inner.order.push_back(key);
        }
        while inner.map.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            }
        }
    }

    /// Drop every entry, keeping the counters
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.map.clear();
        inner.order.clear();
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.map.len(),
        }
    }
}
