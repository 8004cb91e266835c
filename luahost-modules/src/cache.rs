//! File caching

use luahost_core::FileLoader;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// LRU cache of file contents in front of another loader.
///
/// Only hits are cached; a name the inner loader cannot serve is asked for
/// again next time.
#[derive(Debug)]
pub struct CachingLoader<L> {
    inner: L,
    cache: Mutex<CacheInner>,
}

#[derive(Debug)]
struct CacheInner {
    files: FxHashMap<String, Arc<[u8]>>,
    max_size: usize,
    access_order: Vec<String>,
}

impl<L: FileLoader> CachingLoader<L> {
    /// Wrap `inner`, keeping at most `max_size` files; zero means unbounded
    pub fn new(inner: L, max_size: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(CacheInner {
                files: FxHashMap::default(),
                max_size,
                access_order: Vec::new(),
            }),
        }
    }

    /// The wrapped loader
    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Drop the cached copy of `name`
    pub fn invalidate(&self, name: &str) -> bool {
        let mut cache = self.cache.lock();
        cache.access_order.retain(|cached| cached != name);
        cache.files.remove(name).is_some()
    }

    /// Drop every cached file
    pub fn clear(&self) {
        let mut cache = self.cache.lock();
        cache.files.clear();
        cache.access_order.clear();
        debug!("Cleared file cache");
    }

    /// Number of cached files
    pub fn len(&self) -> usize {
        self.cache.lock().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cache.lock().files.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<Arc<[u8]>> {
        let mut cache = self.cache.lock();
        let bytes = cache.files.get(name).cloned()?;
        // Update access order for LRU
        cache.access_order.retain(|cached| cached != name);
        cache.access_order.push(name.to_string());
        Some(bytes)
    }

    fn insert(&self, name: &str, bytes: Arc<[u8]>) {
        let mut cache = self.cache.lock();
        if cache.files.contains_key(name) {
            return;
        }

        if cache.max_size > 0 && cache.files.len() >= cache.max_size {
            if let Some(oldest) = cache.access_order.first().cloned() {
                cache.files.remove(&oldest);
                cache.access_order.remove(0);
                debug!("Evicted {} from file cache", oldest);
            }
        }

        cache.files.insert(name.to_string(), bytes);
        cache.access_order.push(name.to_string());
    }
}

impl<L: FileLoader> FileLoader for CachingLoader<L> {
    fn load_file(&self, name: &str) -> Option<Vec<u8>> {
        if let Some(bytes) = self.get(name) {
            trace!("Cache hit for {}", name);
            return Some(bytes.to_vec());
        }

        trace!("Cache miss for {}", name);
        let bytes = self.inner.load_file(name)?;
        self.insert(name, Arc::from(bytes.as_slice()));
        Some(bytes)
    }
}
