//! Compute-once caches keyed by path.
//!
//! Every key owns its own [`OnceCell`]. The map lock is only held long
//! enough to fetch or create that cell, so the expensive computation runs
//! outside it: the first caller for a key computes, concurrent callers for
//! the same key block on the cell, and callers for other keys proceed
//! untouched. A failed computation leaves the cell empty so a later call
//! can retry.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub struct KeyedCache<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<Arc<V>>>>>,
    computed: AtomicUsize,
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
            computed: AtomicUsize::new(0),
        }
    }

    /// Cached value for `key`, if it has been computed
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Return the cached value for `key`, computing it with `init` on first use
    pub fn get_or_try_insert_with<E, F>(&self, key: &K, init: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cells.entry(key.clone()).or_default())
        };

        cell.get_or_try_init(|| {
            let value = init()?;
            self.computed.fetch_add(1, Ordering::Relaxed);
            Ok(Arc::new(value))
        })
        .map(Arc::clone)
    }

    /// Number of keys holding a value
    pub fn len(&self) -> usize {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.values().filter(|cell| cell.get().is_some()).count()
    }

    /// How many times a value was actually computed
    pub fn computed(&self) -> usize {
        self.computed.load(Ordering::Relaxed)
    }
}

impl<K, V> Default for KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
