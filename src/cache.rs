use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// Compute-once cache for kernel matrices keyed by their configuration.
///
/// Values are built at most once per key, published behind an [`Arc`], and
/// shared read-only by every subsequent caller. The lock is held across the
/// build so concurrent first-use cannot race two constructions of the same
/// kernel.
pub(crate) struct Memo<K, V> {
    map: Mutex<HashMap<K, Arc<V>>>,
}

impl<K: Eq + Hash, V> Memo<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, building it on first use.
    pub(crate) fn get_or_build(&self, key: K, build: impl FnOnce() -> V) -> Arc<V> {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(key).or_insert_with(|| Arc::new(build())).clone()
    }
}
