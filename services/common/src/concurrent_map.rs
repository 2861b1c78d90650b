use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;

/// Key/value map safe for concurrent reads and writes
///
/// A bare building block: no eviction, no expiry. Reads hand out clones so
/// callers never hold the lock beyond the call.
#[derive(Debug)]
pub struct ConcurrentMap<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> ConcurrentMap<K, V>
where
    K: Eq + Hash,
{
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a value, returning the previous one
    pub fn set(&self, key: K, value: V) -> Option<V> {
        self.inner.write().insert(key, value)
    }

    /// Insert only if the key is not present yet
    ///
    /// Returns `true` when the value was inserted.
    pub fn set_if_absent(&self, key: K, value: V) -> bool {
        let mut inner = self.inner.write();
        if inner.contains_key(&key) {
            return false;
        }
        inner.insert(key, value);
        true
    }

    /// Remove a key, returning its value if it was present
    pub fn delete(&self, key: &K) -> Option<V> {
        self.inner.write().remove(key)
    }

    pub fn has_key(&self, key: &K) -> bool {
        self.inner.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl<K, V> ConcurrentMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Clone of the value stored under `key`
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.read().get(key).cloned()
    }

    /// All keys, in unspecified order
    pub fn keys(&self) -> Vec<K> {
        self.inner.read().keys().cloned().collect()
    }

    /// All values, in unspecified order
    pub fn values(&self) -> Vec<V> {
        self.inner.read().values().cloned().collect()
    }

    /// Independent copy of the whole map
    pub fn snapshot(&self) -> HashMap<K, V> {
        self.inner.read().clone()
    }
}

impl<K, V> Default for ConcurrentMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_set_and_get() {
        let map = ConcurrentMap::new();
        assert_eq!(map.set("key1", 42), None);
        assert_eq!(map.get(&"key1"), Some(42));
        assert_eq!(map.set("key1", 43), Some(42));
    }

    #[test]
    fn test_get_missing_key() {
        let map = ConcurrentMap::<&str, i32>::new();
        assert_eq!(map.get(&"unknown"), None);
    }

    #[test]
    fn test_delete() {
        let map = ConcurrentMap::new();
        map.set("key2", 99);
        assert_eq!(map.delete(&"key2"), Some(99));
        assert!(!map.has_key(&"key2"));
        assert_eq!(map.delete(&"key2"), None);
    }

    #[test]
    fn test_has_key() {
        let map = ConcurrentMap::new();
        map.set("key3", 88);
        assert!(map.has_key(&"key3"));
        assert!(!map.has_key(&"key4"));
    }

    #[test]
    fn test_set_if_absent() {
        let map = ConcurrentMap::new();
        assert!(map.set_if_absent("bucket", 1));
        assert!(!map.set_if_absent("bucket", 2));
        assert_eq!(map.get(&"bucket"), Some(1));
    }

    #[test]
    fn test_keys_and_values() {
        let map = ConcurrentMap::new();
        map.set("one", 1);
        map.set("two", 2);

        let mut keys = map.keys();
        keys.sort_unstable();
        assert_eq!(keys, vec!["one", "two"]);

        let mut values = map.values();
        values.sort_unstable();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let map = ConcurrentMap::new();
        map.set("a", 1);

        let mut copy = map.snapshot();
        copy.insert("b", 2);
        map.set("c", 3);

        assert_eq!(copy.len(), 2);
        assert!(!copy.contains_key("c"));
        assert_eq!(map.len(), 2);
        assert!(!map.has_key(&"b"));
    }

    #[test]
    fn test_concurrent_set_and_get() {
        let map = Arc::new(ConcurrentMap::new());
        let n = 100;

        let handles: Vec<_> = (0..n)
            .flat_map(|i| {
                let writer = Arc::clone(&map);
                let reader = Arc::clone(&map);
                [
                    thread::spawn(move || {
                        writer.set(i, i * 10);
                    }),
                    thread::spawn(move || {
                        let _ = reader.get(&i);
                    }),
                ]
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(map.len(), n);
        assert_eq!(map.get(&7), Some(70));
    }
}
