use parking_lot::RwLock;
use thiserror::Error;

/// Errors returned by the collection primitives
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    #[error("index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("no element matched the predicate")]
    NotFound,
}

/// Growable sequence that can be shared between tasks without external locking
///
/// Two usage styles are supported:
/// - index-addressed: pre-size with [`ConcurrentVec::with_len`] and let each
///   writer fill its own slot through [`ConcurrentVec::set_at`], which keeps
///   results aligned with their inputs regardless of completion order;
/// - accumulator: start empty and [`ConcurrentVec::push`] in any order.
#[derive(Debug, Default)]
pub struct ConcurrentVec<T> {
    items: RwLock<Vec<T>>,
}

impl<T> ConcurrentVec<T> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    /// Create a collection holding `len` default-valued slots
    pub fn with_len(len: usize) -> Self
    where
        T: Default,
    {
        let mut items = Vec::with_capacity(len);
        items.resize_with(len, T::default);

        Self {
            items: RwLock::new(items),
        }
    }

    /// Append an item at the end
    pub fn push(&self, item: T) {
        self.items.write().push(item);
    }

    /// Overwrite the slot at `index`
    ///
    /// Never grows the collection. On error the contents are left untouched.
    pub fn set_at(&self, index: usize, item: T) -> Result<(), CollectionError> {
        let mut items = self.items.write();
        let len = items.len();

        match items.get_mut(index) {
            Some(slot) => {
                *slot = item;
                Ok(())
            }
            None => Err(CollectionError::OutOfRange { index, len }),
        }
    }

    /// Remove and return the first element matching `predicate`
    ///
    /// Elements after the removed one shift down by one index, so this must
    /// not race with index-addressed writers on the same collection.
    pub fn remove_first<F>(&self, predicate: F) -> Result<T, CollectionError>
    where
        F: Fn(&T) -> bool,
    {
        let mut items = self.items.write();

        let position = items
            .iter()
            .position(|item| predicate(item))
            .ok_or(CollectionError::NotFound)?;

        Ok(items.remove(position))
    }

    /// Number of elements currently held
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Consume the collection and return the backing vector
    pub fn into_inner(self) -> Vec<T> {
        self.items.into_inner()
    }
}

impl<T: Clone> ConcurrentVec<T> {
    /// Clone up to `limit` elements matching `predicate`, in order
    ///
    /// A `limit` of zero means no limit.
    pub fn filter_up_to<F>(&self, predicate: F, limit: usize) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        let items = self.items.read();
        let matching = items.iter().filter(|item| predicate(item)).cloned();

        if limit == 0 {
            matching.collect()
        } else {
            matching.take(limit).collect()
        }
    }

    /// Independent copy of the current contents
    pub fn snapshot(&self) -> Vec<T> {
        self.items.read().clone()
    }
}

impl<T> From<Vec<T>> for ConcurrentVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_is_empty() {
        let vec = ConcurrentVec::<i32>::new();
        assert!(vec.is_empty());
        assert_eq!(vec.len(), 0);
    }

    #[test]
    fn test_with_len_fills_default_slots() {
        let vec = ConcurrentVec::<String>::with_len(3);
        assert_eq!(vec.snapshot(), vec![String::new(), String::new(), String::new()]);

        let empty = ConcurrentVec::<u8>::with_len(0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_push_appends_in_order() {
        let vec = ConcurrentVec::new();
        vec.push(1);
        vec.push(2);
        assert_eq!(vec.snapshot(), vec![1, 2]);
    }

    #[test]
    fn test_set_at_overwrites_slot() {
        let vec = ConcurrentVec::with_len(3);
        vec.set_at(1, 42).unwrap();
        assert_eq!(vec.snapshot(), vec![0, 42, 0]);
    }

    #[test]
    fn test_set_at_out_of_range_leaves_contents() {
        let vec = ConcurrentVec::from(vec![1, 2, 3]);

        assert_eq!(
            vec.set_at(3, 9),
            Err(CollectionError::OutOfRange { index: 3, len: 3 })
        );
        assert_eq!(
            vec.set_at(usize::MAX, 9),
            Err(CollectionError::OutOfRange {
                index: usize::MAX,
                len: 3
            })
        );
        assert_eq!(vec.snapshot(), vec![1, 2, 3]);
    }

    #[test]
    fn test_set_at_on_empty_collection() {
        let vec = ConcurrentVec::<i32>::new();
        assert!(matches!(
            vec.set_at(0, 1),
            Err(CollectionError::OutOfRange { index: 0, len: 0 })
        ));
        assert!(vec.is_empty());
    }

    #[test]
    fn test_remove_first_only_removes_first_match() {
        let vec = ConcurrentVec::from(vec![1, 2, 3, 2]);

        assert_eq!(vec.remove_first(|x| *x == 2), Ok(2));
        assert_eq!(vec.snapshot(), vec![1, 3, 2]);
    }

    #[test]
    fn test_remove_first_not_found() {
        let vec = ConcurrentVec::from(vec![1, 3]);
        assert_eq!(vec.remove_first(|x| *x == 2), Err(CollectionError::NotFound));
        assert_eq!(vec.len(), 2);
    }

    #[test]
    fn test_filter_up_to_respects_limit_and_order() {
        let vec = ConcurrentVec::from(vec![1, 2, 3, 4, 5]);

        assert_eq!(vec.filter_up_to(|x| x % 2 == 1, 2), vec![1, 3]);
        assert_eq!(vec.filter_up_to(|x| x % 2 == 1, 10), vec![1, 3, 5]);
    }

    #[test]
    fn test_filter_up_to_zero_limit_is_unbounded() {
        let vec = ConcurrentVec::from(vec![1, 2, 3, 4, 5]);
        assert_eq!(vec.filter_up_to(|x| *x > 1, 0), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let vec = ConcurrentVec::from(vec![1, 2]);
        let mut copy = vec.snapshot();
        copy.push(3);
        vec.push(10);

        assert_eq!(copy, vec![1, 2, 3]);
        assert_eq!(vec.snapshot(), vec![1, 2, 10]);
    }

    #[test]
    fn test_concurrent_push() {
        let vec = Arc::new(ConcurrentVec::new());
        let n = 100;

        let handles: Vec<_> = (0..n)
            .map(|i| {
                let vec = Arc::clone(&vec);
                thread::spawn(move || vec.push(i))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let mut items = vec.snapshot();
        assert_eq!(items.len(), n);
        items.sort_unstable();
        assert_eq!(items, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn test_concurrent_set_at_keeps_alignment() {
        let n = 64;
        let vec = Arc::new(ConcurrentVec::<usize>::with_len(n));

        thread::scope(|scope| {
            for i in (0..n).rev() {
                let vec = Arc::clone(&vec);
                scope.spawn(move || vec.set_at(i, i * 10).unwrap());
            }
        });

        let expected: Vec<_> = (0..n).map(|i| i * 10).collect();
        assert_eq!(vec.snapshot(), expected);
    }
}
