//! Murmur Common
//!
//! Thread-safe container primitives shared across Murmur services.
//!
//! Both containers wrap a single reader-writer lock around a standard
//! collection. Mutating operations take the write lock, read-only operations
//! take the read lock, and nothing performs I/O while a lock is held. Neither
//! container ever touches the other's lock, so they can be combined freely
//! without lock-ordering concerns.
//!
//! - [`ConcurrentVec`]: an ordered sequence supporting append, index-addressed
//!   writes, predicate removal, bounded filtering and snapshots.
//! - [`ConcurrentMap`]: a key/value map with set/get/delete and snapshots.
//!
//! Instances are meant to be constructed explicitly and shared by reference
//! (usually behind an `Arc`), never stashed in process-wide statics.

pub mod concurrent_map;
pub mod concurrent_vec;

pub use concurrent_map::ConcurrentMap;
pub use concurrent_vec::{CollectionError, ConcurrentVec};
