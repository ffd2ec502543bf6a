//! Key-value backend trait definition.

use crate::error::BackendResult;

/// A key-value backend for kvrecord.
///
/// Backends expose a Redis-shaped command surface over string keys and
/// string values. kvrecord owns all key naming - backends do not know
/// about models, properties or identifiers.
///
/// # Invariants
///
/// - `incr` is atomic: concurrent callers never observe the same result
/// - `set_nx` is atomic: at most one concurrent caller wins a missing key
/// - Collection commands on a key holding another kind of value fail with
///   [`crate::BackendError::WrongType`]
/// - Empty hashes, lists, sets and sorted sets cease to exist
/// - Backends must be `Send + Sync` so connections can be shared
///
/// Range arguments follow Redis conventions: indexes are inclusive and
/// negative indexes count from the end (`0, -1` is the whole range).
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::RespBackend`] - For Redis-compatible servers
pub trait KvBackend: Send + Sync {
    /// Returns the string stored at `key`, if any.
    fn get(&self, key: &str) -> BackendResult<Option<String>>;

    /// Stores `value` at `key`, replacing whatever was there.
    fn set(&self, key: &str, value: &str) -> BackendResult<()>;

    /// Stores `value` at `key` only if the key does not exist.
    ///
    /// Returns `true` if the value was stored.
    fn set_nx(&self, key: &str, value: &str) -> BackendResult<bool>;

    /// Deletes `key` regardless of its kind.
    ///
    /// Returns `true` if a key was removed.
    fn del(&self, key: &str) -> BackendResult<bool>;

    /// Returns `true` if `key` exists.
    fn exists(&self, key: &str) -> BackendResult<bool>;

    /// Atomically increments the integer at `key` and returns the new value.
    ///
    /// A missing key counts as zero.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BackendError::NotAnInteger`] if the stored value
    /// is not an integer or the increment would overflow.
    fn incr(&self, key: &str) -> BackendResult<i64>;

    /// Returns the value of `field` in the hash at `key`.
    fn hget(&self, key: &str, field: &str) -> BackendResult<Option<String>>;

    /// Sets `field` in the hash at `key`.
    ///
    /// Returns `true` if the field is new.
    fn hset(&self, key: &str, field: &str, value: &str) -> BackendResult<bool>;

    /// Removes `field` from the hash at `key`.
    ///
    /// Returns `true` if the field existed.
    fn hdel(&self, key: &str, field: &str) -> BackendResult<bool>;

    /// Adds `member` with `score` to the sorted set at `key`.
    ///
    /// Returns `true` if the member is new.
    fn zadd(&self, key: &str, score: f64, member: &str) -> BackendResult<bool>;

    /// Removes `member` from the sorted set at `key`.
    fn zrem(&self, key: &str, member: &str) -> BackendResult<bool>;

    /// Returns members of the sorted set at `key` by rank, lowest score first.
    fn zrange(&self, key: &str, start: i64, stop: i64) -> BackendResult<Vec<String>>;

    /// Appends `value` to the list at `key` and returns the new length.
    fn rpush(&self, key: &str, value: &str) -> BackendResult<u64>;

    /// Removes occurrences of `value` from the list at `key`.
    ///
    /// `count > 0` removes from the head, `count < 0` from the tail and
    /// `count == 0` removes all occurrences. Returns the number removed.
    fn lrem(&self, key: &str, count: i64, value: &str) -> BackendResult<u64>;

    /// Returns a range of the list at `key`.
    fn lrange(&self, key: &str, start: i64, stop: i64) -> BackendResult<Vec<String>>;

    /// Adds `member` to the set at `key`.
    fn sadd(&self, key: &str, member: &str) -> BackendResult<bool>;

    /// Removes `member` from the set at `key`.
    fn srem(&self, key: &str, member: &str) -> BackendResult<bool>;

    /// Returns all members of the set at `key`, in no particular order.
    fn smembers(&self, key: &str) -> BackendResult<Vec<String>>;
}
