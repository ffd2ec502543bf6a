//! In-memory key-value backend for testing.

use crate::backend::KvBackend;
use crate::error::{BackendError, BackendResult};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// A value held by the in-memory store.
#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
    Set(BTreeSet<String>),
    /// Kept ordered by `(score, member)`.
    ZSet(Vec<(f64, String)>),
}

impl Value {
    fn is_empty(&self) -> bool {
        match self {
            Self::Str(_) => false,
            Self::Hash(h) => h.is_empty(),
            Self::List(l) => l.is_empty(),
            Self::Set(s) => s.is_empty(),
            Self::ZSet(z) => z.is_empty(),
        }
    }
}

/// An in-memory key-value backend.
///
/// This backend stores all data in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// It mimics Redis semantics closely enough for kvrecord: typed values,
/// `WRONGTYPE` errors, empty collections disappearing, and inclusive
/// ranges with negative indexes.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads. Every
/// command runs under a single lock, so `incr` and `set_nx` are atomic.
///
/// # Example
///
/// ```rust
/// use kvrecord_backend::{KvBackend, InMemoryBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.zadd("user:all", 1.0, "1").unwrap();
/// assert_eq!(backend.zrange("user:all", 0, -1).unwrap(), vec!["1".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<HashMap<String, Value>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all keys currently stored, sorted.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Returns the number of keys stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Clears all data from the backend.
    pub fn clear(&self) {
        self.data.write().clear();
    }

    /// Runs `f` against the value at `key`, creating it with `init` if missing.
    ///
    /// Empty values are removed afterwards.
    fn with_value_mut<T>(
        &self,
        key: &str,
        init: impl FnOnce() -> Value,
        f: impl FnOnce(&mut Value) -> BackendResult<T>,
    ) -> BackendResult<T> {
        let mut data = self.data.write();
        let value = data.entry(key.to_string()).or_insert_with(init);
        let result = f(value);
        if value.is_empty() {
            data.remove(key);
        }
        result
    }
}

/// Resolves a Redis-style inclusive range against a collection length.
pub(crate) fn resolve_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

impl KvBackend for InMemoryBackend {
    fn get(&self, key: &str) -> BackendResult<Option<String>> {
        match self.data.read().get(key) {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s.clone())),
            Some(_) => Err(BackendError::wrong_type(key)),
        }
    }

    fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        self.data
            .write()
            .insert(key.to_string(), Value::Str(value.to_string()));
        Ok(())
    }

    fn set_nx(&self, key: &str, value: &str) -> BackendResult<bool> {
        let mut data = self.data.write();
        if data.contains_key(key) {
            return Ok(false);
        }
        data.insert(key.to_string(), Value::Str(value.to_string()));
        Ok(true)
    }

    fn del(&self, key: &str) -> BackendResult<bool> {
        Ok(self.data.write().remove(key).is_some())
    }

    fn exists(&self, key: &str) -> BackendResult<bool> {
        Ok(self.data.read().contains_key(key))
    }

    fn incr(&self, key: &str) -> BackendResult<i64> {
        let mut data = self.data.write();
        let current = match data.get(key) {
            None => 0,
            Some(Value::Str(s)) => s
                .parse::<i64>()
                .map_err(|_| BackendError::not_an_integer(key))?,
            Some(_) => return Err(BackendError::wrong_type(key)),
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| BackendError::not_an_integer(key))?;
        data.insert(key.to_string(), Value::Str(next.to_string()));
        Ok(next)
    }

    fn hget(&self, key: &str, field: &str) -> BackendResult<Option<String>> {
        match self.data.read().get(key) {
            None => Ok(None),
            Some(Value::Hash(h)) => Ok(h.get(field).cloned()),
            Some(_) => Err(BackendError::wrong_type(key)),
        }
    }

    fn hset(&self, key: &str, field: &str, value: &str) -> BackendResult<bool> {
        self.with_value_mut(
            key,
            || Value::Hash(HashMap::new()),
            |v| match v {
                Value::Hash(h) => Ok(h.insert(field.to_string(), value.to_string()).is_none()),
                _ => Err(BackendError::wrong_type(key)),
            },
        )
    }

    fn hdel(&self, key: &str, field: &str) -> BackendResult<bool> {
        self.with_value_mut(
            key,
            || Value::Hash(HashMap::new()),
            |v| match v {
                Value::Hash(h) => Ok(h.remove(field).is_some()),
                _ => Err(BackendError::wrong_type(key)),
            },
        )
    }

    fn zadd(&self, key: &str, score: f64, member: &str) -> BackendResult<bool> {
        self.with_value_mut(
            key,
            || Value::ZSet(Vec::new()),
            |v| match v {
                Value::ZSet(z) => {
                    let is_new = match z.iter_mut().find(|(_, m)| m == member) {
                        Some(entry) => {
                            entry.0 = score;
                            false
                        }
                        None => {
                            z.push((score, member.to_string()));
                            true
                        }
                    };
                    z.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
                    Ok(is_new)
                }
                _ => Err(BackendError::wrong_type(key)),
            },
        )
    }

    fn zrem(&self, key: &str, member: &str) -> BackendResult<bool> {
        self.with_value_mut(
            key,
            || Value::ZSet(Vec::new()),
            |v| match v {
                Value::ZSet(z) => {
                    let before = z.len();
                    z.retain(|(_, m)| m != member);
                    Ok(z.len() != before)
                }
                _ => Err(BackendError::wrong_type(key)),
            },
        )
    }

    fn zrange(&self, key: &str, start: i64, stop: i64) -> BackendResult<Vec<String>> {
        match self.data.read().get(key) {
            None => Ok(Vec::new()),
            Some(Value::ZSet(z)) => Ok(match resolve_range(z.len(), start, stop) {
                Some((from, to)) => z[from..=to].iter().map(|(_, m)| m.clone()).collect(),
                None => Vec::new(),
            }),
            Some(_) => Err(BackendError::wrong_type(key)),
        }
    }

    fn rpush(&self, key: &str, value: &str) -> BackendResult<u64> {
        self.with_value_mut(
            key,
            || Value::List(VecDeque::new()),
            |v| match v {
                Value::List(l) => {
                    l.push_back(value.to_string());
                    Ok(l.len() as u64)
                }
                _ => Err(BackendError::wrong_type(key)),
            },
        )
    }

    fn lrem(&self, key: &str, count: i64, value: &str) -> BackendResult<u64> {
        self.with_value_mut(
            key,
            || Value::List(VecDeque::new()),
            |v| match v {
                Value::List(l) => {
                    let limit = if count == 0 {
                        usize::MAX
                    } else {
                        usize::try_from(count.unsigned_abs()).unwrap_or(usize::MAX)
                    };
                    let mut positions: Vec<usize> = l
                        .iter()
                        .enumerate()
                        .filter(|(_, item)| item.as_str() == value)
                        .map(|(i, _)| i)
                        .collect();
                    if count < 0 {
                        positions.reverse();
                    }
                    positions.truncate(limit);
                    positions.sort_unstable_by(|a, b| b.cmp(a));
                    for i in &positions {
                        l.remove(*i);
                    }
                    Ok(positions.len() as u64)
                }
                _ => Err(BackendError::wrong_type(key)),
            },
        )
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> BackendResult<Vec<String>> {
        match self.data.read().get(key) {
            None => Ok(Vec::new()),
            Some(Value::List(l)) => Ok(match resolve_range(l.len(), start, stop) {
                Some((from, to)) => l.range(from..=to).cloned().collect(),
                None => Vec::new(),
            }),
            Some(_) => Err(BackendError::wrong_type(key)),
        }
    }

    fn sadd(&self, key: &str, member: &str) -> BackendResult<bool> {
        self.with_value_mut(
            key,
            || Value::Set(BTreeSet::new()),
            |v| match v {
                Value::Set(s) => Ok(s.insert(member.to_string())),
                _ => Err(BackendError::wrong_type(key)),
            },
        )
    }

    fn srem(&self, key: &str, member: &str) -> BackendResult<bool> {
        self.with_value_mut(
            key,
            || Value::Set(BTreeSet::new()),
            |v| match v {
                Value::Set(s) => Ok(s.remove(member)),
                _ => Err(BackendError::wrong_type(key)),
            },
        )
    }

    fn smembers(&self, key: &str) -> BackendResult<Vec<String>> {
        match self.data.read().get(key) {
            None => Ok(Vec::new()),
            Some(Value::Set(s)) => Ok(s.iter().cloned().collect()),
            Some(_) => Err(BackendError::wrong_type(key)),
        }
    }
}
