// Memoization of converter output keyed by (path, sar arguments, preference)

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use crate::converter::{Converted, Preference};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub args: Vec<String>,
    pub preference: Preference,
}

impl CacheKey {
    pub fn new<S: AsRef<str>>(path: impl Into<PathBuf>, args: &[S], preference: Preference) -> Self {
        Self {
            path: path.into(),
            args: args.iter().map(|a| a.as_ref().to_string()).collect(),
            preference,
        }
    }
}

type Slot = Arc<Mutex<Option<Arc<Converted>>>>;

/// At most one conversion runs per key: concurrent callers for the same key wait on the key's
/// slot and then share its result, while distinct keys convert in parallel. Failed conversions
/// leave the slot empty, so the next caller tries again.
#[derive(Default)]
pub struct ConversionCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ConversionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_try_insert_with<F>(&self, key: CacheKey, compute: F) -> Result<Arc<Converted>>
    where
        F: FnOnce() -> Result<Converted>,
    {
        let slot = Arc::clone(lock(&self.slots).entry(key.clone()).or_default());
        let mut guard = lock(slot.as_ref());
        if let Some(hit) = guard.as_ref() {
            return Ok(Arc::clone(hit));
        }
        match compute() {
            Ok(converted) => {
                let value = Arc::new(converted);
                *guard = Some(Arc::clone(&value));
                Ok(value)
            }
            Err(e) => {
                drop(guard);
                self.forget_if_idle(&key, slot);
                Err(e)
            }
        }
    }

    /// Drop the entry for `key` after a failed conversion unless another caller holds its slot.
    fn forget_if_idle(&self, key: &CacheKey, slot: Slot) {
        let mut slots = lock(&self.slots);
        let idle = slots
            .get(key)
            .is_some_and(|s| Arc::ptr_eq(s, &slot) && Arc::strong_count(&slot) == 2);
        if idle && lock(slot.as_ref()).is_none() {
            slots.remove(key);
        }
    }

    /// Number of successfully cached conversions. Slots busy with a conversion are not counted
    /// and are not waited for.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = lock(&self.slots).values().cloned().collect();
        slots
            .iter()
            .filter(|slot| match slot.try_lock() {
                Ok(guard) => guard.is_some(),
                Err(TryLockError::Poisoned(e)) => e.into_inner().is_some(),
                Err(TryLockError::WouldBlock) => false,
            })
            .count()
    }

    /// Keys with an entry, cached or in flight.
    pub fn tracked_keys(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.slots).clear();
    }
}
