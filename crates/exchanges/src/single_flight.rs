//! Single-flight refresh per key
//!
//! The first caller to find a key missing or stale becomes the leader and runs the
//! refresh; callers arriving while it is in flight wait for its result instead of
//! starting their own. Waiting uses flume channels, so it works on any executor.
//! The lock is never held across an `.await`.

use crate::errors::Result;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

struct Slot<V> {
    value: Option<(V, Instant)>,
    /// `Some` while a refresh is in flight
    waiters: Option<Vec<flume::Sender<Result<V>>>>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self { value: None, waiters: None }
    }
}

/// Keyed values refreshed at most once concurrently per key
pub struct SingleFlight<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }
}

enum Role<V> {
    Hit(V),
    Wait(flume::Receiver<Result<V>>),
    Lead,
}

impl<K: Eq + Hash + Clone, V: Clone> SingleFlight<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Slot<V>>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the stored value if it is younger than `max_age` (`None`: never stale),
    /// otherwise refresh it. `force` skips the freshness check but still joins an
    /// in-flight refresh. Only successful results are stored.
    pub async fn get_or_refresh<F, Fut>(&self, key: &K, max_age: Option<Duration>, force: bool, refresh: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        loop {
            let role = {
                let mut slots = self.lock();
                let slot = slots.entry(key.clone()).or_default();

                let fresh = slot.value.as_ref().filter(|(_, at)| {
                    !force && max_age.map_or(true, |max| at.elapsed() <= max)
                });

                if let Some((value, _)) = fresh {
                    Role::Hit(value.clone())
                } else if let Some(waiters) = slot.waiters.as_mut() {
                    let (tx, rx) = flume::bounded(1);
                    waiters.push(tx);
                    Role::Wait(rx)
                } else {
                    slot.waiters = Some(Vec::new());
                    Role::Lead
                }
            };

            match role {
                Role::Hit(value) => return Ok(value),
                Role::Wait(rx) => match rx.recv_async().await {
                    Ok(result) => return result,
                    // Leader was dropped mid-refresh; contend again.
                    Err(_) => continue,
                },
                Role::Lead => break,
            }
        }

        let mut guard = LeaderGuard { flight: self, key, armed: true };
        let result = refresh().await;
        guard.armed = false;
        self.complete(key, &result);
        result
    }

    fn complete(&self, key: &K, result: &Result<V>) {
        let waiters = {
            let mut slots = self.lock();
            let slot = slots.entry(key.clone()).or_default();
            if let Ok(value) = result {
                slot.value = Some((value.clone(), Instant::now()));
            }
            slot.waiters.take().unwrap_or_default()
        };

        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }
    }

    /// Replace the stored value without touching an in-flight refresh
    pub fn put(&self, key: K, value: V) {
        self.lock().entry(key).or_default().value = Some((value, Instant::now()));
    }

    /// Stored value and its age, fresh or not
    pub fn peek(&self, key: &K) -> Option<(V, Duration)> {
        self.lock()
            .get(key)
            .and_then(|slot| slot.value.as_ref())
            .map(|(value, at)| (value.clone(), at.elapsed()))
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.lock().get(key).is_some_and(|slot| slot.waiters.is_some())
    }

    pub fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clears the in-flight marker if the leader's future is dropped before completing.
/// Dropping the waiters' senders wakes them so one of them takes over.
struct LeaderGuard<'a, K: Eq + Hash + Clone, V: Clone> {
    flight: &'a SingleFlight<K, V>,
    key: &'a K,
    armed: bool,
}

impl<K: Eq + Hash + Clone, V: Clone> Drop for LeaderGuard<'_, K, V> {
    fn drop(&mut self) {
        if self.armed {
            if let Some(slot) = self.flight.lock().get_mut(self.key) {
                slot.waiters = None;
            }
        }
    }
}

/// Lazily resolved value computed once per owner, with concurrent first use coalesced.
/// A failed resolution is not cached; the next caller tries again.
pub struct AsyncOnce<V> {
    inner: SingleFlight<(), V>,
}

impl<V: Clone> Default for AsyncOnce<V> {
    fn default() -> Self {
        Self { inner: SingleFlight::new() }
    }
}

impl<V: Clone> AsyncOnce<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        self.inner.get_or_refresh(&(), None, false, init).await
    }

    pub fn get(&self) -> Option<V> {
        self.inner.peek(&()).map(|(value, _)| value)
    }
}
