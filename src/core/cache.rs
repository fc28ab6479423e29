//! Bounded cache with recency eviction and per-entry expiry

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Mutex;
use tracing::debug;

struct Slot<V> {
    value: V,
    expires_at: DateTime<Utc>,
    touched: u64,
}

struct Inner<K, V> {
    slots: HashMap<K, Slot<V>>,
    clock: u64,
}

/// Associative cache bounded by entry count. Inserting past capacity evicts
/// the least recently used entry; every entry expires a fixed duration after
/// insertion, checked lazily on lookup. Operations take the current instant
/// explicitly so expiry stays deterministic under test.
///
/// Synchronization lives inside the cache; callers never hold a lock.
pub struct LruCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Creates a cache holding at most `capacity` entries (minimum one).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                clock: 0,
            }),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, now: DateTime<Utc>, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().unwrap();

        let expired = match inner.slots.get(key) {
            None => {
                debug!("Cache MISS for key: {:?}", key);
                return None;
            }
            Some(slot) => slot.expires_at <= now,
        };
        if expired {
            debug!("Cache entry expired for key: {:?}", key);
            inner.slots.remove(key);
            return None;
        }

        debug!("Cache HIT for key: {:?}", key);
        inner.clock += 1;
        let tick = inner.clock;
        let slot = inner.slots.get_mut(key)?;
        slot.touched = tick;
        Some(slot.value.clone())
    }

    pub fn put(&self, now: DateTime<Utc>, key: K, value: V, ttl: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.clock += 1;
        let tick = inner.clock;

        // Reclaim dead entries before considering eviction.
        inner.slots.retain(|_, slot| slot.expires_at > now);

        if inner.slots.len() >= self.capacity && !inner.slots.contains_key(&key) {
            let evict = inner
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.touched)
                .map(|(key, _)| key.clone());
            if let Some(evict) = evict {
                debug!("Cache evicting least recently used key: {:?}", evict);
                inner.slots.remove(&evict);
            }
        }

        debug!("Cache PUT for key: {:?}", key);
        inner.slots.insert(
            key,
            Slot {
                value,
                expires_at: now + ttl,
                touched: tick,
            },
        );
    }

    /// Drops the entry if present; absent keys are a no-op.
    pub fn remove(&self, key: &K) {
        let mut inner = self.inner.lock().unwrap();
        if inner.slots.remove(key).is_some() {
            debug!("Cache REMOVE for key: {:?}", key);
        }
    }

    /// Entries currently resident, counting those not yet reaped by expiry.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_get_and_put_round_trip() {
        let cache = LruCache::<String, i32>::new(4);
        let now = at(0);

        assert!(cache.get(now, &"key1".to_string()).is_none());

        cache.put(now, "key1".to_string(), 123, Duration::minutes(5));
        assert_eq!(cache.get(now, &"key1".to_string()), Some(123));

        assert!(cache.get(now, &"key2".to_string()).is_none());
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let cache = LruCache::<String, i32>::new(4);
        cache.put(at(0), "key1".to_string(), 123, Duration::seconds(60));

        assert_eq!(cache.get(at(59), &"key1".to_string()), Some(123));
        assert!(cache.get(at(60), &"key1".to_string()).is_none());

        // The expired entry is dropped, not just hidden.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_least_recently_used_entry_is_evicted() {
        let cache = LruCache::<String, i32>::new(2);
        let ttl = Duration::minutes(5);
        let now = at(0);

        cache.put(now, "a".to_string(), 1, ttl);
        cache.put(now, "b".to_string(), 2, ttl);

        // Touch "a" so "b" becomes the eviction candidate.
        assert_eq!(cache.get(now, &"a".to_string()), Some(1));

        cache.put(now, "c".to_string(), 3, ttl);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(now, &"b".to_string()).is_none());
        assert_eq!(cache.get(now, &"a".to_string()), Some(1));
        assert_eq!(cache.get(now, &"c".to_string()), Some(3));
    }

    #[test]
    fn test_overwriting_a_key_does_not_evict() {
        let cache = LruCache::<String, i32>::new(2);
        let ttl = Duration::minutes(5);
        let now = at(0);

        cache.put(now, "a".to_string(), 1, ttl);
        cache.put(now, "b".to_string(), 2, ttl);
        cache.put(now, "a".to_string(), 10, ttl);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(now, &"a".to_string()), Some(10));
        assert_eq!(cache.get(now, &"b".to_string()), Some(2));
    }

    #[test]
    fn test_overwriting_resets_expiry() {
        let cache = LruCache::<String, i32>::new(4);
        cache.put(at(0), "key1".to_string(), 1, Duration::seconds(60));
        cache.put(at(30), "key1".to_string(), 2, Duration::seconds(60));

        assert_eq!(cache.get(at(89), &"key1".to_string()), Some(2));
        assert!(cache.get(at(90), &"key1".to_string()).is_none());
    }

    #[test]
    fn test_expired_entries_make_room_before_eviction() {
        let cache = LruCache::<String, i32>::new(2);
        cache.put(at(0), "a".to_string(), 1, Duration::seconds(30));
        cache.put(at(0), "b".to_string(), 2, Duration::minutes(5));

        // "a" is dead by now, so inserting "c" must not push out "b".
        cache.put(at(60), "c".to_string(), 3, Duration::minutes(5));
        assert_eq!(cache.get(at(60), &"b".to_string()), Some(2));
        assert_eq!(cache.get(at(60), &"c".to_string()), Some(3));
        assert!(cache.get(at(60), &"a".to_string()).is_none());
    }

    #[test]
    fn test_remove_drops_the_entry() {
        let cache = LruCache::<String, i32>::new(4);
        let now = at(0);

        cache.put(now, "key1".to_string(), 123, Duration::minutes(5));
        cache.remove(&"key1".to_string());
        assert!(cache.get(now, &"key1".to_string()).is_none());

        // Removing an absent key is a no-op.
        cache.remove(&"key1".to_string());
    }

    #[test]
    fn test_capacity_has_a_floor_of_one() {
        let cache = LruCache::<String, i32>::new(0);
        let now = at(0);

        cache.put(now, "a".to_string(), 1, Duration::minutes(5));
        assert_eq!(cache.get(now, &"a".to_string()), Some(1));

        cache.put(now, "b".to_string(), 2, Duration::minutes(5));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(now, &"a".to_string()).is_none());
        assert_eq!(cache.get(now, &"b".to_string()), Some(2));
    }
}
