//! In-memory, time-bounded caches keyed by rounded coordinates.
//!
//! Entries carry the timestamp they were written at and are never served
//! once older than the cache's TTL. Expired entries are dropped on lookup,
//! by [`TtlCache::purge_expired`], and by a sweep that [`TtlCache::insert`]
//! runs at most once per TTL.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use geo::Coord;

/// Decimal places kept when rounding coordinates for cache keys.
///
/// Four places is roughly 11 m of latitude.
pub const KEY_PRECISION_DECIMALS: i32 = 4;

/// A coordinate rounded to [`KEY_PRECISION_DECIMALS`], suitable as a map key.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use safepath_core::CoordKey;
///
/// let a = CoordKey::from_coord(Coord { x: -0.127_61, y: 51.507_21 });
/// let b = CoordKey::from_coord(Coord { x: -0.127_64, y: 51.507_24 });
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordKey {
    lat_e4: i64,
    lng_e4: i64,
}

impl CoordKey {
    /// Round `coord` into a key.
    #[must_use]
    pub fn from_coord(coord: Coord<f64>) -> Self {
        Self {
            lat_e4: round_scaled(coord.y),
            lng_e4: round_scaled(coord.x),
        }
    }

    /// Rounded latitude scaled by `10^4`.
    #[must_use]
    pub const fn lat_e4(&self) -> i64 {
        self.lat_e4
    }

    /// Rounded longitude scaled by `10^4`.
    #[must_use]
    pub const fn lng_e4(&self) -> i64 {
        self.lng_e4
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "validated coordinates scaled by 10^4 fit comfortably in i64"
)]
fn round_scaled(value: f64) -> i64 {
    (value * 10_f64.powi(KEY_PRECISION_DECIMALS)).round() as i64
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stored_at: DateTime<FixedOffset>,
}

/// A map whose entries expire after a fixed time-to-live.
///
/// The cache does not read the clock itself; callers pass `now` so tests
/// can drive expiry with a virtual clock.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, Entry<V>>,
    ttl: Duration,
    last_sweep: Option<DateTime<FixedOffset>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache with the given time-to-live.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            last_sweep: None,
        }
    }

    /// Configured time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return a clone of the entry for `key` if it is still fresh at `now`.
    ///
    /// Stale entries are removed.
    pub fn get(&mut self, key: &K, now: DateTime<FixedOffset>) -> Option<V> {
        let fresh = self
            .entries
            .get(key)
            .map(|entry| self.is_fresh(entry.stored_at, now))?;
        if fresh {
            self.entries.get(key).map(|entry| entry.value.clone())
        } else {
            self.entries.remove(key);
            None
        }
    }

    /// Store `value` under `key`, overwriting any existing entry.
    ///
    /// Once a full TTL has passed since the last sweep, every stale entry is
    /// dropped first, so keys that are never read again do not accumulate.
    pub fn insert(&mut self, key: K, value: V, now: DateTime<FixedOffset>) {
        match self.last_sweep {
            None => self.last_sweep = Some(now),
            Some(at) if !entry_is_fresh(self.ttl, at, now) => {
                self.purge_expired(now);
            }
            Some(_) => {}
        }
        self.entries.insert(
            key,
            Entry {
                value,
                stored_at: now,
            },
        );
    }

    /// Drop every entry older than the TTL at `now`; returns how many went.
    pub fn purge_expired(&mut self, now: DateTime<FixedOffset>) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.last_sweep = Some(now);
        self.entries
            .retain(|_, entry| entry_is_fresh(ttl, entry.stored_at, now));
        before - self.entries.len()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Report whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, stored_at: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> bool {
        entry_is_fresh(self.ttl, stored_at, now)
    }
}

fn entry_is_fresh(ttl: Duration, stored_at: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> bool {
    (now - stored_at)
        .to_std()
        // A timestamp in the future (clock stepped backwards) counts as fresh.
        .map_or(true, |age| age < ttl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn noon() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .and_then(|tz| tz.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single())
            .expect("valid timestamp")
    }

    #[rstest]
    fn serves_fresh_entries(noon: DateTime<FixedOffset>) {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1_u32, noon);
        assert_eq!(cache.get(&"a", noon + chrono::Duration::seconds(59)), Some(1));
    }

    #[rstest]
    fn never_serves_past_ttl(noon: DateTime<FixedOffset>) {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1_u32, noon);
        assert_eq!(cache.get(&"a", noon + chrono::Duration::seconds(60)), None);
        assert!(cache.is_empty(), "stale entry should be evicted on lookup");
    }

    #[rstest]
    fn purge_drops_only_stale_entries(noon: DateTime<FixedOffset>) {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("old", 1_u32, noon);
        cache.insert("new", 2_u32, noon + chrono::Duration::seconds(50));
        let purged = cache.purge_expired(noon + chrono::Duration::seconds(70));
        assert_eq!(purged, 1);
        assert_eq!(cache.len(), 1);
    }

    #[rstest]
    fn inserting_after_a_ttl_sweeps_stale_keys(noon: DateTime<FixedOffset>) {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        for i in 0..200_u32 {
            cache.insert(i, i, noon);
        }
        cache.insert(500, 1, noon + chrono::Duration::seconds(30));
        assert_eq!(cache.len(), 201, "nothing is stale yet");

        cache.insert(1000, 0, noon + chrono::Duration::hours(24));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&1000, noon + chrono::Duration::hours(24)), Some(0));
    }

    #[rstest]
    fn keys_round_to_eleven_metres() {
        let a = CoordKey::from_coord(Coord { x: 10.0, y: 20.000_04 });
        let b = CoordKey::from_coord(Coord { x: 10.0, y: 20.000_06 });
        assert_ne!(a, b);
        assert_eq!(a.lat_e4(), 200_000);
        assert_eq!(b.lat_e4(), 200_001);
    }
}
