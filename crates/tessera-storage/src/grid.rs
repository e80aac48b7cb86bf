//! A cache of tile payloads keyed by [`TileCoordinates`].

use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;
use tessera_tiles::TileCoordinates;

use crate::AccessClock;

struct Slot<T> {
    value: T,
    last_access: u64,
}

/// Lookup counters of a [`GridStorage`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Lookups that found an existing entry.
    pub hits: u64,
    /// Lookups that had to create the entry.
    pub misses: u64,
}

impl StorageStats {
    /// Fraction of lookups served from the cache (0 when nothing was looked up).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Owns one payload per tile coordinate.
///
/// Entries are created lazily and only ever allocated here: filling them is
/// the caller's business. Every mutable access stamps the entry with the
/// store's [`AccessClock`], which a
/// [`StorageReducer`](crate::StorageReducer) uses to pick eviction victims.
///
/// `domain` names the key space. Stores in the same domain index the same
/// tiles and are evicted together.
pub struct GridStorage<T> {
    entries: FxHashMap<TileCoordinates, Slot<T>>,
    clock: AccessClock,
    domain: &'static str,
    stats: StorageStats,
}

impl<T> GridStorage<T> {
    /// Domain of stores holding per-tile data of a tile system.
    pub const TILE_DOMAIN: &'static str = "tiles";

    /// Creates an empty store in the tile domain with its own clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_domain(Self::TILE_DOMAIN)
    }

    /// Creates an empty store for another key space.
    #[must_use]
    pub fn with_domain(domain: &'static str) -> Self {
        Self {
            entries: FxHashMap::default(),
            clock: AccessClock::new(),
            domain,
            stats: StorageStats::default(),
        }
    }

    /// Creates an empty tile-domain store stamping accesses with `clock`.
    #[must_use]
    pub fn with_clock(clock: AccessClock) -> Self {
        let mut storage = Self::new();
        storage.clock = clock;
        storage
    }

    #[must_use]
    pub fn domain(&self) -> &'static str {
        self.domain
    }

    #[must_use]
    pub fn clock(&self) -> &AccessClock {
        &self.clock
    }

    /// Switch to another clock. Existing stamps are kept.
    pub fn set_clock(&mut self, clock: AccessClock) {
        self.clock = clock;
    }

    #[must_use]
    pub fn has(&self, key: &TileCoordinates) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read access without touching the entry.
    #[must_use]
    pub fn get(&self, key: &TileCoordinates) -> Option<&T> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Mutable access; marks the entry as recently used.
    pub fn get_mut(&mut self, key: &TileCoordinates) -> Option<&mut T> {
        let stamp = self.clock.tick();
        match self.entries.get_mut(key) {
            Some(slot) => {
                self.stats.hits += 1;
                slot.last_access = stamp;
                Some(&mut slot.value)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Mark an entry as recently used. Returns false if it does not exist.
    pub fn touch(&mut self, key: &TileCoordinates) -> bool {
        let stamp = self.clock.tick();
        match self.entries.get_mut(key) {
            Some(slot) => {
                slot.last_access = stamp;
                true
            }
            None => false,
        }
    }

    /// Store `value` at `key`, returning the previous payload if any.
    pub fn insert(&mut self, key: TileCoordinates, value: T) -> Option<T> {
        let last_access = self.clock.tick();
        self.entries
            .insert(key, Slot { value, last_access })
            .map(|old| old.value)
    }

    /// Returns the entry at `key`, constructing it with `ctor` if absent.
    pub fn get_or_create<C>(&mut self, key: TileCoordinates, ctor: C) -> &mut T
    where
        C: FnOnce() -> T,
    {
        self.get_or_create_callback(key, ctor, |_| {})
    }

    /// Like [`get_or_create`](Self::get_or_create), but on first creation
    /// runs `on_create` on the fresh entry exactly once before returning it.
    pub fn get_or_create_callback<C, F>(&mut self, key: TileCoordinates, ctor: C, on_create: F) -> &mut T
    where
        C: FnOnce() -> T,
        F: FnOnce(&mut T),
    {
        let stamp = self.clock.tick();
        match self.entries.entry(key) {
            Entry::Occupied(occupied) => {
                self.stats.hits += 1;
                let slot = occupied.into_mut();
                slot.last_access = stamp;
                &mut slot.value
            }
            Entry::Vacant(vacant) => {
                self.stats.misses += 1;
                let mut value = ctor();
                on_create(&mut value);
                &mut vacant
                    .insert(Slot {
                        value,
                        last_access: stamp,
                    })
                    .value
            }
        }
    }

    /// Removes and returns the entry at `key`.
    pub fn remove(&mut self, key: &TileCoordinates) -> Option<T> {
        self.entries.remove(key).map(|slot| slot.value)
    }

    /// Stamp of the last mutable access to `key`.
    #[must_use]
    pub fn last_access(&self, key: &TileCoordinates) -> Option<u64> {
        self.entries.get(key).map(|slot| slot.last_access)
    }

    pub fn keys(&self) -> impl Iterator<Item = &TileCoordinates> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TileCoordinates, &T)> {
        self.entries.iter().map(|(key, slot)| (key, &slot.value))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn stats(&self) -> StorageStats {
        self.stats
    }
}

impl<T> Default for GridStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}
