//! Budgeted eviction across several tile stores.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;
use tessera_tiles::{TileCoordinates, TileSystem};
use tracing::debug;

use crate::{AccessClock, GridStorage};

/// A store the [`StorageReducer`] can trim.
pub trait ReducibleStorage {
    /// Key space of the store; see [`GridStorage::domain`].
    fn domain(&self) -> &str;

    /// Number of cached entries.
    fn entry_count(&self) -> usize;

    /// Every cached key with its last access stamp.
    fn access_stamps(&self) -> Vec<(TileCoordinates, u64)>;

    /// Drop the entry at `key`. Returns whether one existed.
    fn evict(&mut self, key: &TileCoordinates) -> bool;

    /// Start stamping accesses with `clock`.
    fn attach_clock(&mut self, clock: AccessClock);
}

impl<T> ReducibleStorage for GridStorage<T> {
    fn domain(&self) -> &str {
        GridStorage::domain(self)
    }

    fn entry_count(&self) -> usize {
        self.size()
    }

    fn access_stamps(&self) -> Vec<(TileCoordinates, u64)> {
        self.keys()
            .filter_map(|key| self.last_access(key).map(|stamp| (*key, stamp)))
            .collect()
    }

    fn evict(&mut self, key: &TileCoordinates) -> bool {
        self.remove(key).is_some()
    }

    fn attach_clock(&mut self, clock: AccessClock) {
        self.set_clock(clock);
    }
}

/// Outcome of one [`StorageReducer::reduce`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReduceReport {
    /// Entries across all stores before reducing.
    pub before: usize,
    /// Entries across all stores after reducing.
    pub after: usize,
    /// Entries removed.
    pub evicted: usize,
}

/// Running totals of a reducer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReducerStats {
    /// Reductions that had to evict something.
    pub reductions: u64,
    /// Entries evicted over the reducer's lifetime.
    pub evicted: u64,
}

/// Keeps a group of stores within an aggregate entry budget.
///
/// When the stores hold more than `budget` entries together, tiles are
/// evicted least recently touched first (finer tiles first on ties). A tile
/// is removed from every store of its domain at once, and a tile is never
/// evicted while one of its children is still cached in that domain, so a
/// cached tile can always reach its ancestors.
pub struct StorageReducer {
    system: TileSystem,
    budget: usize,
    clock: AccessClock,
    stats: ReducerStats,
}

#[derive(Clone, Copy)]
struct KeyState {
    stamp: u64,
    children: usize,
}

impl StorageReducer {
    #[must_use]
    pub fn new(system: TileSystem, budget: usize) -> Self {
        Self {
            system,
            budget,
            clock: AccessClock::new(),
            stats: ReducerStats::default(),
        }
    }

    #[must_use]
    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn set_budget(&mut self, budget: usize) {
        self.budget = budget;
    }

    /// Clock shared with registered stores.
    #[must_use]
    pub fn clock(&self) -> AccessClock {
        self.clock.clone()
    }

    #[must_use]
    pub fn stats(&self) -> ReducerStats {
        self.stats
    }

    /// Make `store` stamp its accesses with this reducer's clock.
    pub fn register(&self, store: &mut dyn ReducibleStorage) {
        store.attach_clock(self.clock());
    }

    /// Evict entries until `stores` fit the budget.
    pub fn reduce(&mut self, stores: &mut [&mut dyn ReducibleStorage]) -> ReduceReport {
        let before: usize = stores.iter().map(|store| store.entry_count()).sum();
        if before <= self.budget {
            return ReduceReport {
                before,
                after: before,
                evicted: 0,
            };
        }

        let mut domains: Vec<String> = Vec::new();
        let mut keys: FxHashMap<(usize, TileCoordinates), KeyState> = FxHashMap::default();
        for store in stores.iter() {
            let domain = match domains.iter().position(|d| d == store.domain()) {
                Some(index) => index,
                None => {
                    domains.push(store.domain().to_string());
                    domains.len() - 1
                }
            };
            for (key, stamp) in store.access_stamps() {
                let state = keys.entry((domain, key)).or_insert(KeyState {
                    stamp,
                    children: 0,
                });
                state.stamp = state.stamp.max(stamp);
            }
        }

        let parents: Vec<(usize, TileCoordinates)> = keys
            .keys()
            .filter_map(|(domain, key)| {
                self.system
                    .parent_coordinates(key)
                    .map(|parent| (*domain, parent))
            })
            .collect();
        for parent in parents {
            if let Some(state) = keys.get_mut(&parent) {
                state.children += 1;
            }
        }

        let mut evictable: BinaryHeap<Reverse<(u64, u8, usize, TileCoordinates)>> = keys
            .iter()
            .filter(|(_, state)| state.children == 0)
            .map(|((domain, key), state)| Reverse((state.stamp, u8::MAX - key.lod, *domain, *key)))
            .collect();

        let mut total = before;
        while total > self.budget {
            let Some(Reverse((_, _, domain, key))) = evictable.pop() else {
                break;
            };
            for store in stores.iter_mut() {
                if store.domain() == domains[domain] && store.evict(&key) {
                    total -= 1;
                }
            }
            if let Some(parent) = self.system.parent_coordinates(&key)
                && let Some(state) = keys.get_mut(&(domain, parent))
            {
                state.children -= 1;
                if state.children == 0 {
                    evictable.push(Reverse((state.stamp, u8::MAX - parent.lod, domain, parent)));
                }
            }
        }

        let report = ReduceReport {
            before,
            after: total,
            evicted: before - total,
        };
        self.stats.reductions += 1;
        self.stats.evicted += report.evicted as u64;
        debug!(
            before = report.before,
            after = report.after,
            budget = self.budget,
            "reduced tile storage"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn system() -> TileSystem {
        TileSystem::new(6, DVec3::new(100.0, 100.0, 0.0), 8, 2).unwrap()
    }

    fn key(x: i32, y: i32, lod: u8) -> TileCoordinates {
        TileCoordinates::new_2d(x, y, lod)
    }

    #[test]
    fn test_under_budget_is_noop() {
        let mut reducer = StorageReducer::new(system(), 10);
        let mut store: GridStorage<u8> = GridStorage::with_clock(reducer.clock());
        store.insert(key(0, 0, 0), 1);
        let report = reducer.reduce(&mut [&mut store]);
        assert_eq!(report.evicted, 0);
        assert_eq!(store.size(), 1);
        assert_eq!(reducer.stats().reductions, 0);
    }

    #[test]
    fn test_evicts_least_recently_touched_first() {
        let mut reducer = StorageReducer::new(system(), 2);
        let mut store: GridStorage<u8> = GridStorage::with_clock(reducer.clock());
        store.insert(key(0, 0, 0), 0);
        store.insert(key(1, 0, 0), 1);
        store.insert(key(2, 0, 0), 2);
        store.touch(&key(0, 0, 0));

        let report = reducer.reduce(&mut [&mut store]);
        assert_eq!(report.evicted, 1);
        assert!(store.has(&key(0, 0, 0)), "recently touched entry survives");
        assert!(!store.has(&key(1, 0, 0)), "oldest entry goes first");
        assert!(store.has(&key(2, 0, 0)));
    }

    #[test]
    fn test_ancestors_of_cached_tiles_are_protected() {
        let mut reducer = StorageReducer::new(system(), 3);
        let mut store: GridStorage<u8> = GridStorage::with_clock(reducer.clock());
        // Old chain root -> child -> grandchild, plus a newer unrelated tile.
        store.insert(key(0, 0, 0), 0);
        store.insert(key(1, 1, 1), 1);
        store.insert(key(2, 2, 2), 2);
        store.insert(key(5, 5, 0), 3);
        store.touch(&key(2, 2, 2));

        reducer.reduce(&mut [&mut store]);
        assert_eq!(store.size(), 3);
        assert!(store.has(&key(2, 2, 2)));
        assert!(store.has(&key(1, 1, 1)), "parent of a cached tile is kept");
        assert!(store.has(&key(0, 0, 0)), "root of a cached tile is kept");
        assert!(!store.has(&key(5, 5, 0)));
    }

    #[test]
    fn test_leaf_eviction_unlocks_parent() {
        let mut reducer = StorageReducer::new(system(), 1);
        let mut store: GridStorage<u8> = GridStorage::with_clock(reducer.clock());
        store.insert(key(0, 0, 0), 0);
        store.insert(key(0, 0, 1), 1);
        store.insert(key(1, 0, 1), 2);
        reducer.reduce(&mut [&mut store]);
        assert_eq!(store.size(), 1);
        assert!(store.has(&key(0, 0, 0)), "children go before their parent");
    }

    #[test]
    fn test_same_domain_stores_evicted_together() {
        let mut reducer = StorageReducer::new(system(), 2);
        let mut tiles: GridStorage<u8> = GridStorage::new();
        let mut heights: GridStorage<u16> = GridStorage::new();
        reducer.register(&mut tiles);
        reducer.register(&mut heights);
        for x in 0..2 {
            tiles.insert(key(x, 0, 0), 0);
            heights.insert(key(x, 0, 0), 0);
        }

        let report = reducer.reduce(&mut [&mut tiles, &mut heights]);
        assert_eq!(report.before, 4);
        assert_eq!(report.after, 2);
        assert_eq!(tiles.size(), 1);
        assert_eq!(heights.size(), 1);
        assert_eq!(
            tiles.keys().next(),
            heights.keys().next(),
            "stores of one domain keep the same tiles"
        );
    }

    #[test]
    fn test_other_domain_not_conflated() {
        let mut reducer = StorageReducer::new(system(), 1);
        let mut tiles: GridStorage<u8> = GridStorage::with_clock(reducer.clock());
        let mut maps: GridStorage<u8> = GridStorage::with_domain("maps");
        reducer.register(&mut maps);
        tiles.insert(key(0, 0, 0), 0);
        maps.insert(key(0, 0, 0), 0);

        reducer.reduce(&mut [&mut tiles, &mut maps]);
        assert_eq!(tiles.size() + maps.size(), 1);
        assert!(tiles.is_empty(), "older tile entry is evicted alone");
        assert!(maps.has(&key(0, 0, 0)));
    }

    #[test]
    fn test_stats_accumulate() {
        let mut reducer = StorageReducer::new(system(), 0);
        let mut store: GridStorage<u8> = GridStorage::with_clock(reducer.clock());
        store.insert(key(0, 0, 0), 0);
        reducer.reduce(&mut [&mut store]);
        store.insert(key(1, 0, 0), 0);
        store.insert(key(2, 0, 0), 0);
        reducer.reduce(&mut [&mut store]);
        assert_eq!(reducer.stats().reductions, 2);
        assert_eq!(reducer.stats().evicted, 3);
        assert!(store.is_empty());
    }
}
