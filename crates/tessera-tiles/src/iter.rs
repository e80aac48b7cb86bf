//! Resolution-driven traversal of a tile system.

use crate::{BoundingBox, ResolutionModel, TileCoordinates, TileSystem};

/// Lazily yields the tiles a [`ResolutionModel`] needs inside a region.
///
/// Every point of the region ends up covered by exactly one yielded tile: the
/// coarsest tile whose sample density satisfies the highest resolution the
/// model requests anywhere inside that tile. Levels are visited coarse to
/// fine; within a level `z` varies fastest, then `y`, then `x`.
///
/// Only the children of tiles that were too coarse are examined at the next
/// level, so space already covered by a yielded tile is never walked again.
///
/// The iterator only decides which tiles are needed. It never generates or
/// caches anything, and it cannot be restarted.
pub struct TileIter<'a, M: ResolutionModel + ?Sized> {
    system: &'a TileSystem,
    model: &'a M,
    bounds: BoundingBox,
    lod: u8,
    candidates: Candidates,
    /// Tiles of the current level that need finer children.
    refine: Vec<TileCoordinates>,
    scanned: usize,
    candidate_limit: Option<usize>,
    truncated: bool,
    done: bool,
}

/// Tiles examined at the current level.
enum Candidates {
    /// Every tile of a box of coordinates, walked with a cursor.
    Range {
        min: [i32; 3],
        max: [i32; 3],
        cursor: [i32; 3],
        exhausted: bool,
    },
    /// Children of the previous level's refined tiles, sorted.
    List(std::vec::IntoIter<TileCoordinates>),
}

impl Candidates {
    fn next(&mut self, lod: u8) -> Option<TileCoordinates> {
        match self {
            Self::Range {
                min,
                max,
                cursor,
                exhausted,
            } => {
                if *exhausted {
                    return None;
                }
                let [x, y, z] = *cursor;
                *exhausted = true;
                for axis in [2, 1, 0] {
                    if cursor[axis] < max[axis] {
                        cursor[axis] += 1;
                        *exhausted = false;
                        break;
                    }
                    cursor[axis] = min[axis];
                }
                Some(TileCoordinates::new(x, y, z, lod))
            }
            Self::List(tiles) => tiles.next(),
        }
    }
}

impl<'a, M: ResolutionModel + ?Sized> TileIter<'a, M> {
    pub(crate) fn new(system: &'a TileSystem, model: &'a M, bounds: BoundingBox) -> Self {
        let (min, max) = Self::index_range(system, bounds, 0);
        Self {
            system,
            model,
            bounds,
            lod: 0,
            candidates: Candidates::Range {
                min,
                max,
                cursor: min,
                exhausted: false,
            },
            refine: Vec::new(),
            scanned: 0,
            candidate_limit: None,
            truncated: false,
            done: false,
        }
    }

    /// Stop after examining `limit` candidate tiles.
    ///
    /// A traversal yielding `n` tiles examines at most `n * (max_lod + 1)`
    /// candidates, so a limit derived that way only cuts traversals that
    /// would yield more than `n` tiles.
    #[must_use]
    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = Some(limit);
        self
    }

    /// Whether iteration ended early on the candidate limit.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    fn index_range(system: &TileSystem, bounds: BoundingBox, lod: u8) -> ([i32; 3], [i32; 3]) {
        let lower = system.tile_coordinates(bounds.min, lod);
        let upper = system.tile_coordinates(bounds.max, lod);
        ([lower.x, lower.y, lower.z], [upper.x, upper.y, upper.z])
    }

    /// Move to the next level, examining the children of refined tiles that
    /// lie inside the bounds.
    fn descend(&mut self) {
        if self.refine.is_empty() || self.lod >= self.system.max_lod() {
            self.done = true;
            return;
        }
        let lod = self.lod + 1;
        let (min, max) = Self::index_range(self.system, self.bounds, lod);
        let factor = i64::from(self.system.factor());
        let child_range = |parent: i32, axis: usize| {
            let first = (i64::from(parent) * factor).max(i64::from(min[axis]));
            let last = (i64::from(parent) * factor + factor - 1).min(i64::from(max[axis]));
            if first > last {
                return 1..=0;
            }
            // Within min and max, so both fit in i32.
            first as i32..=last as i32
        };

        let mut children = Vec::new();
        for parent in self.refine.drain(..) {
            for x in child_range(parent.x, 0) {
                for y in child_range(parent.y, 1) {
                    for z in child_range(parent.z, 2) {
                        children.push(TileCoordinates::new(x, y, z, lod));
                    }
                }
            }
        }
        children.sort_unstable();
        self.lod = lod;
        self.candidates = Candidates::List(children.into_iter());
    }

    /// Whether the tile's own level satisfies the model inside its footprint.
    fn satisfies_model(&self, coords: &TileCoordinates) -> bool {
        let footprint = self.system.tile_bounds(coords).with_flat_axes_expanded();
        let needed = self.model.max_resolution_in(&footprint);
        coords.lod >= self.system.lod_for(needed)
    }
}

impl<M: ResolutionModel + ?Sized> Iterator for TileIter<'_, M> {
    type Item = TileCoordinates;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let Some(candidate) = self.candidates.next(self.lod) else {
                self.descend();
                continue;
            };
            if self.candidate_limit.is_some_and(|limit| self.scanned >= limit) {
                self.truncated = true;
                self.done = true;
                return None;
            }
            self.scanned += 1;
            // Every ancestor of a candidate was too coarse.
            if self.lod == self.system.max_lod() || self.satisfies_model(&candidate) {
                return Some(candidate);
            }
            self.refine.push(candidate);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConstantResolution, DistanceResolution};
    use glam::DVec3;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn region(min: f64, max: f64) -> BoundingBox {
        BoundingBox::new(DVec3::new(min, min, 0.0), DVec3::new(max, max, 0.0))
    }

    /// Count the yielded tiles covering `p` (half-open tile cells).
    fn coverage(system: &TileSystem, tiles: &[TileCoordinates], p: DVec3) -> usize {
        tiles
            .iter()
            .filter(|t| system.tile_coordinates(p, t.lod) == **t)
            .count()
    }

    #[test]
    fn test_single_coarse_tile_when_it_already_satisfies() {
        let ts = TileSystem::from_base_resolution(1000.0, 5, 1.0).unwrap();
        let model = ConstantResolution::new(region(100.0, 200.0), 0.5);
        let tiles: Vec<_> = ts.iterate(&model).unwrap().collect();
        assert_eq!(tiles, vec![TileCoordinates::new(0, 0, 0, 0)]);
    }

    #[test]
    fn test_resolution_selects_matching_lod() {
        let ts = TileSystem::from_base_resolution(1000.0, 5, 1.0).unwrap();
        // Density 2.0 needs lod 2 (0.5 * 2^2); the region fits in one such tile.
        let model = ConstantResolution::new(region(100.0, 200.0), 2.0);
        let tiles: Vec<_> = ts.iterate(&model).unwrap().collect();
        assert_eq!(tiles, vec![TileCoordinates::new(0, 0, 0, 2)]);
    }

    #[test]
    fn test_region_straddling_origin() {
        let ts = TileSystem::from_base_resolution(1000.0, 5, 1.0).unwrap();
        let model = ConstantResolution::new(region(-50.0, 50.0), 0.5);
        let mut tiles: Vec<_> = ts.iterate(&model).unwrap().collect();
        tiles.sort();
        assert_eq!(tiles.len(), 4, "2x2 lod-0 cells around the origin");
        assert!(tiles.iter().all(|t| t.lod == 0));
    }

    #[test]
    fn test_traversal_order_z_fastest_then_y_then_x() {
        let ts = TileSystem::new(0, DVec3::splat(1.0), 4, 2).unwrap();
        let bounds = BoundingBox::new(DVec3::ZERO, DVec3::new(1.5, 1.5, 1.5));
        let model = ConstantResolution::new(bounds, 0.0);
        let tiles: Vec<_> = ts.iterate(&model).unwrap().collect();
        let triples: Vec<_> = tiles.iter().map(|t| (t.x, t.y, t.z)).collect();
        assert_eq!(
            triples,
            vec![
                (0, 0, 0),
                (0, 0, 1),
                (0, 1, 0),
                (0, 1, 1),
                (1, 0, 0),
                (1, 0, 1),
                (1, 1, 0),
                (1, 1, 1)
            ]
        );
    }

    #[test]
    fn test_partition_no_gaps_no_overlaps() {
        let ts = TileSystem::new(6, DVec3::new(1000.0, 1000.0, 0.0), 16, 2).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..5 {
            let eye = DVec3::new(
                rng.random_range(-800.0..800.0),
                rng.random_range(-800.0..800.0),
                rng.random_range(5.0..50.0),
            );
            let model = DistanceResolution::new(eye, rng.random_range(0.5..4.0), 1.0, 1500.0);
            let bounds = region(-700.0, 900.0);
            let tiles: Vec<_> = ts.iterate_within(&model, bounds).unwrap().collect();
            assert!(!tiles.is_empty());

            for _ in 0..400 {
                let p = DVec3::new(
                    rng.random_range(-700.0..900.0),
                    rng.random_range(-700.0..900.0),
                    0.0,
                );
                assert_eq!(
                    coverage(&ts, &tiles, p),
                    1,
                    "point {p} must be covered exactly once (eye {eye})"
                );
            }
        }
    }

    #[test]
    fn test_monotonic_in_resolution() {
        let ts = TileSystem::new(6, DVec3::new(1000.0, 1000.0, 0.0), 16, 2).unwrap();
        let eye = DVec3::new(120.0, -40.0, 10.0);
        let coarse = DistanceResolution::new(eye, 1.0, 1.0, 1500.0);
        let fine = DistanceResolution::new(eye, 3.0, 1.0, 1500.0);
        let bounds = region(-1000.0, 1000.0);
        let coarse_tiles: Vec<_> = ts.iterate_within(&coarse, bounds).unwrap().collect();
        let fine_tiles: Vec<_> = ts.iterate_within(&fine, bounds).unwrap().collect();

        for fine_tile in &fine_tiles {
            let center = ts.tile_bounds(fine_tile).center();
            let covering = coarse_tiles
                .iter()
                .find(|t| ts.tile_coordinates(center, t.lod) == **t)
                .expect("coarse traversal covers the region");
            assert!(
                fine_tile.lod >= covering.lod,
                "{fine_tile} is coarser than {covering}"
            );
        }
    }

    #[test]
    fn test_unbounded_region_rejected() {
        let ts = TileSystem::new(4, DVec3::new(100.0, 100.0, 0.0), 8, 2).unwrap();
        let infinite_x = BoundingBox::new(
            DVec3::new(f64::NEG_INFINITY, 0.0, 0.0),
            DVec3::new(0.0, 10.0, 0.0),
        );
        let model = ConstantResolution::new(infinite_x, 1.0);
        assert!(ts.iterate(&model).is_err());

        // An infinite untiled axis is fine.
        let infinite_z = BoundingBox::new(
            DVec3::new(0.0, 0.0, f64::NEG_INFINITY),
            DVec3::new(10.0, 10.0, f64::INFINITY),
        );
        let model = ConstantResolution::new(infinite_z, 0.0);
        assert_eq!(ts.iterate(&model).unwrap().count(), 1);
    }

    #[test]
    fn test_model_outside_tile_means_coarsest() {
        let ts = TileSystem::new(3, DVec3::new(100.0, 100.0, 0.0), 8, 2).unwrap();
        // The model asks for detail only far away from the traversal bounds.
        let model = ConstantResolution::new(region(5000.0, 5100.0), 100.0);
        let tiles: Vec<_> = ts.iterate_within(&model, region(0.0, 50.0)).unwrap().collect();
        assert_eq!(tiles, vec![TileCoordinates::new_2d(0, 0, 0)]);
    }

    #[test]
    fn test_covered_space_is_not_rescanned() {
        let ts = TileSystem::new(10, DVec3::new(1000.0, 1000.0, 0.0), 16, 2).unwrap();
        // Fine detail only near one corner of a wide region.
        let model = DistanceResolution::new(DVec3::new(0.0, 0.0, 1.0), 2.0, 1.0, 20_000.0);
        let mut iter = ts.iterate_within(&model, region(-10_000.0, 10_000.0)).unwrap();
        let yielded = iter.by_ref().count();
        assert!(!iter.is_truncated());
        assert!(
            iter.scanned <= yielded * (usize::from(ts.max_lod()) + 1),
            "scanned {} candidates for {yielded} tiles",
            iter.scanned
        );
    }

    #[test]
    fn test_candidate_limit_stops_huge_traversal() {
        let ts = TileSystem::new(12, DVec3::new(100.0, 100.0, 0.0), 16, 2).unwrap();
        // Every lod-0 tile of a huge region needs refinement.
        let model = ConstantResolution::new(region(-1.0e7, 1.0e7), 100.0);
        let mut iter = ts.iterate(&model).unwrap().with_candidate_limit(1000);
        assert_eq!(iter.by_ref().count(), 0);
        assert!(iter.is_truncated());
        assert_eq!(iter.scanned, 1000);
    }

    #[test]
    fn test_candidate_limit_not_hit_by_small_traversal() {
        let ts = TileSystem::from_base_resolution(1000.0, 5, 1.0).unwrap();
        let model = ConstantResolution::new(region(100.0, 200.0), 2.0);
        let mut iter = ts.iterate(&model).unwrap().with_candidate_limit(6);
        assert_eq!(iter.by_ref().count(), 1);
        assert!(!iter.is_truncated());
    }
}
