//! The heightmap ground: lazy, cached, LOD-ordered tile generation.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use glam::{DVec2, DVec3};
use tessera_storage::{GridStorage, ReduceReport, ReducerStats, ReducibleStorage, StorageReducer};
use tessera_tiles::{OffsetResolution, ResolutionModel, TileCoordinates, TileSystem};
use tracing::{debug, debug_span, info, info_span, warn};

use crate::GroundError;
use crate::collector::{Collector, ItemKey};
use crate::context::ExplorationContext;
use crate::image::{Image, from_float, to_float};
use crate::mesh::{Neighbourhood, TerrainMesh};
use crate::relief::ReliefMapParams;
use crate::terrain::Terrain;
use crate::tile::GroundTile;
use crate::worker::{LodRange, TerrainWorker, TileContext, WorkerId};
use crate::workers::{
    ColorTextureProvider, DiamondSquareTerrain, FbmParams, FbmTerrainGenerator, LayerParams,
    MultilayerGroundTexture, Ramp, ReliefMapModifier,
};

/// Shape and budgets of a [`HeightmapGround`].
#[derive(Clone, Debug, PartialEq)]
pub struct GroundParams {
    pub seed: u64,
    /// World size of a LOD-0 tile.
    pub unit_size: f64,
    pub max_lod: u8,
    /// Height samples per tile side.
    pub terrain_resolution: usize,
    /// Texture pixels per tile side.
    pub texture_resolution: u32,
    /// Altitude of height 0.
    pub min_altitude: f64,
    /// Altitude of height 1.
    pub max_altitude: f64,
    /// Entries the cache and worker stores may hold together after a collect.
    pub cache_budget: usize,
    /// Tiles a single traversal may yield before `collect` gives up.
    pub max_tiles_per_collect: usize,
}

impl Default for GroundParams {
    fn default() -> Self {
        Self {
            seed: 0,
            unit_size: 6000.0,
            max_lod: 5,
            terrain_resolution: 33,
            texture_resolution: 32,
            min_altitude: -2000.0,
            max_altitude: 4000.0,
            cache_budget: 500,
            max_tiles_per_collect: 4096,
        }
    }
}

/// How the default worker set produces heights.
#[derive(Clone, Debug, PartialEq)]
pub enum HeightSource {
    DiamondSquare { jitter: f64 },
    Fbm(FbmParams),
}

/// Settings of [`HeightmapGround::set_default_worker_set`].
#[derive(Clone, Debug, PartialEq)]
pub struct DefaultWorkerOptions {
    pub heights: HeightSource,
    pub height_lods: LodRange,
    /// World size covered by one relief map.
    pub relief_map_size: f64,
    pub relief: ReliefMapParams,
    pub relief_lods: LodRange,
    pub texture_threshold: f64,
    pub texture_noise: f64,
}

impl Default for DefaultWorkerOptions {
    fn default() -> Self {
        Self {
            heights: HeightSource::DiamondSquare { jitter: 0.5 },
            height_lods: LodRange::ALL,
            relief_map_size: 10_000.0,
            relief: ReliefMapParams::default(),
            relief_lods: LodRange::ALL,
            texture_threshold: 0.1,
            texture_noise: 0.0,
        }
    }
}

/// Outcome of one [`HeightmapGround::collect`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectReport {
    /// Tiles emitted to the collector.
    pub collected: usize,
    /// Tiles generated, missing ancestors included.
    pub generated: usize,
    /// Cache entries evicted afterwards.
    pub evicted: usize,
    /// Emitted tiles per level.
    pub per_lod: BTreeMap<u8, usize>,
}

struct WorkerEntry {
    id: WorkerId,
    range: LodRange,
    worker: Box<dyn TerrainWorker>,
}

/// An infinite heightmap ground made of LOD tiles.
///
/// Tiles are generated on demand by the registered workers, coarse levels
/// first, and kept in a cache that is trimmed to `cache_budget` entries after
/// every collect. A tile is never generated before its parent, and a cached
/// tile's ancestors stay cached.
pub struct HeightmapGround {
    params: GroundParams,
    system: TileSystem,
    tiles: GridStorage<GroundTile>,
    reducer: StorageReducer,
    workers: Vec<WorkerEntry>,
    next_worker: usize,
}

impl HeightmapGround {
    /// # Errors
    ///
    /// [`GroundError::InvalidTerrainResolution`] for fewer than 2 samples per
    /// side, or a tile system error for an invalid size or level count.
    pub fn new(params: GroundParams) -> Result<Self, GroundError> {
        if params.terrain_resolution < 2 {
            return Err(GroundError::InvalidTerrainResolution(params.terrain_resolution));
        }
        let system = TileSystem::new(
            params.max_lod,
            DVec3::new(params.unit_size, params.unit_size, 0.0),
            (params.terrain_resolution - 1) as u32,
            2,
        )?;
        let reducer = StorageReducer::new(system, params.cache_budget);
        let tiles = GridStorage::with_clock(reducer.clock());
        Ok(Self {
            params,
            system,
            tiles,
            reducer,
            workers: Vec::new(),
            next_worker: 0,
        })
    }

    #[must_use]
    pub fn params(&self) -> &GroundParams {
        &self.params
    }

    #[must_use]
    pub fn tile_system(&self) -> &TileSystem {
        &self.system
    }

    // --- Workers ---

    /// Append `worker` to the pipeline, active on every level.
    pub fn add_worker<W: TerrainWorker>(&mut self, mut worker: W) -> WorkerId {
        if let Some(storage) = worker.storage_mut() {
            self.reducer.register(storage);
        }
        let id = WorkerId(self.next_worker);
        self.next_worker += 1;
        debug!(worker = worker.name(), %id, "added terrain worker");
        self.workers.push(WorkerEntry {
            id,
            range: LodRange::ALL,
            worker: Box::new(worker),
        });
        id
    }

    /// Restrict a worker to levels `min..=max`.
    ///
    /// # Errors
    ///
    /// [`GroundError::InvalidLodRange`] if `min > max`,
    /// [`GroundError::WorkerNotFound`] for an unknown id.
    pub fn set_lod_range(&mut self, id: WorkerId, min: u8, max: u8) -> Result<(), GroundError> {
        let range = LodRange::new(min, max)?;
        let max_lod = self.system.max_lod();
        let entry = self
            .workers
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(GroundError::WorkerNotFound(id))?;
        if min > max_lod {
            warn!(worker = entry.worker.name(), min, max_lod, "worker lod range never matches");
        }
        entry.range = range;
        Ok(())
    }

    #[must_use]
    pub fn lod_range(&self, id: WorkerId) -> Option<LodRange> {
        self.workers.iter().find(|e| e.id == id).map(|e| e.range)
    }

    /// The worker added under `id`, if it is a `W`.
    #[must_use]
    pub fn worker<W: TerrainWorker>(&self, id: WorkerId) -> Option<&W> {
        let entry = self.workers.iter().find(|e| e.id == id)?;
        let worker: &dyn TerrainWorker = &*entry.worker;
        let any: &dyn Any = worker;
        any.downcast_ref()
    }

    pub fn worker_mut<W: TerrainWorker>(&mut self, id: WorkerId) -> Option<&mut W> {
        let entry = self.workers.iter_mut().find(|e| e.id == id)?;
        let worker: &mut dyn TerrainWorker = &mut *entry.worker;
        let any: &mut dyn Any = worker;
        any.downcast_mut()
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Heights, relief and a three layer texture (rock, grass, snow).
    ///
    /// # Errors
    ///
    /// Invalid relief settings or level ranges. Relief settings are checked
    /// before any worker is added.
    pub fn set_default_worker_set(&mut self, options: &DefaultWorkerOptions) -> Result<(), GroundError> {
        let seed = self.params.seed;
        let modifier = ReliefMapModifier::new(seed, options.relief_map_size, options.relief.clone())?;
        let heights = match &options.heights {
            HeightSource::DiamondSquare { jitter } => {
                self.add_worker(DiamondSquareTerrain::new(seed, *jitter))
            }
            HeightSource::Fbm(params) => self.add_worker(FbmTerrainGenerator::new(FbmParams {
                seed,
                ..params.clone()
            })),
        };
        self.set_lod_range(heights, options.height_lods.min, options.height_lods.max)?;

        let relief = self.add_worker(modifier);
        self.set_lod_range(relief, options.relief_lods.min, options.relief_lods.max)?;

        let mut texturer = MultilayerGroundTexture::new(seed);
        let threshold = options.texture_threshold;
        texturer
            .add_layer(LayerParams {
                name: "rock".into(),
                height: Ramp::full(),
                slope: Ramp::new(0.3, 0.5, 1.0, 1.0),
                threshold,
            })
            .add_layer(LayerParams {
                name: "grass".into(),
                height: Ramp::new(-1.0, 0.0, 0.55, 0.7),
                slope: Ramp::new(-1.0, 0.0, 0.35, 0.5),
                threshold,
            })
            .add_layer(LayerParams {
                name: "snow".into(),
                height: Ramp::new(0.7, 0.85, 1.0, 1.0),
                slope: Ramp::new(-1.0, 0.0, 0.4, 0.6),
                threshold,
            });
        texturer.set_noise(options.texture_noise, 0.05);
        texturer.set_texture_provider(ColorTextureProvider::new(&[
            [160, 160, 160, 255],
            [72, 132, 65, 255],
            [244, 252, 250, 255],
        ]));
        self.add_worker(texturer);
        Ok(())
    }

    // --- Cache ---

    #[must_use]
    pub fn is_generated(&self, coords: &TileCoordinates) -> bool {
        self.tiles.has(coords)
    }

    /// A cached tile, without generating or touching it.
    #[must_use]
    pub fn tile(&self, coords: &TileCoordinates) -> Option<&GroundTile> {
        self.tiles.get(coords)
    }

    #[must_use]
    pub fn cached_tile_count(&self) -> usize {
        self.tiles.size()
    }

    pub fn cached_tiles(&self) -> impl Iterator<Item = &TileCoordinates> {
        self.tiles.keys()
    }

    /// Change the entry budget applied after the next collect.
    pub fn set_cache_budget(&mut self, budget: usize) {
        self.params.cache_budget = budget;
        self.reducer.set_budget(budget);
    }

    #[must_use]
    pub fn reducer_stats(&self) -> ReducerStats {
        self.reducer.stats()
    }

    /// Trim the tile cache and every worker store to the budget.
    pub fn reduce_storage(&mut self) -> ReduceReport {
        let mut stores: Vec<&mut dyn ReducibleStorage> = Vec::with_capacity(1 + self.workers.len());
        stores.push(&mut self.tiles);
        for entry in &mut self.workers {
            if let Some(storage) = entry.worker.storage_mut() {
                stores.push(storage);
            }
        }
        self.reducer.reduce(&mut stores)
    }

    // --- Exploration ---

    /// Generate what `model` needs and emit it into `collector`.
    ///
    /// The model is expressed in the world of `ctx`; the ground sits at
    /// `ctx.offset()`. Items are emitted under keys prefixed by `ctx`, into
    /// whichever of the `Terrain`, `Image` and `TerrainMesh` channels are
    /// open.
    ///
    /// # Errors
    ///
    /// Traversal errors, [`GroundError::TooManyTiles`] before anything is
    /// generated, or the first worker error. A failed batch leaves no tile
    /// of that batch in the cache.
    pub fn collect(
        &mut self,
        collector: &mut Collector,
        model: &dyn ResolutionModel,
        ctx: &ExplorationContext,
    ) -> Result<CollectReport, GroundError> {
        let prefix = ctx.prefix().join("/");
        let _span = info_span!("collect", prefix = %prefix).entered();

        let local = OffsetResolution::new(model, ctx.offset());
        let limit = self.params.max_tiles_per_collect;
        let candidates = limit.saturating_mul(usize::from(self.system.max_lod()) + 1);
        let mut tiles = self.system.iterate(&local)?.with_candidate_limit(candidates);
        let mut needed = Vec::new();
        for coords in tiles.by_ref() {
            if needed.len() == limit {
                return Err(GroundError::TooManyTiles { limit });
            }
            needed.push(coords);
        }
        if tiles.is_truncated() {
            return Err(GroundError::TooManyTiles { limit });
        }

        let missing: Vec<TileCoordinates> = needed
            .iter()
            .filter(|coords| !self.tiles.has(coords))
            .copied()
            .collect();
        let generated = self.generate(missing)?;

        let mut report = CollectReport {
            collected: needed.len(),
            generated,
            ..CollectReport::default()
        };
        for coords in &needed {
            self.emit(collector, coords, ctx)?;
            *report.per_lod.entry(coords.lod).or_default() += 1;
        }

        report.evicted = self.reduce_storage().evicted;
        info!(
            collected = report.collected,
            generated = report.generated,
            evicted = report.evicted,
            cached = self.tiles.size(),
            "collected ground"
        );
        Ok(report)
    }

    /// Altitude at world `(x, y)` as seen at `resolution`, generating the
    /// tile (and its ancestors) if needed.
    ///
    /// # Errors
    ///
    /// Any worker error raised while generating.
    pub fn observe_altitude_at(&mut self, x: f64, y: f64, resolution: f64) -> Result<f64, GroundError> {
        let lod = self.system.lod_for(resolution);
        let position = DVec3::new(x, y, 0.0);
        let coords = self.system.tile_coordinates(position, lod);
        let local = self.system.local_coordinates(position, lod);

        let height = self.provide(&coords)?.terrain.exact_height_at(local.x, local.y);
        self.reduce_storage();
        let (min, max) = (self.params.min_altitude, self.params.max_altitude);
        Ok(min + (max - min) * height)
    }

    /// Blend `image` over the textures of every tile of `lods` intersecting
    /// the rectangle `origin..origin + size`, stretching it over the
    /// rectangle. Returns the number of tiles painted.
    ///
    /// # Errors
    ///
    /// Any worker error raised while generating a missing tile.
    pub fn paint_texture(
        &mut self,
        origin: DVec2,
        size: DVec2,
        lods: RangeInclusive<u8>,
        image: &Image,
    ) -> Result<usize, GroundError> {
        if size.x <= 0.0 || size.y <= 0.0 || image.width() == 0 || image.height() == 0 {
            return Ok(0);
        }
        let max = origin + size;
        let max_lod = self.system.max_lod();
        let mut painted = 0;
        for lod in lods.filter(|lod| *lod <= max_lod) {
            let low = self.system.tile_coordinates(origin.extend(0.0), lod);
            let high = self.system.tile_coordinates(max.extend(0.0), lod);
            for x in low.x..=high.x {
                for y in low.y..=high.y {
                    let coords = TileCoordinates::new_2d(x, y, lod);
                    self.provide(&coords)?;
                    let Some(tile) = self.tiles.get_mut(&coords) else {
                        return Err(GroundError::TileNotGenerated(coords));
                    };
                    let bounds = tile.terrain.bounding_box();
                    paint(
                        &mut tile.texture,
                        bounds.min.truncate(),
                        bounds.dimensions().truncate(),
                        origin,
                        size,
                        image,
                    );
                    painted += 1;
                }
            }
        }
        Ok(painted)
    }

    // --- Generation ---

    /// The cached tile at `coords`, generating it and its ancestors first.
    fn provide(&mut self, coords: &TileCoordinates) -> Result<&GroundTile, GroundError> {
        if !self.tiles.has(coords) {
            self.generate(vec![*coords])?;
        }
        self.tiles.touch(coords);
        self.tiles.get(coords).ok_or(GroundError::TileNotGenerated(*coords))
    }

    /// `coords` plus every ancestor that is not cached.
    fn with_ungenerated_parents(&self, coords: Vec<TileCoordinates>) -> BTreeSet<TileCoordinates> {
        let mut all: BTreeSet<TileCoordinates> = BTreeSet::new();
        let mut pending = coords;
        while let Some(key) = pending.pop() {
            if !all.insert(key) {
                continue;
            }
            if let Some(parent) = self.system.parent_coordinates(&key)
                && !self.tiles.has(&parent)
            {
                pending.push(parent);
            }
        }
        all
    }

    /// Generate `coords` and missing ancestors, one level at a time, coarse
    /// first. Returns the number of tiles generated.
    fn generate(&mut self, coords: Vec<TileCoordinates>) -> Result<usize, GroundError> {
        let all = self.with_ungenerated_parents(coords);
        let mut batches: BTreeMap<u8, Vec<TileCoordinates>> = BTreeMap::new();
        for key in &all {
            batches.entry(key.lod).or_default().push(*key);
        }

        for (lod, keys) in batches {
            let _span = debug_span!("lod_batch", lod).entered();
            let batch = self.generate_batch(lod, &keys)?;
            for tile in batch {
                self.tiles.insert(tile.coords(), tile);
            }
            debug!(tiles = keys.len(), "generated lod batch");
        }
        Ok(all.len())
    }

    fn generate_batch(&mut self, lod: u8, keys: &[TileCoordinates]) -> Result<Vec<GroundTile>, GroundError> {
        let p = &self.params;
        let mut batch = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(parent) = self.system.parent_coordinates(key)
                && !self.tiles.has(&parent)
            {
                return Err(GroundError::MissingParent(parent));
            }
            batch.push(GroundTile::new(
                *key,
                &self.system,
                p.terrain_resolution,
                p.texture_resolution,
                p.min_altitude,
                p.max_altitude,
            ));
        }

        for entry in self.workers.iter_mut().filter(|e| e.range.contains(lod)) {
            for tile in &mut batch {
                let coords = tile.coords();
                let parent = self
                    .system
                    .parent_coordinates(&coords)
                    .and_then(|parent| self.tiles.get(&parent));
                let mut ctx = TileContext {
                    coords,
                    tile,
                    parent,
                    system: &self.system,
                    min_altitude: self.params.min_altitude,
                    max_altitude: self.params.max_altitude,
                };
                entry.worker.process_tile(&mut ctx)?;
            }
            entry.worker.flush()?;
        }
        Ok(batch)
    }

    fn emit(
        &mut self,
        collector: &mut Collector,
        coords: &TileCoordinates,
        ctx: &ExplorationContext,
    ) -> Result<(), GroundError> {
        self.tiles.touch(coords);
        let tile = self
            .tiles
            .get(coords)
            .ok_or(GroundError::TileNotGenerated(*coords))?;
        let key = ctx.mutate_key(&ItemKey::from_tile(coords));

        let mut terrain = tile.terrain.clone();
        terrain.set_bounds(terrain.bounding_box().translated(ctx.offset()));

        if collector.has_channel::<TerrainMesh>() {
            let [left, right, bottom, top] = coords
                .neighbours_2d()
                .map(|n| self.tiles.get(&n).map(|t| &t.terrain));
            let neighbours = Neighbourhood {
                left,
                right,
                bottom,
                top,
            };
            let mesh = TerrainMesh::from_terrain(&terrain, &neighbours);
            if let Some(channel) = collector.channel_mut::<TerrainMesh>() {
                channel.put(key.clone(), mesh);
            }
        }
        if let Some(channel) = collector.channel_mut::<Image>() {
            channel.put(key.clone(), tile.texture.clone());
        }
        if let Some(channel) = collector.channel_mut::<Terrain>() {
            channel.put(key, terrain);
        }
        Ok(())
    }
}

/// Blend the part of `image` stretched over `origin..origin + size` onto a
/// texture covering `tile_min..tile_min + tile_size`.
fn paint(texture: &mut Image, tile_min: DVec2, tile_size: DVec2, origin: DVec2, size: DVec2, image: &Image) {
    let (w, h) = (texture.width(), texture.height());
    let step = DVec2::new(f64::from(w.max(2) - 1), f64::from(h.max(2) - 1));
    let last = DVec2::new(f64::from(image.width() - 1), f64::from(image.height() - 1));
    for y in 0..h {
        for x in 0..w {
            let world = tile_min + DVec2::new(f64::from(x), f64::from(y)) / step * tile_size;
            let rel = (world - origin) / size;
            if !(0.0..=1.0).contains(&rel.x) || !(0.0..=1.0).contains(&rel.y) {
                continue;
            }
            let src = (rel * last).round();
            let texel = image.rgba(src.x as u32, src.y as u32);
            let alpha = to_float(texel[3]);
            if alpha <= 0.0 {
                continue;
            }
            let dest = texture.rgba(x, y);
            let blend = |o: u8, t: u8| from_float(to_float(o) * (1.0 - alpha) + to_float(t) * alpha);
            let oa = to_float(dest[3]);
            texture.set_rgba(
                x,
                y,
                [
                    blend(dest[0], texel[0]),
                    blend(dest[1], texel[1]),
                    blend(dest[2], texel[2]),
                    from_float(oa + (1.0 - oa) * alpha),
                ],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelFormat;

    fn small_params() -> GroundParams {
        GroundParams {
            unit_size: 100.0,
            max_lod: 3,
            terrain_resolution: 9,
            texture_resolution: 8,
            min_altitude: 0.0,
            max_altitude: 10.0,
            ..GroundParams::default()
        }
    }

    #[test]
    fn test_rejects_degenerate_resolution() {
        let params = GroundParams {
            terrain_resolution: 1,
            ..small_params()
        };
        assert!(matches!(
            HeightmapGround::new(params),
            Err(GroundError::InvalidTerrainResolution(1))
        ));
    }

    #[test]
    fn test_tile_system_matches_terrain() {
        let ground = HeightmapGround::new(small_params()).unwrap();
        let system = ground.tile_system();
        assert_eq!(system.buffer_resolution(), 8);
        assert_eq!(system.tile_size(1).x, 50.0);
        // Samples per unit at lod 0: 8 intervals over 100 units.
        assert!((system.resolution_at(0) - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_worker_lookup_and_ranges() {
        let mut ground = HeightmapGround::new(small_params()).unwrap();
        let id = ground.add_worker(DiamondSquareTerrain::new(1, 0.3));
        assert!(ground.worker::<DiamondSquareTerrain>(id).is_some());
        assert!(ground.worker::<FbmTerrainGenerator>(id).is_none(), "wrong type");
        assert_eq!(ground.lod_range(id), Some(LodRange::ALL));

        ground.set_lod_range(id, 1, 2).unwrap();
        assert_eq!(ground.lod_range(id), Some(LodRange { min: 1, max: 2 }));
        assert!(matches!(
            ground.set_lod_range(id, 2, 1),
            Err(GroundError::InvalidLodRange { min: 2, max: 1 })
        ));
        assert!(matches!(
            ground.set_lod_range(WorkerId(99), 0, 1),
            Err(GroundError::WorkerNotFound(WorkerId(99)))
        ));
    }

    #[test]
    fn test_default_worker_set() {
        let mut ground = HeightmapGround::new(small_params()).unwrap();
        ground.set_default_worker_set(&DefaultWorkerOptions::default()).unwrap();
        assert_eq!(ground.worker_count(), 3);
        let texturer = ground
            .worker::<MultilayerGroundTexture>(WorkerId(2))
            .unwrap();
        let names: Vec<&str> = texturer.layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["rock", "grass", "snow"]);
    }

    #[test]
    fn test_ancestors_are_added() {
        let ground = HeightmapGround::new(small_params()).unwrap();
        let all = ground.with_ungenerated_parents(vec![
            TileCoordinates::new_2d(5, 3, 3),
            TileCoordinates::new_2d(4, 2, 3),
        ]);
        let lods: Vec<u8> = all.iter().map(|c| c.lod).collect();
        assert_eq!(lods, [0, 1, 2, 3, 3], "one chain shared by both tiles");
    }

    #[test]
    fn test_paint_texture() {
        let mut ground = HeightmapGround::new(small_params()).unwrap();
        let red = Image::filled(2, 2, PixelFormat::Rgba, [255, 0, 0, 255]);
        let painted = ground
            .paint_texture(DVec2::new(0.0, 0.0), DVec2::new(50.0, 50.0), 0..=1, &red)
            .unwrap();
        // One lod-0 tile, and at lod 1 the corner touches 4 tiles.
        assert_eq!(painted, 5);
        let tile = ground.tile(&TileCoordinates::new_2d(0, 0, 1)).unwrap();
        assert_eq!(tile.texture.rgba(3, 3), [255, 0, 0, 255]);
        let tile = ground.tile(&TileCoordinates::new_2d(0, 0, 0)).unwrap();
        assert_eq!(tile.texture.rgba(7, 7), [0, 0, 0, 0], "outside the rectangle");
    }
}
