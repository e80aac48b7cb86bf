//! Texturing by blending layers masked on altitude and slope.

use noise::{NoiseFn, Simplex};
use tessera_storage::{GridStorage, ReducibleStorage};
use tessera_tiles::TileCoordinates;

use crate::GroundError;
use crate::image::{Image, PixelFormat, from_float, to_float};
use crate::terrain::Terrain;
use crate::worker::{TerrainWorker, TileContext};

/// Trapezoid `clamp(min((x - a) / (b - a), (d - x) / (d - c)), min, max)`.
///
/// Rises over `[a, b]`, plateaus over `[b, c]` and falls over `[c, d]`. A
/// degenerate side (`a == b` or `c == d`) is a hard step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ramp {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub min: f64,
    pub max: f64,
}

impl Ramp {
    #[must_use]
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            a,
            b,
            c,
            d,
            min: 0.0,
            max: 1.0,
        }
    }

    /// 1 everywhere.
    #[must_use]
    pub fn full() -> Self {
        Self {
            min: 1.0,
            ..Self::new(0.0, 0.0, 1.0, 1.0)
        }
    }

    #[must_use]
    pub fn eval(&self, x: f64) -> f64 {
        let rising = if self.b > self.a {
            (x - self.a) / (self.b - self.a)
        } else if x >= self.a {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
        let falling = if self.d > self.c {
            (self.d - x) / (self.d - self.c)
        } else if x <= self.d {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
        rising.min(falling).clamp(self.min, self.max)
    }
}

/// Where one texture layer appears.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerParams {
    pub name: String,
    /// Ramp over normalised height.
    pub height: Ramp,
    /// Ramp over steepness, `atan(slope) * 2 / pi`.
    pub slope: Ramp,
    /// Half-width of the smooth step turning ramp values into a mask.
    pub threshold: f64,
}

/// Source of layer textures.
pub trait TextureProvider {
    /// Texture of `layer` for tiles at `lod`.
    fn texture(&self, layer: usize, lod: u8) -> Option<&Image>;
}

/// One uniform colour per layer, at every level.
#[derive(Clone, Debug)]
pub struct ColorTextureProvider {
    textures: Vec<Image>,
}

impl ColorTextureProvider {
    #[must_use]
    pub fn new(colors: &[[u8; 4]]) -> Self {
        Self {
            textures: colors
                .iter()
                .map(|c| Image::filled(1, 1, PixelFormat::Rgba, *c))
                .collect(),
        }
    }
}

impl TextureProvider for ColorTextureProvider {
    fn texture(&self, layer: usize, _lod: u8) -> Option<&Image> {
        self.textures.get(layer)
    }
}

/// Layer masks of one tile, in layer order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerDistributions(pub Vec<Terrain>);

/// Composites textures of several layers onto each tile's texture.
///
/// For each layer a mask is computed per height sample from the layer's
/// height and slope ramps, then the layer texture is blended over the tile
/// texture with the mask times the texel alpha. Texture pixels where no layer
/// contributes are left untouched.
pub struct MultilayerGroundTexture {
    layers: Vec<LayerParams>,
    provider: Option<Box<dyn TextureProvider>>,
    noise: Simplex,
    noise_amplitude: f64,
    noise_frequency: f64,
    distributions: GridStorage<LayerDistributions>,
}

impl MultilayerGroundTexture {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            layers: Vec::new(),
            provider: None,
            noise: Simplex::new(seed.wrapping_add(0x7E57_0000) as u32),
            noise_amplitude: 0.0,
            noise_frequency: 0.05,
            distributions: GridStorage::new(),
        }
    }

    pub fn add_layer(&mut self, layer: LayerParams) -> &mut Self {
        self.layers.push(layer);
        self
    }

    #[must_use]
    pub fn layers(&self) -> &[LayerParams] {
        &self.layers
    }

    pub fn set_texture_provider(&mut self, provider: impl TextureProvider + 'static) {
        self.provider = Some(Box::new(provider));
    }

    /// Perturb mask thresholds with world-space noise of this amplitude.
    pub fn set_noise(&mut self, amplitude: f64, frequency: f64) {
        self.noise_amplitude = amplitude;
        self.noise_frequency = frequency;
    }

    /// Masks computed for `coords`, if still cached.
    #[must_use]
    pub fn distributions(&self, coords: &TileCoordinates) -> Option<&LayerDistributions> {
        self.distributions.get(coords)
    }

    /// Mask of `layer` over the samples of `terrain`.
    #[must_use]
    pub fn distribution(&self, terrain: &Terrain, layer: &LayerParams) -> Terrain {
        let res = terrain.resolution();
        let step = (res.max(2) - 1) as f64;
        let mut mask = Terrain::new(res);
        mask.set_bounds(terrain.bounding_box());

        for y in 0..res {
            for x in 0..res {
                let (u, v) = (x as f64 / step, y as f64 / step);
                let h = terrain.exact_height_at(u, v);
                let dh = terrain.steepness_at(u, v);
                let r = layer.height.eval(h) * layer.slope.eval(dh);

                let t = if self.noise_amplitude == 0.0 {
                    0.5
                } else {
                    let p = terrain.sample_position(x, y) * self.noise_frequency;
                    0.5 + self.noise_amplitude * self.noise.get([p.x, p.y])
                };
                mask.set(x, y, mask_value(r, t, layer.threshold));
            }
        }
        mask
    }
}

/// 1 well above the noise level `t`, 0 well below, smooth in between.
fn mask_value(r: f64, t: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return if r > t { 1.0 } else { 0.0 };
    }
    smoothstep(r + threshold, r - threshold, t)
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Blend `texture`, masked by `mask`, over `image`.
fn composite(image: &mut Image, mask: &Terrain, texture: &Image, coords: &TileCoordinates) {
    let (w, h) = (image.width(), image.height());
    let (tw, th) = (i64::from(texture.width()), i64::from(texture.height()));
    if tw == 0 || th == 0 {
        return;
    }
    let ox = i64::from(coords.x) * i64::from(w);
    let oy = i64::from(coords.y) * i64::from(h);
    let du = f64::from(w.max(2) - 1);
    let dv = f64::from(h.max(2) - 1);

    for y in 0..h {
        for x in 0..w {
            let p = mask.exact_height_at(f64::from(x) / du, f64::from(y) / dv);
            let tx = (ox + i64::from(x)).rem_euclid(tw) as u32;
            let ty = (oy + i64::from(y)).rem_euclid(th) as u32;
            let texel = texture.rgba(tx, ty);
            let alpha = p * to_float(texel[3]);
            if alpha <= 0.0 {
                continue;
            }

            let origin = image.rgba(x, y);
            let blend = |o: u8, t: u8| from_float(to_float(o) * (1.0 - alpha) + to_float(t) * alpha);
            let oa = to_float(origin[3]);
            image.set_rgba(
                x,
                y,
                [
                    blend(origin[0], texel[0]),
                    blend(origin[1], texel[1]),
                    blend(origin[2], texel[2]),
                    from_float(oa + (1.0 - oa) * alpha),
                ],
            );
        }
    }
}

impl TerrainWorker for MultilayerGroundTexture {
    fn name(&self) -> &str {
        "multilayer-texture"
    }

    fn process_tile(&mut self, ctx: &mut TileContext<'_>) -> Result<(), GroundError> {
        let provider = self
            .provider
            .as_deref()
            .ok_or(GroundError::MissingTextureProvider)?;
        let lod = ctx.coords.lod;
        let textures = (0..self.layers.len())
            .map(|layer| {
                provider
                    .texture(layer, lod)
                    .ok_or(GroundError::MissingLayerTexture { layer, lod })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut masks = Vec::with_capacity(self.layers.len());
        for (layer, texture) in self.layers.iter().zip(textures) {
            let mask = self.distribution(&ctx.tile.terrain, layer);
            composite(&mut ctx.tile.texture, &mask, texture, &ctx.coords);
            masks.push(mask);
        }
        self.distributions
            .insert(ctx.coords, LayerDistributions(masks));
        Ok(())
    }

    fn storage_mut(&mut self) -> Option<&mut dyn ReducibleStorage> {
        Some(&mut self.distributions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_shape() {
        let ramp = Ramp::new(0.2, 0.4, 0.6, 0.8);
        assert_eq!(ramp.eval(0.0), 0.0);
        assert!((ramp.eval(0.3) - 0.5).abs() < 1e-12);
        assert_eq!(ramp.eval(0.5), 1.0);
        assert!((ramp.eval(0.7) - 0.5).abs() < 1e-12);
        assert_eq!(ramp.eval(1.0), 0.0);
    }

    #[test]
    fn test_degenerate_ramp_is_step() {
        let ramp = Ramp::new(0.5, 0.5, 1.0, 1.0);
        assert_eq!(ramp.eval(0.49), 0.0);
        assert_eq!(ramp.eval(0.5), 1.0);
        assert_eq!(ramp.eval(1.0), 1.0);
        assert_eq!(Ramp::full().eval(-3.0), 1.0);
    }

    #[test]
    fn test_mask_value() {
        assert_eq!(mask_value(1.0, 0.5, 0.1), 1.0);
        assert_eq!(mask_value(0.0, 0.5, 0.1), 0.0);
        assert!((mask_value(0.5, 0.5, 0.1) - 0.5).abs() < 1e-12);
        assert_eq!(mask_value(0.6, 0.5, 0.0), 1.0);
    }

    #[test]
    fn test_composite_full_mask_paints_texture() {
        let mut image = Image::new(4, 4, PixelFormat::Rgba);
        let mut mask = Terrain::new(3);
        mask.heights_mut().fill(1.0);
        let texture = Image::filled(1, 1, PixelFormat::Rgba, [10, 20, 30, 255]);
        composite(&mut image, &mask, &texture, &TileCoordinates::new_2d(0, 0, 0));
        assert_eq!(image.rgba(2, 3), [10, 20, 30, 255]);
    }

    #[test]
    fn test_composite_wraps_texture_by_tile_position() {
        let mut texture = Image::new(4, 1, PixelFormat::Rgba);
        for x in 0..4 {
            texture.set_rgba(x, 0, [x as u8 * 10, 0, 0, 255]);
        }
        let mut mask = Terrain::new(2);
        mask.heights_mut().fill(1.0);
        let mut image = Image::new(2, 1, PixelFormat::Rgba);
        // Tile x = 1 with 2-pixel images starts at texel 2.
        composite(&mut image, &mask, &texture, &TileCoordinates::new_2d(1, 0, 0));
        assert_eq!(image.rgba(0, 0)[0], 20);
        assert_eq!(image.rgba(1, 0)[0], 30);

        let mut image = Image::new(2, 1, PixelFormat::Rgba);
        composite(&mut image, &mask, &texture, &TileCoordinates::new_2d(-1, 0, 0));
        assert_eq!(image.rgba(0, 0)[0], 20, "negative tiles wrap too");
    }

    #[test]
    fn test_color_provider_layers() {
        let provider = ColorTextureProvider::new(&[[1, 2, 3, 255]]);
        assert!(provider.texture(0, 9).is_some());
        assert!(provider.texture(1, 0).is_none());
    }
}
