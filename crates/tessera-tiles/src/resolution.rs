//! Resolution models: how much detail is wanted where.

use glam::DVec3;

use crate::BoundingBox;

/// Describes the sampling density (points per world unit) a caller needs.
pub trait ResolutionModel {
    /// Region over which the model requests any detail.
    fn bounds(&self) -> BoundingBox;

    /// Highest resolution requested anywhere inside `bbox`.
    ///
    /// Must not increase when `bbox` shrinks; traversal relies on a child
    /// tile never asking for more than its parent.
    fn max_resolution_in(&self, bbox: &BoundingBox) -> f64;
}

/// The same resolution everywhere inside `bounds`, nothing outside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantResolution {
    bounds: BoundingBox,
    resolution: f64,
}

impl ConstantResolution {
    #[must_use]
    pub fn new(bounds: BoundingBox, resolution: f64) -> Self {
        Self { bounds, resolution }
    }
}

impl ResolutionModel for ConstantResolution {
    fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    fn max_resolution_in(&self, bbox: &BoundingBox) -> f64 {
        if self.bounds.intersects(bbox) {
            self.resolution
        } else {
            0.0
        }
    }
}

/// First-person view: detail falls off with distance from an eye point.
///
/// At distance `d` the requested resolution is
/// `angular_resolution / max(d, near)`; beyond `far` nothing is requested.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceResolution {
    eye: DVec3,
    angular_resolution: f64,
    near: f64,
    far: f64,
}

impl DistanceResolution {
    /// `near` is clamped to a small positive value so the eye itself does not
    /// request infinite detail.
    #[must_use]
    pub fn new(eye: DVec3, angular_resolution: f64, near: f64, far: f64) -> Self {
        Self {
            eye,
            angular_resolution,
            near: near.max(1e-6),
            far,
        }
    }

    #[must_use]
    pub fn eye(&self) -> DVec3 {
        self.eye
    }

    /// Resolution requested at a distance `d` from the eye.
    #[must_use]
    pub fn resolution_at_distance(&self, d: f64) -> f64 {
        if d > self.far {
            0.0
        } else {
            self.angular_resolution / d.max(self.near)
        }
    }
}

impl ResolutionModel for DistanceResolution {
    fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.eye - DVec3::splat(self.far), self.eye + DVec3::splat(self.far))
    }

    fn max_resolution_in(&self, bbox: &BoundingBox) -> f64 {
        let nearest = bbox.nearest_point(self.eye);
        self.resolution_at_distance(self.eye.distance(nearest))
    }
}

/// Presents a model in a frame translated by `offset`.
///
/// A tile system placed at `offset` in the model's world sees the model's
/// bounds shifted by `-offset`, and its local boxes are shifted back by
/// `+offset` before querying.
pub struct OffsetResolution<'a, M: ResolutionModel + ?Sized> {
    inner: &'a M,
    offset: DVec3,
}

impl<'a, M: ResolutionModel + ?Sized> OffsetResolution<'a, M> {
    #[must_use]
    pub fn new(inner: &'a M, offset: DVec3) -> Self {
        Self { inner, offset }
    }
}

impl<M: ResolutionModel + ?Sized> ResolutionModel for OffsetResolution<'_, M> {
    fn bounds(&self) -> BoundingBox {
        self.inner.bounds().translated(-self.offset)
    }

    fn max_resolution_in(&self, bbox: &BoundingBox) -> f64 {
        self.inner.max_resolution_in(&bbox.translated(self.offset))
    }
}
