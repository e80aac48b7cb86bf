use glam::DVec3;

/// Axis-aligned bounding box in world space.
///
/// Invariant: `min <= max` on every axis. The constructor enforces this by
/// swapping components if needed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl BoundingBox {
    /// Thickness below which an axis counts as flat.
    pub const FLAT_EPSILON: f64 = 1e-9;

    /// Create a box from two corners. Automatically sorts components so that
    /// min <= max on every axis.
    #[must_use]
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a box from its minimum corner and its size.
    #[must_use]
    pub fn from_min_size(min: DVec3, size: DVec3) -> Self {
        Self::new(min, min + size)
    }

    /// Size of the box along each axis.
    #[must_use]
    pub fn dimensions(&self) -> DVec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns true if the point lies inside or on the boundary.
    #[must_use]
    pub fn contains_point(&self, p: DVec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Returns true if this box overlaps `other` (including touching faces).
    #[must_use]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// The box moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: DVec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// The point of the box closest to `p`.
    #[must_use]
    pub fn nearest_point(&self, p: DVec3) -> DVec3 {
        p.max(self.min).min(self.max)
    }

    /// The same box with every flat axis widened to the full `f64` range.
    ///
    /// A ground tile has no thickness along its height axis; widening it lets
    /// a 3D resolution model be queried over the whole column above and below.
    #[must_use]
    pub fn with_flat_axes_expanded(&self) -> Self {
        let mut out = *self;
        for axis in 0..3 {
            if (self.max[axis] - self.min[axis]).abs() < Self::FLAT_EPSILON {
                out.min[axis] = -f64::MAX;
                out.max[axis] = f64::MAX;
            }
        }
        out
    }

    /// Returns true if both bounds of `axis` are finite.
    #[must_use]
    pub fn is_finite_on(&self, axis: usize) -> bool {
        self.min[axis].is_finite() && self.max[axis].is_finite()
    }
}
