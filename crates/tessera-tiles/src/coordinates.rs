//! Integer tile addresses.

use std::fmt;

/// Identifies one tile of a [`TileSystem`](crate::TileSystem).
///
/// - `lod`: level of detail. LOD 0 is the coarsest level; every finer level
///   splits each tile into `factor` parts along every tiled axis.
/// - `x`, `y`, `z`: grid coordinates at that LOD. Axes the tile system does
///   not tile (zero base size) always carry 0.
///
/// `lod` is declared first so that sorted collections group tiles level by
/// level, coarse to fine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoordinates {
    /// Level of detail (0 = coarsest).
    pub lod: u8,
    /// Grid X coordinate at this LOD.
    pub x: i32,
    /// Grid Y coordinate at this LOD.
    pub y: i32,
    /// Grid Z coordinate at this LOD.
    pub z: i32,
}

impl TileCoordinates {
    /// Creates tile coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32, lod: u8) -> Self {
        Self { lod, x, y, z }
    }

    /// Creates coordinates on the ground plane (`z = 0`).
    #[must_use]
    pub const fn new_2d(x: i32, y: i32, lod: u8) -> Self {
        Self::new(x, y, 0, lod)
    }

    /// Returns the tile at the same LOD offset by `(dx, dy, dz)`.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            lod: self.lod,
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// The four axis neighbours on the ground plane, in the order
    /// `[-x, +x, -y, +y]`.
    #[must_use]
    pub fn neighbours_2d(self) -> [Self; 4] {
        [
            self.offset(-1, 0, 0),
            self.offset(1, 0, 0),
            self.offset(0, -1, 0),
            self.offset(0, 1, 0),
        ]
    }

    /// Compact textual id, unique per coordinate: `"{lod}.{x}.{y}.{z}"`.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}.{}.{}.{}", self.lod, self.x, self.y, self.z)
    }
}

impl fmt::Display for TileCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}({}, {}, {})", self.lod, self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_different_lods_never_alias() {
        let a = TileCoordinates::new_2d(1, 2, 0);
        let b = TileCoordinates::new_2d(1, 2, 1);
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_ordering_groups_by_lod() {
        let set: BTreeSet<_> = [
            TileCoordinates::new_2d(-5, 0, 2),
            TileCoordinates::new_2d(7, 7, 0),
            TileCoordinates::new_2d(0, 0, 1),
        ]
        .into_iter()
        .collect();
        let lods: Vec<u8> = set.iter().map(|c| c.lod).collect();
        assert_eq!(lods, vec![0, 1, 2]);
    }

    #[test]
    fn test_neighbours_keep_lod() {
        let c = TileCoordinates::new_2d(3, -4, 2);
        let n = c.neighbours_2d();
        assert_eq!(n[0], TileCoordinates::new_2d(2, -4, 2));
        assert_eq!(n[1], TileCoordinates::new_2d(4, -4, 2));
        assert_eq!(n[2], TileCoordinates::new_2d(3, -5, 2));
        assert_eq!(n[3], TileCoordinates::new_2d(3, -3, 2));
    }

    #[test]
    fn test_offset_saturates() {
        let c = TileCoordinates::new_2d(i32::MAX, i32::MIN, 0);
        let moved = c.offset(1, -1, 0);
        assert_eq!(moved.x, i32::MAX);
        assert_eq!(moved.y, i32::MIN);
    }

    #[test]
    fn test_display() {
        let c = TileCoordinates::new(1, -2, 0, 3);
        assert_eq!(c.to_string(), "L3(1, -2, 0)");
        assert_eq!(c.id(), "3.1.-2.0");
    }
}
