//! CPU-side triangle meshes of terrains.

use glam::DVec3;

use crate::terrain::Terrain;

/// Terrains adjacent to the one being meshed, used to compute normals
/// across tile edges. Missing neighbours fall back to one-sided differences.
#[derive(Clone, Copy, Debug, Default)]
pub struct Neighbourhood<'a> {
    pub left: Option<&'a Terrain>,
    pub right: Option<&'a Terrain>,
    pub bottom: Option<&'a Terrain>,
    pub top: Option<&'a Terrain>,
}

/// Indexed triangle list of a terrain, in world coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TerrainMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl TerrainMesh {
    /// One vertex per sample, two counter-clockwise triangles per cell.
    #[must_use]
    pub fn from_terrain(terrain: &Terrain, neighbours: &Neighbourhood<'_>) -> Self {
        let res = terrain.resolution();
        let mut mesh = TerrainMesh {
            positions: Vec::with_capacity(res * res),
            normals: Vec::with_capacity(res * res),
            uvs: Vec::with_capacity(res * res),
            indices: Vec::with_capacity(res.saturating_sub(1).pow(2) * 6),
        };
        let step = (res.max(2) - 1) as f32;

        for y in 0..res {
            for x in 0..res {
                let p = terrain.sample_position(x, y);
                mesh.positions.push(p.as_vec3().to_array());
                mesh.normals
                    .push(normal_at(terrain, neighbours, x, y).as_vec3().to_array());
                mesh.uvs.push([x as f32 / step, y as f32 / step]);
            }
        }

        for y in 0..res.saturating_sub(1) {
            for x in 0..res.saturating_sub(1) {
                let i = (y * res + x) as u32;
                let right = i + 1;
                let up = i + res as u32;
                let diag = up + 1;
                mesh.indices.extend_from_slice(&[i, right, diag, i, diag, up]);
            }
        }
        mesh
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

fn normal_at(terrain: &Terrain, neighbours: &Neighbourhood<'_>, x: usize, y: usize) -> DVec3 {
    let res = terrain.resolution();
    if res < 2 {
        return DVec3::Z;
    }
    let last = res - 1;
    let height = |t: &Terrain, x: usize, y: usize| t.sample_position(x, y).z;

    // Samples on either side, reaching into a neighbour across an edge.
    let (west, west_dx) = match (x, neighbours.left) {
        (0, Some(left)) => (height(left, last - 1, y), 1.0),
        (0, None) => (height(terrain, 0, y), 0.0),
        _ => (height(terrain, x - 1, y), 1.0),
    };
    let (east, east_dx) = match (x == last, neighbours.right) {
        (true, Some(right)) => (height(right, 1, y), 1.0),
        (true, None) => (height(terrain, last, y), 0.0),
        _ => (height(terrain, x + 1, y), 1.0),
    };
    let (south, south_dy) = match (y, neighbours.bottom) {
        (0, Some(bottom)) => (height(bottom, x, last - 1), 1.0),
        (0, None) => (height(terrain, x, 0), 0.0),
        _ => (height(terrain, x, y - 1), 1.0),
    };
    let (north, north_dy) = match (y == last, neighbours.top) {
        (true, Some(top)) => (height(top, x, 1), 1.0),
        (true, None) => (height(terrain, x, last), 0.0),
        _ => (height(terrain, x, y + 1), 1.0),
    };

    let dims = terrain.bounding_box().dimensions();
    let cell_x = dims.x / last as f64;
    let cell_y = dims.y / last as f64;
    let dzdx = (east - west) / ((west_dx + east_dx) * cell_x).max(f64::EPSILON);
    let dzdy = (north - south) / ((south_dy + north_dy) * cell_y).max(f64::EPSILON);
    DVec3::new(-dzdx, -dzdy, 1.0).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_tiles::BoundingBox;

    fn placed(res: usize, min_x: f64) -> Terrain {
        let mut terrain = Terrain::new(res);
        terrain.set_bounds(BoundingBox::new(
            DVec3::new(min_x, 0.0, 0.0),
            DVec3::new(min_x + 8.0, 8.0, 8.0),
        ));
        terrain
    }

    #[test]
    fn test_flat_mesh_layout() {
        let terrain = placed(3, 0.0);
        let mesh = TerrainMesh::from_terrain(&terrain, &Neighbourhood::default());
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.triangle_count(), 8);
        assert_eq!(mesh.positions[8], [8.0, 8.0, 0.0]);
        assert_eq!(mesh.uvs[4], [0.5, 0.5]);
        assert!(mesh.normals.iter().all(|n| *n == [0.0, 0.0, 1.0]));
        assert!(mesh.indices.iter().all(|i| (*i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn test_edge_normals_match_across_neighbours() {
        // A ramp continuing across two tiles: z rises 1 per x unit.
        let mut left = placed(5, 0.0);
        let mut right = placed(5, 8.0);
        for y in 0..5 {
            for x in 0..5 {
                left.set(x, y, x as f64 * 2.0 / 8.0 / 2.0);
                right.set(x, y, 0.5 + x as f64 * 2.0 / 8.0 / 2.0);
            }
        }
        let left_mesh = TerrainMesh::from_terrain(
            &left,
            &Neighbourhood {
                right: Some(&right),
                ..Neighbourhood::default()
            },
        );
        let right_mesh = TerrainMesh::from_terrain(
            &right,
            &Neighbourhood {
                left: Some(&left),
                ..Neighbourhood::default()
            },
        );
        // Last column of the left tile and first column of the right tile.
        for y in 0..5 {
            let a = left_mesh.normals[y * 5 + 4];
            let b = right_mesh.normals[y * 5];
            for axis in 0..3 {
                assert!((a[axis] - b[axis]).abs() < 1e-6, "seam normal mismatch at row {y}");
            }
        }
    }
}
