/// Heightfield construction and height queries
use super::noise::NoiseSource;
use crate::config::TerrainSettings;
use crate::mesh::{Mesh, Vertex3D, UV};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Anything that can answer "how high is the ground at (x, z)".
pub trait HeightSampler {
    fn height(&self, x: f32, z: f32) -> f32;
}

impl<F> HeightSampler for F
where
    F: Fn(f32, f32) -> f32,
{
    fn height(&self, x: f32, z: f32) -> f32 {
        self(x, z)
    }
}

/// Immutable grid of terrain heights centred on the world origin.
///
/// Sample `(i, j)` sits at world `(-width/2 + i * cell_x, -depth/2 + j * cell_z)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightGrid {
    /// Samples along X
    columns: usize,
    /// Samples along Z
    rows: usize,
    world_width: f32,
    world_depth: f32,
    /// Row-major: `heights[j * columns + i]`
    heights: Vec<f32>,
}

/// Renderable terrain surface, one vertex per grid sample.
pub type TerrainMesh = Mesh;

impl HeightGrid {
    /// Wraps precomputed heights. `heights.len()` must equal `columns * rows`
    /// and both dimensions must be at least 2.
    pub fn from_heights(
        columns: usize,
        rows: usize,
        world_width: f32,
        world_depth: f32,
        heights: Vec<f32>,
    ) -> Self {
        debug_assert_eq!(heights.len(), columns * rows);
        Self {
            columns,
            rows,
            world_width,
            world_depth,
            heights,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn world_width(&self) -> f32 {
        self.world_width
    }

    pub fn world_depth(&self) -> f32 {
        self.world_depth
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn cell_width(&self) -> f32 {
        self.world_width / (self.columns - 1) as f32
    }

    pub fn cell_depth(&self) -> f32 {
        self.world_depth / (self.rows - 1) as f32
    }

    /// Raw sample at grid coordinates.
    pub fn sample(&self, i: usize, j: usize) -> f32 {
        self.heights[j * self.columns + i]
    }

    /// World position of grid sample `(i, j)` on the XZ plane.
    pub fn world_position(&self, i: usize, j: usize) -> (f32, f32) {
        (
            -self.world_width / 2.0 + i as f32 * self.cell_width(),
            -self.world_depth / 2.0 + j as f32 * self.cell_depth(),
        )
    }

    /// Bilinear terrain height at any world position.
    ///
    /// Positions outside the terrain are clamped onto its edge, so the result
    /// is always finite for finite input and never extrapolated.
    pub fn height(&self, x: f32, z: f32) -> f32 {
        let cell_w = self.cell_width();
        let cell_d = self.cell_depth();

        let local_x = (x + self.world_width / 2.0).clamp(0.0, self.world_width);
        let local_z = (z + self.world_depth / 2.0).clamp(0.0, self.world_depth);

        let grid_x = local_x / cell_w;
        let grid_z = local_z / cell_d;

        let i = (grid_x.floor().max(0.0) as usize).min(self.columns - 2);
        let j = (grid_z.floor().max(0.0) as usize).min(self.rows - 2);

        let u = (grid_x - i as f32).clamp(0.0, 1.0);
        let v = (grid_z - j as f32).clamp(0.0, 1.0);

        let y00 = self.sample(i, j);
        let y10 = self.sample(i + 1, j);
        let y01 = self.sample(i, j + 1);
        let y11 = self.sample(i + 1, j + 1);

        (1.0 - u) * (1.0 - v) * y00 + u * (1.0 - v) * y10 + (1.0 - u) * v * y01 + u * v * y11
    }

    /// Lowest and highest sample.
    pub fn height_range(&self) -> (f32, f32) {
        self.heights
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)))
    }

    /// Builds the renderable surface for this grid.
    pub fn to_mesh(&self) -> TerrainMesh {
        let mut vertices = Vec::with_capacity(self.heights.len());
        let mut uvs = Vec::with_capacity(self.heights.len());

        for j in 0..self.rows {
            for i in 0..self.columns {
                let (x, z) = self.world_position(i, j);
                vertices.push(Vertex3D::new(x, self.sample(i, j), z));
                uvs.push(UV {
                    u: i as f32 / (self.columns - 1) as f32,
                    v: j as f32 / (self.rows - 1) as f32,
                });
            }
        }

        let quads = (self.columns - 1) * (self.rows - 1);
        let mut indices = Vec::with_capacity(quads * 6);
        let stride = self.columns as u32;

        for j in 0..(self.rows - 1) as u32 {
            for i in 0..(self.columns - 1) as u32 {
                let a = j * stride + i;
                let b = a + 1;
                let c = a + stride;
                let d = c + 1;

                // Wound counter-clockwise seen from +Y
                indices.extend_from_slice(&[a, c, b, c, d, b]);
            }
        }

        let mut mesh = Mesh {
            vertices,
            indices,
            normals: vec![],
            uvs,
        };
        mesh.compute_smooth_normals();
        mesh
    }
}

impl HeightSampler for HeightGrid {
    fn height(&self, x: f32, z: f32) -> f32 {
        HeightGrid::height(self, x, z)
    }
}

/// Samples `noise` over the configured grid and builds the terrain surface.
///
/// Noise is read at `(i * noise_scale, j * noise_scale, 0)`, mapped from
/// [-1, 1] to [0, 1] and multiplied by `height_scale`.
pub fn build_heightfield(
    settings: &TerrainSettings,
    noise: &impl NoiseSource,
) -> (HeightGrid, TerrainMesh) {
    let resolution = settings.resolution;
    let noise_scale = settings.noise_scale as f64;

    let mut heights = Vec::with_capacity(resolution * resolution);
    for j in 0..resolution {
        for i in 0..resolution {
            let n = noise.sample(i as f64 * noise_scale, j as f64 * noise_scale, 0.0);
            let normalized = ((n + 1.0) / 2.0).clamp(0.0, 1.0) as f32;
            heights.push(normalized * settings.height_scale);
        }
    }

    let grid = HeightGrid::from_heights(
        resolution,
        resolution,
        settings.width,
        settings.depth,
        heights,
    );
    let mesh = grid.to_mesh();

    let (lo, hi) = grid.height_range();
    info!(
        "Built {}x{} heightfield over {:.1}m x {:.1}m (heights {:.2}..{:.2})",
        resolution, resolution, settings.width, settings.depth, lo, hi
    );
    debug!(
        "Terrain mesh: {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.triangle_count()
    );

    (grid, mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procgen::noise::TerrainNoise;

    fn ramp_grid() -> HeightGrid {
        // 3x3 grid over 20x20 where height = i + 10 * j
        let heights = (0..3)
            .flat_map(|j| (0..3).map(move |i| i as f32 + 10.0 * j as f32))
            .collect();
        HeightGrid::from_heights(3, 3, 20.0, 20.0, heights)
    }

    fn small_settings() -> TerrainSettings {
        TerrainSettings {
            width: 40.0,
            depth: 80.0,
            resolution: 16,
            height_scale: 10.0,
            noise_scale: 0.1,
            seed: 1,
        }
    }

    #[test]
    fn test_world_position_mapping() {
        let grid = ramp_grid();
        assert_eq!(grid.world_position(0, 0), (-10.0, -10.0));
        assert_eq!(grid.world_position(2, 2), (10.0, 10.0));
        assert_eq!(grid.world_position(1, 1), (0.0, 0.0));
    }

    #[test]
    fn test_height_at_vertices() {
        let grid = ramp_grid();
        for j in 0..3 {
            for i in 0..3 {
                let (x, z) = grid.world_position(i, j);
                assert!((grid.height(x, z) - grid.sample(i, j)).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_bilinear_midpoints() {
        let grid = ramp_grid();
        // Centre of the first cell averages 0, 1, 10, 11
        assert!((grid.height(-5.0, -5.0) - 5.5).abs() < 1e-5);
        // Halfway along X on the first row
        assert!((grid.height(-5.0, -10.0) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_height_clamps_outside() {
        let grid = ramp_grid();
        assert_eq!(grid.height(-1000.0, -1000.0), grid.height(-10.0, -10.0));
        assert_eq!(grid.height(1000.0, 1000.0), grid.height(10.0, 10.0));
        assert_eq!(grid.height(1000.0, 0.0), grid.height(10.0, 0.0));
        assert!((grid.height(1000.0, 1000.0) - 22.0).abs() < 1e-5);
    }

    #[test]
    fn test_closure_sampler() {
        let slope = |x: f32, _z: f32| x * 0.5;
        assert_eq!(HeightSampler::height(&slope, 4.0, 0.0), 2.0);
    }

    #[test]
    fn test_build_flat_noise() {
        let zero = |_x: f64, _y: f64, _z: f64| 0.0;
        let (grid, mesh) = build_heightfield(&small_settings(), &zero);

        assert!(grid.heights().iter().all(|&h| (h - 5.0).abs() < 1e-6));
        assert_eq!(mesh.vertices.len(), 16 * 16);
        assert_eq!(mesh.indices.len(), 15 * 15 * 6);
        for n in &mesh.normals {
            assert!((n.y - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_build_uses_noise_lattice_coordinates() {
        let settings = small_settings();
        let along_x = |x: f64, _y: f64, _z: f64| (x / 1.5 - 1.0).clamp(-1.0, 1.0);
        let (grid, _) = build_heightfield(&settings, &along_x);

        // Sample i reads noise at i * 0.1, independent of world extents
        let expected = ((3.0 * 0.1 / 1.5 - 1.0 + 1.0) / 2.0) as f32 * settings.height_scale;
        assert!((grid.sample(3, 7) - expected).abs() < 1e-5);
    }

    #[test]
    fn test_mesh_matches_grid() {
        let settings = small_settings();
        let (grid, mesh) = build_heightfield(&settings, &TerrainNoise::new(9));

        for j in 0..grid.rows() {
            for i in 0..grid.columns() {
                let v = mesh.vertices[j * grid.columns() + i];
                let (x, z) = grid.world_position(i, j);
                assert_eq!(v.x, x);
                assert_eq!(v.z, z);
                assert_eq!(v.y, grid.sample(i, j));
            }
        }
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
        assert!(mesh.normals.iter().all(|n| n.y > 0.0));
    }
}
