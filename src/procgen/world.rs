/// End-to-end world build: heightfield, then road, then scatter
use super::heightfield::{build_heightfield, HeightGrid, TerrainMesh};
use super::noise::{NoiseSource, TerrainNoise};
use super::road::{generate_road, Road, Wiggle};
use super::scatter::{place, CorridorBand, ScatterInstance, WorldBounds};
use crate::config::WorldConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything the renderer and the vehicle simulation consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub grid: HeightGrid,
    pub terrain_mesh: TerrainMesh,
    pub road: Road,
    pub trees: Vec<ScatterInstance>,
}

impl World {
    /// Builds the world with the seeded Perlin source from `config.terrain.seed`.
    pub fn generate(config: &WorldConfig) -> Self {
        Self::generate_with_noise(config, &TerrainNoise::new(config.terrain.seed))
    }

    /// Builds the world from any noise source. Expects a validated config.
    pub fn generate_with_noise(config: &WorldConfig, noise: &impl NoiseSource) -> Self {
        let terrain = &config.terrain;
        let (grid, terrain_mesh) = build_heightfield(terrain, noise);

        let wiggle = Wiggle::from_settings(&config.road);
        let road = generate_road(&config.road, terrain.depth, |z| wiggle.offset(z), &grid);

        let scatter = &config.scatter;
        let band = CorridorBand::from_settings(scatter);
        let mut rng = StdRng::seed_from_u64(scatter.seed);
        let trees = place(
            scatter.count,
            |x, z| band.contains(x, z),
            &grid,
            WorldBounds::new(terrain.width, terrain.depth),
            scatter.margin,
            (scatter.min_scale, scatter.max_scale),
            &scatter.model,
            &mut rng,
        );

        info!(
            "World ready: {} terrain samples, road {:.1}m, {} '{}' instances",
            grid.heights().len(),
            road.curve.length(),
            trees.len(),
            scatter.model
        );

        Self {
            grid,
            terrain_mesh,
            road,
            trees,
        }
    }

    /// Terrain height query shared by every consumer.
    pub fn height(&self, x: f32, z: f32) -> f32 {
        self.grid.height(x, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> WorldConfig {
        let mut config = WorldConfig::default();
        config.terrain.resolution = 32;
        config.road.segments = 20;
        config.road.divisions = 60;
        config.scatter.count = 50;
        config
    }

    #[test]
    fn test_generate_small_world() {
        let config = small_config();
        let world = World::generate(&config);

        assert_eq!(world.grid.heights().len(), 32 * 32);
        assert_eq!(world.terrain_mesh.vertices.len(), 32 * 32);
        assert_eq!(world.road.points.len(), 21);
        assert_eq!(world.trees.len(), 50);
        assert_eq!(world.height(0.0, 0.0), world.grid.height(0.0, 0.0));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let config = small_config();
        let a = World::generate(&config);
        let b = World::generate(&config);

        assert_eq!(a.grid.heights(), b.grid.heights());
        assert_eq!(a.road.points, b.road.points);
        assert_eq!(a.trees, b.trees);
    }

    #[test]
    fn test_road_spans_terrain_depth() {
        let config = small_config();
        let world = World::generate(&config);

        let first = world.road.points.first().unwrap();
        let last = world.road.points.last().unwrap();
        assert_eq!(first.z, -config.terrain.depth / 2.0);
        assert_eq!(last.z, config.terrain.depth / 2.0);
    }
}
