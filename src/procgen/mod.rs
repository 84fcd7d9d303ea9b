/// Procedural world generation
///
/// Terrain heightfield, road path and scatter placement. Every stage is a pure
/// function of its settings, a noise source and a seeded RNG.

pub mod heightfield;
pub mod noise;
pub mod road;
pub mod scatter;
pub mod world;

// Re-export main types for convenience
pub use self::heightfield::{build_heightfield, HeightGrid, HeightSampler, TerrainMesh};
pub use self::noise::{NoiseSource, TerrainNoise};
pub use self::road::{generate_road, Road, RoadCurve, RoadMesh, TubeLayout, Wiggle};
pub use self::scatter::{place, CorridorBand, ScatterInstance, WorldBounds};
pub use self::world::World;
