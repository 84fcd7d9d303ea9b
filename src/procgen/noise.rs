/// Coherent noise sources for terrain generation
use noise::{NoiseFn, Perlin};

/// Deterministic 3D coherent noise with output in [-1, 1].
///
/// The heightfield builder only reads a 2D slice (z fixed at 0), but sources
/// are 3D so the same sampler can drive other generators.
pub trait NoiseSource {
    fn sample(&self, x: f64, y: f64, z: f64) -> f64;
}

impl<F> NoiseSource for F
where
    F: Fn(f64, f64, f64) -> f64,
{
    fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        self(x, y, z)
    }
}

/// Seeded Perlin noise used by the demo world.
pub struct TerrainNoise {
    perlin: Perlin,
}

impl TerrainNoise {
    /// Create a new terrain noise generator with the given seed
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }
}

impl NoiseSource for TerrainNoise {
    fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        self.perlin.get([x, y, z]).clamp(-1.0, 1.0)
    }
}

/// Adapts any `noise` crate generator into a `NoiseSource`.
pub struct NoiseFnSource<N>(pub N);

impl<N> NoiseSource for NoiseFnSource<N>
where
    N: NoiseFn<f64, 3>,
{
    fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        self.0.get([x, y, z]).clamp(-1.0, 1.0)
    }
}
