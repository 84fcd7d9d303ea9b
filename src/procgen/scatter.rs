/// Rejection-sampled placement of decorative objects
use super::heightfield::HeightSampler;
use crate::config::ScatterSettings;
use crate::mesh::Vertex3D;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use tracing::debug;

/// One placed copy of a decorative model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterInstance {
    pub position: Vertex3D,
    pub scale: f32,
    pub yaw_rad: f32,
    /// Opaque handle of the model to clone
    pub model: String,
}

/// Axis-aligned rectangle on the XZ plane, centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub half_width: f32,
    pub half_depth: f32,
}

impl WorldBounds {
    pub fn new(width: f32, depth: f32) -> Self {
        Self {
            half_width: width / 2.0,
            half_depth: depth / 2.0,
        }
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            half_width: self.half_width * factor,
            half_depth: self.half_depth * factor,
        }
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        x.abs() <= self.half_width && z.abs() <= self.half_depth
    }
}

/// Rectangular keep-out band around the planned road corridor.
///
/// This only approximates the road: it ignores the curve, so objects can still
/// land close to the outside of a bend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorridorBand {
    pub half_width: f32,
    pub half_length: f32,
}

impl CorridorBand {
    pub fn from_settings(settings: &ScatterSettings) -> Self {
        Self {
            half_width: settings.exclusion_half_width,
            half_length: settings.exclusion_half_length,
        }
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        x.abs() < self.half_width && z.abs() < self.half_length
    }
}

/// Places `count` instances of `model` inside `bounds` scaled by `margin`.
///
/// Samples are redrawn until `excluded(x, z)` is false. There is no retry cap:
/// if `excluded` covers the whole sampling region this never returns, so the
/// caller must rule that out.
#[allow(clippy::too_many_arguments)]
pub fn place<R: Rng>(
    count: usize,
    excluded: impl Fn(f32, f32) -> bool,
    heights: &impl HeightSampler,
    bounds: WorldBounds,
    margin: f32,
    scale_range: (f32, f32),
    model: &str,
    rng: &mut R,
) -> Vec<ScatterInstance> {
    let area = bounds.scaled(margin);
    let (min_scale, max_scale) = scale_range;
    let mut instances = Vec::with_capacity(count);
    let mut rejected = 0usize;

    for _ in 0..count {
        let (x, z) = loop {
            let x = rng.random_range(-area.half_width..=area.half_width);
            let z = rng.random_range(-area.half_depth..=area.half_depth);
            if !excluded(x, z) {
                break (x, z);
            }
            rejected += 1;
        };

        let scale = if max_scale > min_scale {
            rng.random_range(min_scale..max_scale)
        } else {
            min_scale
        };

        instances.push(ScatterInstance {
            position: Vertex3D::new(x, heights.height(x, z), z),
            scale,
            yaw_rad: rng.random_range(0.0..TAU),
            model: model.to_string(),
        });
    }

    debug!(
        "Placed {} '{}' instances ({} samples rejected)",
        instances.len(),
        model,
        rejected
    );

    instances
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn flat(_x: f32, _z: f32) -> f32 {
        2.5
    }

    #[test]
    fn test_corridor_band() {
        let band = CorridorBand {
            half_width: 18.0,
            half_length: 400.0,
        };
        assert!(band.contains(0.0, 0.0));
        assert!(band.contains(-17.9, 399.0));
        assert!(!band.contains(18.0, 0.0));
        assert!(!band.contains(0.0, -400.0));
    }

    #[test]
    fn test_place_respects_exclusion_and_margin() {
        let band = CorridorBand {
            half_width: 18.0,
            half_length: 400.0,
        };
        let bounds = WorldBounds::new(400.0, 800.0);
        let mut rng = StdRng::seed_from_u64(99);

        let trees = place(
            500,
            |x, z| band.contains(x, z),
            &flat,
            bounds,
            0.9,
            (2.0, 4.0),
            "tree",
            &mut rng,
        );

        assert_eq!(trees.len(), 500);
        let area = bounds.scaled(0.9);
        for tree in &trees {
            let p = tree.position;
            assert!(!band.contains(p.x, p.z), "tree inside corridor at {:?}", p);
            assert!(area.contains(p.x, p.z), "tree outside margin at {:?}", p);
            assert_eq!(p.y, 2.5);
            assert!((2.0..4.0).contains(&tree.scale));
            assert!((0.0..TAU).contains(&tree.yaw_rad));
            assert_eq!(tree.model, "tree");
        }
    }

    #[test]
    fn test_place_deterministic_for_seed() {
        let bounds = WorldBounds::new(100.0, 100.0);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            place(20, |x, _z| x.abs() < 5.0, &flat, bounds, 0.9, (1.0, 1.5), "rock", &mut rng)
        };

        assert_eq!(run(3), run(3));
        assert_ne!(run(3), run(4));
    }

    #[test]
    fn test_fixed_scale_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let trees = place(
            10,
            |_x, _z| false,
            &flat,
            WorldBounds::new(10.0, 10.0),
            1.0,
            (3.0, 3.0),
            "tree",
            &mut rng,
        );
        assert!(trees.iter().all(|t| t.scale == 3.0));
    }

    #[test]
    fn test_height_comes_from_sampler() {
        let slope = |x: f32, z: f32| x + 2.0 * z;
        let mut rng = StdRng::seed_from_u64(5);
        let trees = place(
            25,
            |_x, _z| false,
            &slope,
            WorldBounds::new(50.0, 50.0),
            0.9,
            (1.0, 2.0),
            "tree",
            &mut rng,
        );

        for t in &trees {
            assert!((t.position.y - (t.position.x + 2.0 * t.position.z)).abs() < 1e-4);
        }
    }
}
