/// Road centerline planning, terrain conforming and tube sweeping
use super::heightfield::HeightSampler;
use crate::config::RoadSettings;
use crate::mesh::{Mesh, Normal3D, Vertex3D, UV};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use tracing::{debug, info};

/// Minimum samples in the arc-length table.
const MIN_ARC_SAMPLES: usize = 200;
/// Arc-length samples per spline segment.
const ARC_SAMPLES_PER_SEGMENT: usize = 16;

/// Sinusoidal sideways offset of the planned road, as a function of z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wiggle {
    pub amplitude: f32,
    pub frequency: f32,
}

impl Wiggle {
    pub fn from_settings(settings: &RoadSettings) -> Self {
        Self {
            amplitude: settings.wiggle_amplitude,
            frequency: settings.wiggle_frequency,
        }
    }

    pub fn offset(&self, z: f32) -> f32 {
        self.amplitude * (z * self.frequency).sin()
    }
}

/// Pass 1: `segments + 1` points evenly spaced along Z, centred on the origin,
/// shifted sideways by `wiggle(z)`, all at height 0.
pub fn plan_path(segments: usize, planned_length: f32, wiggle: impl Fn(f32) -> f32) -> Vec<Vertex3D> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|k| {
            let z = -planned_length / 2.0 + planned_length * k as f32 / segments as f32;
            Vertex3D::new(wiggle(z), 0.0, z)
        })
        .collect()
}

/// Pass 2: a copy of `planned` with every height replaced by the terrain
/// height plus `clearance`.
pub fn conform_path(planned: &[Vertex3D], heights: &impl HeightSampler, clearance: f32) -> Vec<Vertex3D> {
    planned
        .iter()
        .map(|p| Vertex3D::new(p.x, heights.height(p.x, p.z) + clearance, p.z))
        .collect()
}

fn catmull_rom_point(p0: &Vertex3D, p1: &Vertex3D, p2: &Vertex3D, p3: &Vertex3D, t: f32) -> Vertex3D {
    let t2 = t * t;
    let t3 = t2 * t;

    let axis = |a: f32, b: f32, c: f32, d: f32| {
        0.5 * ((2.0 * b)
            + (-a + c) * t
            + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (-a + 3.0 * b - 3.0 * c + d) * t3)
    };

    Vertex3D::new(
        axis(p0.x, p1.x, p2.x, p3.x),
        axis(p0.y, p1.y, p2.y, p3.y),
        axis(p0.z, p1.z, p2.z, p3.z),
    )
}

fn catmull_rom_derivative(p0: &Vertex3D, p1: &Vertex3D, p2: &Vertex3D, p3: &Vertex3D, t: f32) -> Vertex3D {
    let t2 = t * t;

    let axis = |a: f32, b: f32, c: f32, d: f32| {
        0.5 * ((-a + c)
            + 2.0 * (2.0 * a - 5.0 * b + 4.0 * c - d) * t
            + 3.0 * (-a + 3.0 * b - 3.0 * c + d) * t2)
    };

    Vertex3D::new(
        axis(p0.x, p1.x, p2.x, p3.x),
        axis(p0.y, p1.y, p2.y, p3.y),
        axis(p0.z, p1.z, p2.z, p3.z),
    )
}

/// Uniform Catmull-Rom spline through every control point.
///
/// The end points are repeated as phantom neighbours so the curve starts and
/// ends exactly on the first and last control point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadCurve {
    points: Vec<Vertex3D>,
    /// Cumulative length at `t = k / (arc_lengths.len() - 1)`
    arc_lengths: Vec<f32>,
}

impl RoadCurve {
    /// Builds the curve; needs at least two points to be non-degenerate.
    pub fn new(points: Vec<Vertex3D>) -> Self {
        let mut curve = Self {
            points,
            arc_lengths: vec![],
        };
        curve.arc_lengths = curve.compute_arc_lengths();
        curve
    }

    pub fn points(&self) -> &[Vertex3D] {
        &self.points
    }

    fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Curve parameter at which control point `index` is reached.
    pub fn control_parameter(&self, index: usize) -> f32 {
        match self.segment_count() {
            0 => 0.0,
            segments => index as f32 / segments as f32,
        }
    }

    /// Control points around the segment containing `t`, plus the local weight.
    fn segment(&self, t: f32) -> Option<([&Vertex3D; 4], f32)> {
        let segments = self.segment_count();
        if segments == 0 {
            return None;
        }

        let p = t.clamp(0.0, 1.0) * segments as f32;
        let k = (p.floor() as usize).min(segments - 1);
        let weight = p - k as f32;

        let last = self.points.len() - 1;
        let p0 = &self.points[k.saturating_sub(1)];
        let p1 = &self.points[k];
        let p2 = &self.points[k + 1];
        let p3 = &self.points[(k + 2).min(last)];

        Some(([p0, p1, p2, p3], weight))
    }

    /// Position at curve parameter `t` in [0, 1].
    pub fn point(&self, t: f32) -> Vertex3D {
        match self.segment(t) {
            Some(([p0, p1, p2, p3], w)) => catmull_rom_point(p0, p1, p2, p3, w),
            None => self.points.first().copied().unwrap_or(Vertex3D::new(0.0, 0.0, 0.0)),
        }
    }

    /// Unit tangent at curve parameter `t` in [0, 1].
    pub fn tangent(&self, t: f32) -> Vertex3D {
        let forward = Vertex3D::new(0.0, 0.0, 1.0);
        match self.segment(t) {
            Some(([p0, p1, p2, p3], w)) => catmull_rom_derivative(p0, p1, p2, p3, w)
                .try_unit()
                .or_else(|| p2.sub(p1).try_unit())
                .unwrap_or(forward),
            None => forward,
        }
    }

    fn compute_arc_lengths(&self) -> Vec<f32> {
        let samples = (self.segment_count() * ARC_SAMPLES_PER_SEGMENT).max(MIN_ARC_SAMPLES);
        let mut lengths = Vec::with_capacity(samples + 1);
        let mut total = 0.0;
        let mut previous = self.point(0.0);
        lengths.push(0.0);

        for k in 1..=samples {
            let current = self.point(k as f32 / samples as f32);
            total += current.distance(&previous);
            lengths.push(total);
            previous = current;
        }

        lengths
    }

    /// Total arc length.
    pub fn length(&self) -> f32 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Arc length from the start to curve parameter `t`.
    pub fn arc_length_at(&self, t: f32) -> f32 {
        let samples = self.arc_lengths.len() - 1;
        let p = t.clamp(0.0, 1.0) * samples as f32;
        let k = (p.floor() as usize).min(samples - 1);
        let frac = p - k as f32;
        self.arc_lengths[k] + (self.arc_lengths[k + 1] - self.arc_lengths[k]) * frac
    }

    /// Curve parameter reached after the fraction `u` of the total length.
    pub fn parameter_at(&self, u: f32) -> f32 {
        let total = self.length();
        if total <= 0.0 {
            return u.clamp(0.0, 1.0);
        }

        let target = u.clamp(0.0, 1.0) * total;
        let samples = self.arc_lengths.len() - 1;

        // First sample whose cumulative length reaches the target
        let upper = self.arc_lengths.partition_point(|&len| len < target).clamp(1, samples);
        let lower = upper - 1;

        let span = self.arc_lengths[upper] - self.arc_lengths[lower];
        let frac = if span > 0.0 {
            (target - self.arc_lengths[lower]) / span
        } else {
            0.0
        };

        (lower as f32 + frac) / samples as f32
    }

    /// Position after the fraction `u` of the total arc length.
    pub fn point_at(&self, u: f32) -> Vertex3D {
        self.point(self.parameter_at(u))
    }

    /// Unit tangent after the fraction `u` of the total arc length.
    pub fn tangent_at(&self, u: f32) -> Vertex3D {
        self.tangent(self.parameter_at(u))
    }
}

/// Vertex layout of a swept tube; independent of the curve it follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TubeLayout {
    pub divisions: usize,
    pub radial_segments: usize,
}

impl TubeLayout {
    pub fn vertex_count(&self) -> usize {
        (self.divisions + 1) * (self.radial_segments + 1)
    }

    /// Angle of ring vertex `j`; the last vertex duplicates the first at 2π.
    fn angle(&self, j: usize) -> f32 {
        j as f32 / self.radial_segments as f32 * TAU
    }

    pub fn indices(&self) -> Vec<u32> {
        let ring = (self.radial_segments + 1) as u32;
        let mut indices = Vec::with_capacity(self.divisions * self.radial_segments * 6);

        for i in 1..=self.divisions as u32 {
            for j in 1..=self.radial_segments as u32 {
                let a = ring * (i - 1) + (j - 1);
                let b = ring * i + (j - 1);
                let c = ring * i + j;
                let d = ring * (i - 1) + j;

                // Outward facing
                indices.extend_from_slice(&[a, d, b, b, d, c]);
            }
        }

        indices
    }

    /// U is the lateral offset across the tube normalized to [0, 1]; V is the
    /// arc-length fraction of the ring times `texture_repeat`.
    ///
    /// Rings are placed at equal arc-length steps, so ring `i` sits at fraction
    /// `i / divisions` of the total length whatever the curve looks like.
    pub fn uvs(&self, texture_repeat: f32) -> Vec<UV> {
        let mut uvs = Vec::with_capacity(self.vertex_count());

        for i in 0..=self.divisions {
            let v = i as f32 / self.divisions as f32 * texture_repeat;
            for j in 0..=self.radial_segments {
                let lateral = self.angle(j).sin();
                let u = ((lateral + 1.0) / 2.0).clamp(0.0, 1.0);
                uvs.push(UV { u, v });
            }
        }

        uvs
    }
}

/// Open-ended tube around a `RoadCurve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadMesh {
    pub layout: TubeLayout,
    pub radius: f32,
    pub mesh: Mesh,
}

/// Rotation-minimizing frames seeded from world up.
fn transport_frames(tangents: &[Vertex3D]) -> Vec<(Vertex3D, Vertex3D)> {
    let mut frames = Vec::with_capacity(tangents.len());
    let mut previous_normal: Option<Vertex3D> = None;

    for tangent in tangents {
        let seed = previous_normal.unwrap_or(Vertex3D::UP);
        let normal = seed
            .sub(&tangent.scale(seed.dot(tangent)))
            .try_unit()
            .or_else(|| fallback_normal(tangent))
            .unwrap_or(Vertex3D::UP);
        let binormal = tangent.cross(&normal);

        frames.push((normal, binormal));
        previous_normal = Some(normal);
    }

    frames
}

/// Perpendicular to `tangent` built from its smallest axis.
fn fallback_normal(tangent: &Vertex3D) -> Option<Vertex3D> {
    let (ax, ay, az) = (tangent.x.abs(), tangent.y.abs(), tangent.z.abs());
    let axis = if ax <= ay && ax <= az {
        Vertex3D::new(1.0, 0.0, 0.0)
    } else if ay <= az {
        Vertex3D::new(0.0, 1.0, 0.0)
    } else {
        Vertex3D::new(0.0, 0.0, 1.0)
    };
    tangent.cross(&axis).cross(tangent).try_unit()
}

impl RoadMesh {
    /// Sweeps a circle of `radius` along `curve` with freshly computed UVs.
    pub fn sweep(curve: &RoadCurve, radius: f32, layout: TubeLayout, texture_repeat: f32) -> Self {
        let mesh = Self::sweep_positions(curve, radius, layout, layout.indices(), layout.uvs(texture_repeat));
        Self { layout, radius, mesh }
    }

    /// New mesh along `curve` with this mesh's layout, indices and UVs.
    pub fn rebuild(&self, curve: &RoadCurve) -> Self {
        let mesh = Self::sweep_positions(
            curve,
            self.radius,
            self.layout,
            self.mesh.indices.clone(),
            self.mesh.uvs.clone(),
        );
        Self {
            layout: self.layout,
            radius: self.radius,
            mesh,
        }
    }

    fn sweep_positions(
        curve: &RoadCurve,
        radius: f32,
        layout: TubeLayout,
        indices: Vec<u32>,
        uvs: Vec<UV>,
    ) -> Mesh {
        let centers: Vec<Vertex3D> = (0..=layout.divisions)
            .map(|i| curve.point_at(i as f32 / layout.divisions as f32))
            .collect();
        let tangents: Vec<Vertex3D> = (0..=layout.divisions)
            .map(|i| curve.tangent_at(i as f32 / layout.divisions as f32))
            .collect();
        let frames = transport_frames(&tangents);

        let mut vertices = Vec::with_capacity(layout.vertex_count());
        let mut normals = Vec::with_capacity(layout.vertex_count());

        for (center, (normal, binormal)) in centers.iter().zip(&frames) {
            for j in 0..=layout.radial_segments {
                let angle = layout.angle(j);
                let radial = normal.scale(angle.cos()).add(&binormal.scale(angle.sin()));

                vertices.push(center.add(&radial.scale(radius)));
                normals.push(Normal3D {
                    x: radial.x,
                    y: radial.y,
                    z: radial.z,
                });
            }
        }

        Mesh {
            vertices,
            indices,
            normals,
            uvs,
        }
    }
}

/// Generated road: both passes of the centerline, the conformed curve and its mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Road {
    pub planned: Vec<Vertex3D>,
    pub points: Vec<Vertex3D>,
    pub curve: RoadCurve,
    pub mesh: RoadMesh,
}

/// Plans the road across `planned_length`, conforms it to `heights` and
/// sweeps the final tube.
pub fn generate_road(
    settings: &RoadSettings,
    planned_length: f32,
    wiggle: impl Fn(f32) -> f32,
    heights: &impl HeightSampler,
) -> Road {
    let layout = TubeLayout {
        divisions: settings.divisions,
        radial_segments: settings.radial_segments,
    };
    let radius = settings.width / 2.0;

    let planned = plan_path(settings.segments, planned_length, wiggle);
    let planned_curve = RoadCurve::new(planned.clone());
    let planned_mesh = RoadMesh::sweep(&planned_curve, radius, layout, settings.texture_repeat);
    debug!(
        "Planned road: {} points, {:.1}m flat length",
        planned.len(),
        planned_curve.length()
    );

    let points = conform_path(&planned, heights, settings.clearance);
    let curve = RoadCurve::new(points.clone());
    let mesh = planned_mesh.rebuild(&curve);

    info!(
        "Built road: {} control points, {:.1}m long, {} vertices",
        points.len(),
        curve.length(),
        mesh.mesh.vertices.len()
    );

    Road {
        planned,
        points,
        curve,
        mesh,
    }
}
