use serde::{Deserialize, Serialize};

/// Indexed triangle mesh handed to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
    pub normals: Vec<Normal3D>,
    pub uvs: Vec<UV>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normal3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UV {
    pub u: f32,
    pub v: f32,
}

impl Vertex3D {
    pub const UP: Vertex3D = Vertex3D { x: 0.0, y: 1.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn add(&self, other: &Vertex3D) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }

    pub fn sub(&self, other: &Vertex3D) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    pub fn scale(&self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    pub fn dot(&self, other: &Vertex3D) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Vertex3D) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(&self, other: &Vertex3D) -> f32 {
        self.sub(other).length()
    }

    pub fn lerp(&self, other: &Vertex3D, t: f32) -> Self {
        self.add(&other.sub(self).scale(t))
    }

    /// Unit-length copy, or `None` for a degenerate vector.
    pub fn try_unit(&self) -> Option<Vertex3D> {
        let length = self.length();
        if length > 0.0001 {
            Some(self.scale(1.0 / length))
        } else {
            None
        }
    }

    /// Normalizes into a `Normal3D`, falling back to +Y for degenerate input.
    pub fn normalize(&self) -> Normal3D {
        match self.try_unit() {
            Some(unit) => Normal3D {
                x: unit.x,
                y: unit.y,
                z: unit.z,
            },
            None => Normal3D {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            },
        }
    }
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Recomputes every vertex normal as the average of its adjacent face normals.
    ///
    /// Must be called again whenever vertex positions change.
    pub fn compute_smooth_normals(&mut self) {
        let mut normal_accumulators = vec![Vertex3D::new(0.0, 0.0, 0.0); self.vertices.len()];

        for triangle in self.indices.chunks_exact(3) {
            let i0 = triangle[0] as usize;
            let i1 = triangle[1] as usize;
            let i2 = triangle[2] as usize;

            let v0 = &self.vertices[i0];
            let v1 = &self.vertices[i1];
            let v2 = &self.vertices[i2];

            let edge1 = v1.sub(v0);
            let edge2 = v2.sub(v0);
            let face_normal = match edge1.cross(&edge2).try_unit() {
                Some(n) => n,
                None => continue,
            };

            normal_accumulators[i0] = normal_accumulators[i0].add(&face_normal);
            normal_accumulators[i1] = normal_accumulators[i1].add(&face_normal);
            normal_accumulators[i2] = normal_accumulators[i2].add(&face_normal);
        }

        self.normals = normal_accumulators.iter().map(Vertex3D::normalize).collect();
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vertex3D, Vertex3D)> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;

        for v in &self.vertices[1..] {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            min.z = min.z.min(v.z);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
            max.z = max.z.max(v.z);
        }

        Some((min, max))
    }

    /// Renders the mesh as Wavefront OBJ text.
    pub fn export_obj(&self, name: &str) -> String {
        let mut obj = String::new();

        obj.push_str("# terrain-drive mesh\n");
        obj.push_str(&format!("o {}\n\n", name));

        for vertex in &self.vertices {
            obj.push_str(&format!("v {} {} {}\n", vertex.x, vertex.y, vertex.z));
        }

        obj.push('\n');

        for uv in &self.uvs {
            obj.push_str(&format!("vt {} {}\n", uv.u, uv.v));
        }

        obj.push('\n');

        for normal in &self.normals {
            obj.push_str(&format!("vn {} {} {}\n", normal.x, normal.y, normal.z));
        }

        obj.push('\n');

        for triangle in self.indices.chunks_exact(3) {
            let i0 = triangle[0] + 1;
            let i1 = triangle[1] + 1;
            let i2 = triangle[2] + 1;

            obj.push_str(&format!(
                "f {}/{}/{} {}/{}/{} {}/{}/{}\n",
                i0, i0, i0, i1, i1, i1, i2, i2, i2
            ));
        }

        obj
    }
}
